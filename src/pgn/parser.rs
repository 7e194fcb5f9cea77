//! Tag-section and movetext parsing with error recovery
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use chess::{make_move, movegen, parse_san, GameResult, Move, Position};

use crate::error::{Error, ParseError, PgnError, SanError};
use super::tokens::{TokenStream, TokenType};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// One step of a parsed game, handed to the move visitor in on-board play order
#[derive(Debug, Copy, Clone)]
pub struct ParseStep<'a> {
    /// The move that was played
    pub mv: Move,
    /// The SAN text the move was parsed from
    pub san: &'a str,
    /// The comment attached to this move, without its braces, or the empty string
    pub comment: &'a str,
    /// The last annotation glyph attached to this move, or the empty string
    pub nag: &'a str,
    /// The move number most recently seen in the movetext
    pub move_no: u32,
    /// `true` when Black made this move
    pub black: bool,
    /// The position the move was made from
    pub prev: Position,
    /// The position after the move
    pub next: Position,
    /// Bytes of the movetext consumed through this step
    pub bytes_read: usize,
}

fn err<'a>(kind: PgnError, pos: usize, input: &'a str) -> ParseError<'a> {
    ParseError::new(Error::Pgn(kind), pos, input)
}

/// Parses the tag-pair section, invoking `visitor` with each name and unquoted value.
///
/// Returns the number of bytes consumed, which is the position just after the final tag's
/// closing bracket; surrounding whitespace stays unconsumed.
pub fn parse_tags<'a, T>(input: &'a str, mut visitor: T) -> Result<usize, ParseError<'a>>
where
    T: FnMut(&'a str, &'a str),
{
    let mut stream = TokenStream::new(input);

    loop {
        let mark = stream.pos;
        stream.eat(b" \t\r\n");

        if !stream.accept(b'[') {
            return Ok(mark);
        }
        let tag_start = stream.pos - 1;

        let name = stream.next_token();
        if name.ttype != TokenType::Symbol {
            return Err(err(PgnError::MalformedTag, tag_start, input));
        }

        stream.eat(b" \t");

        let value = stream.next_token();
        if value.ttype != TokenType::String {
            return Err(err(PgnError::MalformedTag, tag_start, input));
        }
        if value.contents.len() < 2 || !value.contents.ends_with('"') {
            return Err(err(PgnError::UnterminatedQuote, tag_start, input));
        }

        stream.eat(b" \t");
        if !stream.accept(b']') {
            return Err(err(PgnError::UnterminatedTag, tag_start, input));
        }

        visitor(name.contents, &value.contents[1..value.contents.len() - 1]);
    }
}

// scan byte-wise over a nested variation, which the parser skips rather than replays
fn skip_variation<'a>(stream: &mut TokenStream<'a>, start: usize) -> Result<(), (PgnError, usize)> {
    let bytes = stream.input().as_bytes();
    let mut depth = 1usize;

    while stream.pos < bytes.len() {
        match bytes[stream.pos] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    stream.pos += 1;
                    return Ok(());
                }
            }
            _ => {}
        }
        stream.pos += 1;
    }

    Err((PgnError::UnterminatedVariation, start))
}

/// Parses movetext from `start`, calling `visitor` once per move with the reconstructed
/// positions, until a result token or the end of the buffer.
///
/// `black` gives the colour of `start`'s side to move. Returns the recorded result and the
/// number of bytes consumed.
pub fn parse_movetext<'a, M>(
    input: &'a str,
    start: Position,
    black: bool,
    mut visitor: M,
) -> Result<(GameResult, usize), ParseError<'a>>
where
    M: FnMut(&ParseStep<'a>),
{
    let mut stream = TokenStream::new(input);
    let mut pos_cur = start;
    let mut black = black;
    let mut move_no = 1u32;
    let mut result = GameResult::Unknown;

    loop {
        stream.eat(b" \t\r\n");
        let tstart = stream.pos;
        let token = stream.next_token();

        match token.ttype {
            TokenType::None => break,

            TokenType::Asterisk => {
                result = GameResult::Incomplete;
                break;
            }

            TokenType::Integer => {
                if stream.accept(b'/') {
                    if token.contents == "1" && input[stream.pos..].starts_with("2-1/2") {
                        stream.pos += 5;
                        result = GameResult::Draw;
                        break;
                    }
                    return Err(err(PgnError::MalformedResultToken, tstart, input));
                } else if stream.accept(b'-') {
                    let rest = &input[stream.pos..];
                    if token.contents == "1" && rest.starts_with('0') {
                        stream.pos += 1;
                        result = GameResult::White;
                        break;
                    }
                    if token.contents == "0" && rest.starts_with('1') {
                        stream.pos += 1;
                        result = GameResult::Black;
                        break;
                    }
                    return Err(err(PgnError::MalformedResultToken, tstart, input));
                }

                // a move number, possibly with `...` continuation dots
                move_no = token
                    .contents
                    .parse()
                    .map_err(|_| err(PgnError::InvalidMoveNumber, tstart, input))?;
                let dots = stream.next_token();
                if dots.ttype != TokenType::Period {
                    return Err(err(PgnError::InvalidMoveNumber, tstart, input));
                }
            }

            TokenType::Misc => {
                // `;` and `%` comment out the rest of the line
                stream.skip_line();
            }

            TokenType::Bracket => match token.contents {
                "(" => {
                    skip_variation(&mut stream, tstart)
                        .map_err(|(kind, pos)| err(kind, pos, input))?;
                }
                ")" => return Err(err(PgnError::NotInVariation, tstart, input)),
                _ => return Err(err(PgnError::ReservedToken, tstart, input)),
            },

            TokenType::Symbol => {
                let san = token.contents;
                let mv = parse_san(san, &pos_cur, black)
                    .map_err(|e| ParseError::new(Error::San(e), tstart, input))?;
                if movegen(&pos_cur).index_of(&mv).is_none() {
                    return Err(ParseError::new(
                        Error::San(SanError::MissingPiece),
                        tstart,
                        input,
                    ));
                }

                let prev = pos_cur;
                pos_cur = make_move(pos_cur, mv);
                let mover_black = black;
                black = !black;

                // consume trailing annotation glyphs and an optional comment
                let mut nag = "";
                let mut comment = "";
                loop {
                    let mark = stream.pos;
                    let t = stream.next_token();
                    match t.ttype {
                        TokenType::Whitespace | TokenType::Newline => continue,
                        TokenType::Nag => nag = t.contents,
                        TokenType::Comment => {
                            if t.contents.len() < 2 || !t.contents.ends_with('}') {
                                return Err(err(PgnError::UnterminatedComment, mark, input));
                            }
                            comment = &t.contents[1..t.contents.len() - 1];
                            break;
                        }
                        _ => {
                            stream.pos = mark;
                            break;
                        }
                    }
                }

                let step = ParseStep {
                    mv,
                    san,
                    comment,
                    nag,
                    move_no,
                    black: mover_black,
                    prev,
                    next: pos_cur,
                    bytes_read: stream.pos,
                };
                visitor(&step);
            }

            TokenType::Comment => {
                // a comment between moves; check termination and move on
                if token.contents.len() < 2 || !token.contents.ends_with('}') {
                    return Err(err(PgnError::UnterminatedComment, tstart, input));
                }
            }

            TokenType::String | TokenType::Nag | TokenType::Period => {
                // stray but harmless; tolerated the way stray NAGs are
            }

            TokenType::Whitespace | TokenType::Newline => {}
        }
    }

    Ok((result, stream.pos))
}

/// Parses one game: the tag section, then movetext.
///
/// A `FEN` tag supplies the starting position; a `Variant` tag naming anything other than
/// standard chess is rejected.
pub fn parse_game<'a, T, M>(
    input: &'a str,
    mut tag_visitor: T,
    move_visitor: M,
) -> Result<(GameResult, usize), ParseError<'a>>
where
    T: FnMut(&'a str, &'a str),
    M: FnMut(&ParseStep<'a>),
{
    let mut fen: Option<&'a str> = None;
    let mut variant: Option<&'a str> = None;

    let consumed = parse_tags(input, |name, value| {
        match name {
            "FEN" => fen = Some(value),
            "Variant" => variant = Some(value),
            _ => {}
        }
        tag_visitor(name, value);
    })?;

    if let Some(variant) = variant {
        match variant {
            "Standard" | "Normal" | "Chess" => {}
            _ => return Err(err(PgnError::UnsupportedVariant, 0, input)),
        }
    }

    let (start, black) = match fen {
        Some(fen) => Position::from_fen(fen)
            .map_err(|e| ParseError::new(Error::Fen(e), consumed, input))?,
        None => (Position::STARTPOS, false),
    };

    let (result, read) = parse_movetext(&input[consumed..], start, black, move_visitor)
        .map_err(|e| e.rebase(consumed, input))?;

    Ok((result, consumed + read))
}

// find the end of the next result token, for error recovery
fn scan_result_token(input: &str, from: usize) -> Option<usize> {
    let s = &input[from..];
    let mut best: Option<(usize, usize)> = None;

    for pat in &["1/2-1/2", "1-0", "0-1", "*"] {
        if let Some(i) = s.find(pat) {
            if best.map_or(true, |(b, _)| i < b) {
                best = Some((i, pat.len()));
            }
        }
    }

    best.map(|(i, len)| from + i + len)
}

/// Parses a whole PGN corpus, game by game, until the end of the buffer.
///
/// `game_visitor` receives each completed game's result. On a malformed game `err_visitor`
/// receives the positioned error; with `skip_on_error` the parser then scans forward to the
/// next result token and resumes, otherwise it stops. Returns the number of games parsed
/// successfully.
pub fn parse_games<'a, T, M, G, E>(
    input: &'a str,
    mut tag_visitor: T,
    mut move_visitor: M,
    mut game_visitor: G,
    mut err_visitor: E,
    skip_on_error: bool,
) -> usize
where
    T: FnMut(&'a str, &'a str),
    M: FnMut(&ParseStep<'a>),
    G: FnMut(GameResult),
    E: FnMut(&ParseError<'a>),
{
    let mut pos = 0;
    let mut games = 0;

    while pos < input.len() {
        if input[pos..].trim().is_empty() {
            break;
        }

        match parse_game(&input[pos..], &mut tag_visitor, &mut move_visitor) {
            Ok((result, read)) => {
                if read == 0 {
                    break;
                }
                pos += read;
                games += 1;
                game_visitor(result);
            }
            Err(e) => {
                let e = e.rebase(pos, input);
                err_visitor(&e);

                if !skip_on_error {
                    break;
                }
                match scan_result_token(input, e.pos.min(input.len())) {
                    Some(next) => pos = next,
                    None => break,
                }
            }
        }
    }

    games
}
