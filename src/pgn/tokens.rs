//! The character-class table driven PGN lexer
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use lazy_static::lazy_static;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The lexical class of a PGN token
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenType {
    /// End of input, or a byte outside every class
    None,
    /// A run of `\r` and `\n`
    Newline,
    /// A run of spaces and tabs
    Whitespace,
    /// A run of decimal digits
    Integer,
    /// A `"`-delimited string
    String,
    /// A `{`-delimited comment
    Comment,
    /// A letter or digit followed by letters, digits and `_+#=:-`
    Symbol,
    /// A run of periods
    Period,
    /// The game-termination asterisk
    Asterisk,
    /// One of `[ ] ( ) < >`
    Bracket,
    /// A numeric annotation glyph: `$` with digits, or a run over `!?`
    Nag,
    /// A `;` or `%` line-comment introducer
    Misc,
}

fn set(table: &mut [TokenType; 256], bytes: &[u8], class: TokenType) {
    for &b in bytes {
        table[b as usize] = class;
    }
}

lazy_static! {
    static ref CLASS: [TokenType; 256] = {
        let mut table = [TokenType::None; 256];

        set(&mut table, b" \t", TokenType::Whitespace);
        set(&mut table, b"\r\n", TokenType::Newline);

        set(&mut table, b"abcdefghijklmnopqrstuvwxyz", TokenType::Symbol);
        set(&mut table, b"ABCDEFGHIJKLMNOPQRSTUVWXYZ", TokenType::Symbol);
        set(&mut table, b"_+#=:-", TokenType::Symbol);
        set(&mut table, b"0123456789", TokenType::Integer);

        set(&mut table, b"\"", TokenType::String);
        set(&mut table, b"{}", TokenType::Comment);

        set(&mut table, b".", TokenType::Period);
        set(&mut table, b"*", TokenType::Asterisk);

        set(&mut table, b"[]()<>", TokenType::Bracket);

        set(&mut table, b"$?!", TokenType::Nag);

        set(&mut table, b";%", TokenType::Misc);

        table
    };
}

#[inline]
fn class(b: u8) -> TokenType {
    CLASS[b as usize]
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A token and the input slice it covers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The lexical class
    pub ttype: TokenType,
    /// The covered bytes, delimiters included
    pub contents: &'a str,
}

impl<'a> Token<'a> {
    /// Returns `true` unless this is the end-of-input token
    pub fn is_some(&self) -> bool {
        self.ttype != TokenType::None
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A cursor emitting tokens from a PGN buffer
#[derive(Debug, Copy, Clone)]
pub struct TokenStream<'a> {
    input: &'a str,
    /// The byte position of the next token
    pub pos: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a stream over `input`
    pub fn new(input: &'a str) -> TokenStream<'a> {
        TokenStream { input, pos: 0 }
    }

    /// Returns the input the stream walks
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Returns `true` when the cursor is at the end of the input
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn byte(&self, i: usize) -> Option<u8> {
        self.input.as_bytes().get(i).copied()
    }

    /// Consumes `c` if it is the next byte
    pub fn accept(&mut self, c: u8) -> bool {
        if self.byte(self.pos) == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes any run of bytes from `chars`; returns whether anything was consumed
    pub fn eat(&mut self, chars: &[u8]) -> bool {
        let start = self.pos;
        while let Some(b) = self.byte(self.pos) {
            if !chars.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        self.pos > start
    }

    /// Consumes up to and including the next line feed
    pub fn skip_line(&mut self) {
        while let Some(b) = self.byte(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    /// Reads the next token, consuming contiguous bytes according to its class
    pub fn next_token(&mut self) -> Token<'a> {
        let bytes = self.input.as_bytes();
        let start = self.pos;

        let c = match bytes.get(self.pos) {
            Some(&c) => c,
            None => return Token { ttype: TokenType::None, contents: "" },
        };
        let ttype = class(c);

        match ttype {
            TokenType::Integer
            | TokenType::Whitespace
            | TokenType::Newline
            | TokenType::Period => {
                self.pos += 1;
                while self.pos < bytes.len() && class(bytes[self.pos]) == ttype {
                    self.pos += 1;
                }
            }
            TokenType::Symbol => {
                self.pos += 1;
                while self.pos < bytes.len()
                    && (class(bytes[self.pos]) == TokenType::Symbol
                        || class(bytes[self.pos]) == TokenType::Integer)
                {
                    self.pos += 1;
                }
            }
            TokenType::String | TokenType::Comment => {
                // consume through the matching delimiter, or to the end of the input;
                // the parser reports the truncated case
                self.pos += 1;
                while self.pos < bytes.len() {
                    let done = class(bytes[self.pos]) == ttype;
                    self.pos += 1;
                    if done {
                        break;
                    }
                }
            }
            TokenType::Asterisk | TokenType::Bracket | TokenType::Misc => {
                self.pos += 1;
            }
            TokenType::Nag => {
                self.pos += 1;
                if c == b'$' {
                    while self.pos < bytes.len() && class(bytes[self.pos]) == TokenType::Integer {
                        self.pos += 1;
                    }
                } else {
                    self.eat(b"?!");
                }
            }
            TokenType::None => {
                return Token { ttype: TokenType::None, contents: "" };
            }
        }

        Token { ttype, contents: &self.input[start..self.pos] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenType, &str)> {
        let mut stream = TokenStream::new(input);
        let mut out = Vec::new();
        loop {
            let t = stream.next_token();
            if !t.is_some() {
                break;
            }
            out.push((t.ttype, t.contents));
        }
        out
    }

    #[test]
    fn symbols_extend_through_digits_and_marks() {
        assert_eq!(
            kinds("Nf3+ e8=Q"),
            vec![
                (TokenType::Symbol, "Nf3+"),
                (TokenType::Whitespace, " "),
                (TokenType::Symbol, "e8=Q"),
            ]
        );
    }

    #[test]
    fn integers_periods_and_results() {
        assert_eq!(
            kinds("1... e5"),
            vec![
                (TokenType::Integer, "1"),
                (TokenType::Period, "..."),
                (TokenType::Whitespace, " "),
                (TokenType::Symbol, "e5"),
            ]
        );
    }

    #[test]
    fn strings_and_comments_span_to_their_delimiters() {
        assert_eq!(
            kinds("\"Praga\" {a fine game}"),
            vec![
                (TokenType::String, "\"Praga\""),
                (TokenType::Whitespace, " "),
                (TokenType::Comment, "{a fine game}"),
            ]
        );

        // unterminated: the token runs to the end of input without its delimiter
        assert_eq!(kinds("\"Praga"), vec![(TokenType::String, "\"Praga")]);
    }

    #[test]
    fn nags_in_both_notations() {
        assert_eq!(
            kinds("$14 !? ??"),
            vec![
                (TokenType::Nag, "$14"),
                (TokenType::Whitespace, " "),
                (TokenType::Nag, "!?"),
                (TokenType::Whitespace, " "),
                (TokenType::Nag, "??"),
            ]
        );
    }

    #[test]
    fn brackets_are_single_bytes() {
        assert_eq!(
            kinds("[()]"),
            vec![
                (TokenType::Bracket, "["),
                (TokenType::Bracket, "("),
                (TokenType::Bracket, ")"),
                (TokenType::Bracket, "]"),
            ]
        );
    }
}
