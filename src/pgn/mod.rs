//! Portable Game Notation: a recoverable streaming tokenizer and parser
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
//! The tokenizer walks a byte buffer through a 256-entry character-class table; the parser
//! reconstructs each game's positions move by move through the rules core and reports tags,
//! moves and results to caller-supplied visitors. Malformed games can be skipped without
//! losing the rest of the file.
////////////////////////////////////////////////////////////////////////////////////////////////////

mod tokens;
mod parser;

pub use tokens::{Token, TokenStream, TokenType};
pub use parser::{parse_game, parse_games, parse_movetext, parse_tags, ParseStep};
