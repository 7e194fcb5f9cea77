//! A chess game database: PGN ingestion, validation and compact hash-addressed storage
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
//! PGN archives flow through the [`pgn`](pgn/index.html) tokenizer and parser, every move
//! is validated and replayed through the rules core in the `chess` crate, and games are
//! persisted by the [`db`](db/index.html) container into a single checksummed file that
//! supports hash-addressed lookup, in-place edit and streaming iteration.
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]

pub mod error;
pub mod io;
pub mod pgn;
pub mod db;
pub mod pool;

pub use error::{Error, Result};
