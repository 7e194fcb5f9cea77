//! Byte-level input/output: cursor buffers and memory-mapped files
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

mod buffer;
mod mmap;

pub use buffer::{push_uleb128, Buffer, BufferMut};
pub use mmap::MmapFile;

/// The fixed 64-bit hash used for every checksum and slot signature in the database
#[inline]
pub fn hash(data: &[u8], seed: u64) -> u64 {
    wyhash::wyhash(data, seed)
}
