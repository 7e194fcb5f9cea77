//! Lifecycle of a read-write file mapping
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use memmap::{MmapMut, MmapOptions};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A file mapped read-write into memory.
///
/// The mapping covers the whole file; `file_size` tracks the logical size, which the file is
/// truncated back to when the mapping is dropped. Move-only, released on drop.
#[derive(Debug)]
pub struct MmapFile {
    map: MmapMut,
    file: File,
    file_size: u64,
}

impl MmapFile {
    /// Opens `path` for read-write mapping, creating it if absent and extending it to at
    /// least `size` bytes. When `temp` is set the file is unlinked immediately, so the
    /// data lives only as long as the mapping.
    pub fn open(path: &Path, size: u64, temp: bool) -> io::Result<MmapFile> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let existing = file.metadata()?.len();
        let size = existing.max(size).max(1);
        if existing < size {
            file.set_len(size)?;
        }

        let map = unsafe { MmapOptions::new().map_mut(&file)? };

        if temp {
            fs::remove_file(path)?;
        }

        Ok(MmapFile { map, file, file_size: size })
    }

    /// Returns the logical file size in bytes
    pub fn len(&self) -> usize {
        self.file_size as usize
    }

    /// Returns `true` if the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.file_size == 0
    }

    /// Shrinks the logical size; the file is truncated to it when the mapping is released
    pub fn set_logical_len(&mut self, len: u64) {
        assert!(len <= self.map.len() as u64);
        self.file_size = len;
    }

    /// Returns the mapped bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.map[..self.file_size as usize]
    }

    /// Returns the mapped bytes for writing
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.file_size as usize;
        &mut self.map[..len]
    }

    /// Flushes the mapping to the underlying file
    pub fn flush(&self) -> io::Result<()> {
        self.map.flush()
    }
}

impl Drop for MmapFile {
    fn drop(&mut self) {
        let _ = self.map.flush();
        let _ = self.file.set_len(self.file_size);
    }
}
