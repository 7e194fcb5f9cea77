//! The on-disk database container: header, storage and the page-addressed game arena
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{DbError, Error, IoError, Result};
use crate::io::{hash, Buffer, BufferMut, MmapFile};

mod page;
pub mod codec;

pub use page::{format, GameView, Page, PAGE_HEADER_SIZE};

/// The file magic: a 0xBF marker byte pair followed by `ChessDB` and a line feed
pub const MAGIC: [u8; 10] = *b"\xc2\xbfChessDB\n";
/// Total size of the fixed header
pub const HEADER_SIZE: usize = 96;
/// Bytes reserved for the NUL-padded database name
pub const NAME_LENGTH: usize = 42;
/// Current format version
pub const VERSION: u32 = 1;
/// Sentinel version marking a raw PGN file with no header
pub const VERSION_PGN: u32 = 0xffff_ffff;
/// Default page size for the game arena
pub const PAGE_SIZE: usize = 0x8000;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The fixed database header.
///
/// Serialised byte-exactly as: magic, self-checksum (u64), version (u32), name (42 bytes,
/// NUL-padded), data length, data offset, data checksum and game count (u64 each, all
/// little-endian). The self-checksum covers everything from the version field to the end
/// of the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Self-checksum over the header bytes after the magic and checksum fields
    pub checksum: u64,
    /// Format version, or [`VERSION_PGN`](constant.VERSION_PGN.html) for raw PGN
    pub version: u32,
    /// Human-readable database name
    pub name: String,
    /// Length of the game arena in bytes
    pub data_length: u64,
    /// File offset of the game arena
    pub data_offset: u64,
    /// Hash of the whole game arena
    pub data_checksum: u64,
    /// Number of games stored
    pub game_count: u64,
}

impl Header {
    /// Serialises the header into the first [`HEADER_SIZE`](constant.HEADER_SIZE.html)
    /// bytes of `out`, computing and back-patching the self-checksum
    pub fn serialise(&mut self, out: &mut [u8]) {
        assert!(out.len() >= HEADER_SIZE);
        let mut buf = BufferMut::new(&mut out[..HEADER_SIZE]);

        buf.write_bytes(&MAGIC);
        buf.seek(8); // the checksum slot is patched last

        buf.write_u32(self.version);

        let name = self.name.as_bytes();
        let name = &name[..name.len().min(NAME_LENGTH)];
        buf.write_bytes(name);
        for _ in name.len()..NAME_LENGTH {
            buf.write_u8(0);
        }

        buf.write_u64(self.data_length);
        buf.write_u64(self.data_offset);
        buf.write_u64(self.data_checksum);
        buf.write_u64(self.game_count);

        self.checksum = buf.hash_range(MAGIC.len() + 8, HEADER_SIZE - MAGIC.len() - 8, 0);
        buf.seek_to(MAGIC.len());
        buf.write_u64(self.checksum);
    }

    /// Reads and verifies a header from the start of `data`
    pub fn deserialise(data: &[u8]) -> Result<Header> {
        if data.len() < HEADER_SIZE || data[..MAGIC.len()] != MAGIC {
            return Err(DbError::BadMagic.into());
        }

        let mut buf = Buffer::new(&data[..HEADER_SIZE]);
        buf.seek(MAGIC.len());
        let checksum = buf.read_u64();

        let actual = buf
            .subbuf(MAGIC.len() + 8, HEADER_SIZE - MAGIC.len() - 8)
            .hash(0);
        if actual != checksum {
            return Err(DbError::BadChecksum.into());
        }

        let version = buf.read_u32();
        let name_bytes = buf.read_bytes(NAME_LENGTH);
        let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_LENGTH);
        let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

        Ok(Header {
            checksum,
            version,
            name,
            data_length: buf.read_u64(),
            data_offset: buf.read_u64(),
            data_checksum: buf.read_u64(),
            game_count: buf.read_u64(),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Where the database bytes live: a file mapping, or a plain heap buffer in in-memory mode
#[derive(Debug)]
enum Storage {
    Mapped(MmapFile),
    Heap(Vec<u8>),
}

impl Storage {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Mapped(f) => f.as_slice(),
            Storage::Heap(v) => v,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Mapped(f) => f.as_mut_slice(),
            Storage::Heap(v) => v,
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Storage::Mapped(f) => f.flush().map_err(Error::from),
            Storage::Heap(_) => Ok(()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Options for [`Database::open`](struct.Database.html#method.open)
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Create the file if it does not exist
    pub create: bool,
    /// Unlink the file immediately, keeping the data only as long as the mapping
    pub temporary: bool,
    /// Work on a heap copy instead of a mapping; changes are not written back
    pub in_memory: bool,
    /// Total file size when creating
    pub size: usize,
    /// Database name to record when creating
    pub name: String,
}

impl Default for OpenOptions {
    fn default() -> OpenOptions {
        OpenOptions {
            create: false,
            temporary: false,
            in_memory: false,
            size: HEADER_SIZE + PAGE_SIZE,
            name: String::new(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A chess game database over a single file.
///
/// The file is a fixed header followed by a page-partitioned game arena. The database owns
/// the storage exclusively; byte spans handed out by [`find`](#method.find) and
/// [`games`](#method.games) must not be retained across a mutation. A write becomes durable
/// through [`flush`](#method.flush): page checksums, then the arena checksum, then the
/// header checksum, then the mapping.
#[derive(Debug)]
pub struct Database {
    storage: Storage,
    header: Header,
    pages: Vec<Page>,
    dropped_games: u64,
}

impl Database {
    /// Opens a database file, creating it when the options say so. Files with a `.pgn`
    /// extension open as raw PGN with the sentinel version and no arena.
    pub fn open(path: &Path, options: &OpenOptions) -> Result<Database> {
        debug!(
            "db: opening {} (create = {}, in_memory = {}, size = {})",
            path.display(),
            options.create,
            options.in_memory,
            options.size
        );

        let exists = path.exists();
        let is_pgn = path.extension().map_or(false, |e| e == "pgn");

        if exists && options.temporary {
            warn!("db: {} exists, refusing to reuse it as a temporary", path.display());
            return Err(IoError::FileExists.into());
        }
        if !exists && !options.create {
            return Err(IoError::FileNotFound.into());
        }

        let storage = if options.in_memory {
            let mut data = if exists { fs::read(path)? } else { Vec::new() };
            data.resize(data.len().max(options.size).max(HEADER_SIZE + PAGE_HEADER_SIZE), 0);
            Storage::Heap(data)
        } else {
            let size = if exists { 0 } else { options.size.max(HEADER_SIZE + PAGE_HEADER_SIZE) };
            Storage::Mapped(MmapFile::open(path, size as u64, options.temporary)?)
        };

        let mut db = if exists && is_pgn {
            let len = storage.as_slice().len() as u64;
            Database {
                storage,
                header: Header {
                    version: VERSION_PGN,
                    data_length: len,
                    ..Header::default()
                },
                pages: Vec::new(),
                dropped_games: 0,
            }
        } else if exists {
            let header = Header::deserialise(storage.as_slice())?;
            if (header.data_offset + header.data_length) as usize > storage.as_slice().len() {
                return Err(DbError::BadChecksum.into());
            }

            let mut db = Database { storage, header, pages: Vec::new(), dropped_games: 0 };
            db.load_pages();
            db
        } else {
            let mut header = Header {
                checksum: 0,
                version: VERSION,
                name: options.name.clone(),
                data_length: (storage.as_slice().len() - HEADER_SIZE) as u64,
                data_offset: HEADER_SIZE as u64,
                data_checksum: 0,
                game_count: 0,
            };
            let mut db = Database { storage, header: Header::default(), pages: Vec::new(), dropped_games: 0 };
            header.serialise(db.storage.as_mut_slice());
            db.header = header;
            db
        };

        if db.header.version != VERSION && !db.is_pgn() {
            warn!("db: unexpected version {}", db.header.version);
        }

        info!(
            "db: opened {} (name = {:?}, games = {}, arena = {} bytes)",
            path.display(),
            db.header.name,
            db.game_count(),
            db.header.data_length
        );

        Ok(db)
    }

    /// Creates a new database file
    pub fn create(path: &Path, options: &OpenOptions) -> Result<Database> {
        let options = OpenOptions { create: true, ..options.clone() };
        if path.exists() && !options.temporary {
            return Err(IoError::FileExists.into());
        }
        Database::open(path, &options)
    }

    // walk the arena page by page; a corrupt page is dropped from the index and its
    // best-effort game count subtracted from the total
    fn load_pages(&mut self) {
        let arena = &self.storage.as_slice()
            [self.header.data_offset as usize..(self.header.data_offset + self.header.data_length) as usize];

        let mut offset = 0;
        while offset + PAGE_HEADER_SIZE <= arena.len() {
            let size = u16::from(arena[offset]) | u16::from(arena[offset + 1]) << 8;
            if size == 0 {
                break;
            }

            match Page::parse(arena, offset) {
                Ok(page) => self.pages.push(page),
                Err(e) => {
                    let lost = Page::count_games_lenient(arena, offset);
                    warn!(
                        "db: page at {} is unusable ({}), dropping {} games",
                        offset, e, lost
                    );
                    self.dropped_games += lost;
                }
            }

            offset += size as usize;
        }
    }

    /// Returns `true` if the file is a raw PGN rather than a database
    pub fn is_pgn(&self) -> bool {
        self.header.version == VERSION_PGN
    }

    /// Returns the header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the number of retrievable games
    pub fn game_count(&self) -> u64 {
        self.header.game_count.saturating_sub(self.dropped_games)
    }

    /// Returns the raw bytes of a raw-PGN database
    pub fn pgn_bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    fn arena(&self) -> &[u8] {
        let off = self.header.data_offset as usize;
        &self.storage.as_slice()[off..off + self.header.data_length as usize]
    }

    /// Stores an encoded game and returns its lookup hash.
    ///
    /// `tags` is a terminated tag block and `moves` the encoded move block. A slot's
    /// format byte must be non-zero to stay distinguishable from a tombstone, so a game
    /// without tags is stored with a terminator-only tag block.
    pub fn add_game(&mut self, tags: &[u8], moves: &[u8]) -> Result<u64> {
        assert!(!self.is_pgn());

        let tags = if tags.is_empty() { &[0u8][..] } else { tags };
        let fmt = format::HAS_TAG_DATA;

        let off = self.header.data_offset as usize;
        let len = self.header.data_length as usize;
        let arena = &mut self.storage.as_mut_slice()[off..off + len];

        if let Some(page) = self.pages.last_mut() {
            if let Some(hash) = page.insert(arena, tags, moves, fmt) {
                self.header.game_count += 1;
                return Ok(hash);
            }
        }

        // the current page is full; append a fresh one
        let used: usize = self.pages.iter().map(Page::size).sum();
        let needed = 1 + 2 + tags.len() + 2 + moves.len();
        let remaining = len - used;

        if remaining < PAGE_HEADER_SIZE + needed {
            return Err(DbError::OutOfMemory.into());
        }

        let page_size = PAGE_SIZE.min(remaining).min(usize::from(u16::max_value()));
        let mut page = Page::init(arena, used, page_size as u16);
        let hash = page
            .insert(arena, tags, moves, fmt)
            .ok_or(Error::Db(DbError::OutOfMemory))?;

        self.pages.push(page);
        self.header.game_count += 1;
        Ok(hash)
    }

    /// Looks up a stored game by its slot hash
    pub fn find(&self, hash: u64) -> Option<GameView<'_>> {
        let arena = self.arena();

        self.pages
            .iter()
            .find_map(|p| p.find(arena, hash).map(|idx| p.game(arena, idx)))
    }

    /// Removes the game with the given hash, leaving a tombstone
    pub fn remove(&mut self, hash: u64) -> bool {
        let off = self.header.data_offset as usize;
        let len = self.header.data_length as usize;
        let arena = &mut self.storage.as_mut_slice()[off..off + len];

        for page in &mut self.pages {
            if let Some(idx) = page.find(arena, hash) {
                page.remove(arena, idx);
                self.header.game_count -= 1;
                return true;
            }
        }

        false
    }

    /// Merges adjacent free slots on every page
    pub fn coalesce(&mut self) {
        let off = self.header.data_offset as usize;
        let len = self.header.data_length as usize;
        let arena = &mut self.storage.as_mut_slice()[off..off + len];

        for page in &mut self.pages {
            page.coalesce(arena);
        }
    }

    /// Iterates over every stored game
    pub fn games(&self) -> impl Iterator<Item = GameView<'_>> {
        let arena = self.arena();
        self.pages.iter().flat_map(move |p| p.games(arena))
    }

    /// Commits changed pages, recomputes the arena and header checksums and flushes the
    /// mapping, in that order
    pub fn flush(&mut self) -> Result<()> {
        if self.is_pgn() {
            return Ok(());
        }
        debug!("db: flushing");

        let off = self.header.data_offset as usize;
        let len = self.header.data_length as usize;
        {
            let arena = &mut self.storage.as_mut_slice()[off..off + len];
            for page in &mut self.pages {
                if page.changed() {
                    page.commit(arena);
                }
            }
        }

        self.header.data_checksum = hash(&self.storage.as_slice()[off..off + len], 0);
        let mut header = self.header.clone();
        header.serialise(self.storage.as_mut_slice());
        self.header = header;

        self.storage.flush()
    }

    /// Flushes and releases the database
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let mut out = [0u8; HEADER_SIZE];
        let mut header = Header {
            checksum: 0,
            version: VERSION,
            name: "club games".to_string(),
            data_length: 12_345,
            data_offset: HEADER_SIZE as u64,
            data_checksum: 0xfeed_beef,
            game_count: 42,
        };
        header.serialise(&mut out);

        assert_eq!(&out[..MAGIC.len()], &MAGIC);
        let read = Header::deserialise(&out).unwrap();
        assert_eq!(read, header);
        assert_ne!(read.checksum, 0);
    }

    #[test]
    fn header_field_offsets_are_fixed() {
        let mut out = [0u8; HEADER_SIZE];
        let mut header = Header {
            version: 0x0403_0201,
            name: "x".to_string(),
            data_length: 0x11,
            data_offset: 0x22,
            data_checksum: 0x33,
            game_count: 0x44,
            ..Header::default()
        };
        header.serialise(&mut out);

        assert_eq!(out[18..22], [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(out[22], b'x');
        assert_eq!(out[23], 0);
        assert_eq!(out[64], 0x11);
        assert_eq!(out[72], 0x22);
        assert_eq!(out[80], 0x33);
        assert_eq!(out[88], 0x44);
    }

    #[test]
    fn corrupt_header_is_fatal() {
        let mut out = [0u8; HEADER_SIZE];
        let mut header = Header { version: VERSION, ..Header::default() };
        header.serialise(&mut out);

        let mut bad_magic = out;
        bad_magic[0] = b'X';
        assert_eq!(
            Header::deserialise(&bad_magic).unwrap_err(),
            Error::Db(DbError::BadMagic)
        );

        let mut bad_sum = out;
        bad_sum[30] ^= 0xff;
        assert_eq!(
            Header::deserialise(&bad_sum).unwrap_err(),
            Error::Db(DbError::BadChecksum)
        );
    }

    #[test]
    fn long_names_are_clipped() {
        let mut out = [0u8; HEADER_SIZE];
        let mut header = Header {
            name: "n".repeat(NAME_LENGTH + 10),
            ..Header::default()
        };
        header.serialise(&mut out);

        let read = Header::deserialise(&out).unwrap();
        assert_eq!(read.name.len(), NAME_LENGTH);
    }

    #[test]
    fn in_memory_database_stores_and_finds_games() {
        let path = std::env::temp_dir().join(format!("cdb-mem-{}.cdb", std::process::id()));
        let options = OpenOptions {
            create: true,
            in_memory: true,
            size: HEADER_SIZE + 4096,
            name: "mem".to_string(),
            ..OpenOptions::default()
        };

        let mut db = Database::open(&path, &options).unwrap();
        let hash = db.add_game(b"", b"\x00\x01").unwrap();

        assert_eq!(db.game_count(), 1);
        assert_eq!(db.find(hash).unwrap().moves, b"\x00\x01");
        assert!(db.find(hash ^ 1).is_none());

        db.remove(hash);
        assert_eq!(db.game_count(), 0);
        assert!(db.find(hash).is_none());
        assert!(!path.exists());
    }
}
