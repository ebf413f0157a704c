//! Handle on one logical array stored as numbered chunk files.
use crate::read::ReadError;
use crate::table::ChunkTable;
use std::path::PathBuf;

//-----------------------------------------------------------------------------
/// Physical file name of chunk `index`: `<root>.<index>`.
pub fn chunk_path(filename_root: &str, index: usize) -> PathBuf {
    PathBuf::from(format!("{}.{}", filename_root, index))
}

//-----------------------------------------------------------------------------
/// A logical array split across chunk files, with the group-wide read
/// cursor.
///
/// The cursor is the global index of the next unread item. Only the read
/// engine moves it, once per read call, to the maximum position reached by
/// any member of the group; it is a single shared stream position, not a
/// per-member bookmark.
#[derive(Debug, Clone)]
pub struct ChunkedFileHandle {
    filename_root: String,
    item_size: usize,
    table: ChunkTable,
    cursor: u64,
}

impl ChunkedFileHandle {
    pub fn open(
        filename_root: impl Into<String>,
        item_size: usize,
        table: ChunkTable,
    ) -> Result<Self, ReadError> {
        if item_size == 0 {
            return Err(ReadError::Other("item size must be non-zero".to_string()));
        }
        Ok(Self {
            filename_root: filename_root.into(),
            item_size,
            table,
            cursor: 0,
        })
    }

    /// Start reading at global item `cursor` instead of 0.
    pub fn with_cursor(mut self, cursor: u64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn filename_root(&self) -> &str {
        &self.filename_root
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn table(&self) -> &ChunkTable {
        &self.table
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Move the cursor back to the first item. Every member must rewind
    /// its handle at the same point in the read sequence.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn chunk_path(&self, index: usize) -> PathBuf {
        chunk_path(&self.filename_root, index)
    }

    pub(crate) fn set_cursor(&mut self, cursor: u64) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_names_use_decimal_suffix() {
        assert_eq!(chunk_path("data/halos", 0), PathBuf::from("data/halos.0"));
        assert_eq!(chunk_path("data/halos", 12), PathBuf::from("data/halos.12"));
    }

    #[test]
    fn zero_item_size_is_rejected() {
        assert!(ChunkedFileHandle::open("x", 0, ChunkTable::default()).is_err());
    }

    #[test]
    fn rewind_resets_cursor() {
        let mut h = ChunkedFileHandle::open("x", 4, ChunkTable::default())
            .unwrap()
            .with_cursor(17);
        assert_eq!(h.cursor(), 17);
        h.rewind();
        assert_eq!(h.cursor(), 0);
    }
}
