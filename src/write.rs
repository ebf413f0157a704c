//! Split a contiguous array of items into numbered chunk files.
//!
//! Each chunk file holds an opaque header followed by its items. The
//! returned [`ChunkTable`] describes the files so that they can be read back
//! with [`crate::read::ChunkedReader`].
use crate::handle::chunk_path;
use crate::io::write_bytes_at;
use crate::table::{ChunkDescriptor, ChunkTable};
use std::fs::File;
use tracing::debug;

//-----------------------------------------------------------------------------
/// Errors returned by [`write_chunked`].
#[derive(Debug)]
pub enum WriteError {
    IO(std::io::Error),
    /// Item size, chunk size or data length do not fit together.
    InvalidLayout(String),
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::IO(err) => write!(f, "I/O error: {}", err),
            WriteError::InvalidLayout(msg) => write!(f, "invalid chunk layout: {}", msg),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::IO(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WriteError {
    fn from(err: std::io::Error) -> Self {
        WriteError::IO(err)
    }
}

//-----------------------------------------------------------------------------
/// Write `data`, a run of `item_size`-byte items, to files
/// `<filename_root>.0`, `<filename_root>.1`, ... holding `items_per_chunk`
/// items each (the last one possibly fewer), every file starting with
/// `header`.
pub fn write_chunked(
    filename_root: &str,
    item_size: usize,
    data: &[u8],
    items_per_chunk: usize,
    header: &[u8],
) -> Result<ChunkTable, WriteError> {
    if item_size == 0 || items_per_chunk == 0 {
        return Err(WriteError::InvalidLayout(
            "item size and items per chunk must be non-zero".to_string(),
        ));
    }
    if data.len() % item_size != 0 {
        return Err(WriteError::InvalidLayout(format!(
            "{} bytes is not a multiple of item size {}",
            data.len(),
            item_size
        )));
    }
    let header_offset = header.len() as u64;
    let mut chunks = Vec::new();
    let mut start = 0_u64;
    for (i, items) in data.chunks(items_per_chunk * item_size).enumerate() {
        let path = chunk_path(filename_root, i);
        let file = File::create(&path)?;
        write_bytes_at(header, &file, 0)?;
        write_bytes_at(items, &file, header_offset)?;
        let step = (items.len() / item_size) as u64;
        debug!(path = %path.display(), start, step, "wrote chunk");
        chunks.push(ChunkDescriptor {
            start,
            last: start + step - 1,
            step,
            header_offset,
        });
        start += step;
    }
    Ok(ChunkTable::new(chunks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_layout() -> Result<(), String> {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let root = dir.path().join("arr");
        let root = root.to_str().ok_or("non utf-8 path")?;
        let data: Vec<u8> = (0_u8..50).collect();
        let table = write_chunked(root, 2, &data, 10, b"HDR").map_err(|err| err.to_string())?;
        assert!(table.validate().is_ok());
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_items(), 25);
        let last = table.get(2).ok_or("missing chunk")?;
        assert_eq!((last.start, last.last, last.step), (20, 24, 5));
        let len = std::fs::metadata(format!("{}.2", root))
            .map_err(|err| err.to_string())?
            .len();
        assert_eq!(len, 3 + 10);
        Ok(())
    }

    #[test]
    fn ragged_data_is_rejected() {
        assert!(matches!(
            write_chunked("unused", 4, &[0_u8; 6], 2, &[]),
            Err(WriteError::InvalidLayout(_))
        ));
    }
}
