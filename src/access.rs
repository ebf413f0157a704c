//! Access strategies for one physical chunk file shared by the group.
//!
//! A strategy is invoked by every member for every chunk the group agreed to
//! touch, including members that need nothing from it (empty destination);
//! those still take part in whatever synchronization the strategy uses.
use crate::config::AccessMode;
use crate::group::CollectiveGroup;
use crate::io::read_bytes_at;
use crate::read::ReadError;
use std::fs::File;
use std::path::Path;
use tracing::debug;

//-----------------------------------------------------------------------------
/// Strategy for reading a byte run out of a chunk file.
pub trait ChunkFileAccess {
    /// Fill `dest` with the bytes found at `offset` in `path`. An empty
    /// `dest` means this member reads nothing and must not open the file.
    fn read_chunk(
        &self,
        group: &dyn CollectiveGroup,
        path: &Path,
        offset: u64,
        dest: &mut [u8],
    ) -> Result<(), ReadError>;
}

/// Strategy implementing `mode`.
pub fn access_for(mode: AccessMode) -> Box<dyn ChunkFileAccess + Send + Sync> {
    match mode {
        AccessMode::Parallel => Box::new(ParallelFileAccess),
        AccessMode::Serialized => Box::new(SerializedFileAccess),
    }
}

//-----------------------------------------------------------------------------
/// Open, read at offset and close.
fn open_and_read(path: &Path, offset: u64, dest: &mut [u8]) -> Result<(), ReadError> {
    let file = File::open(path).map_err(|err| {
        ReadError::IO(std::io::Error::new(
            err.kind(),
            format!("cannot open {}: {}", path.display(), err),
        ))
    })?;
    read_bytes_at(dest, &file, offset)
}

//-----------------------------------------------------------------------------
/// Every member with data to read opens the chunk file concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelFileAccess;

impl ChunkFileAccess for ParallelFileAccess {
    fn read_chunk(
        &self,
        group: &dyn CollectiveGroup,
        path: &Path,
        offset: u64,
        dest: &mut [u8],
    ) -> Result<(), ReadError> {
        if dest.is_empty() {
            return Ok(());
        }
        debug!(
            rank = group.rank(),
            path = %path.display(),
            offset,
            bytes = dest.len(),
            "parallel chunk read"
        );
        open_and_read(path, offset, dest)
    }
}

//-----------------------------------------------------------------------------
/// Members take turns in rank order; only the member whose turn it is may
/// have the file open, and a barrier separates consecutive turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializedFileAccess;

impl ChunkFileAccess for SerializedFileAccess {
    fn read_chunk(
        &self,
        group: &dyn CollectiveGroup,
        path: &Path,
        offset: u64,
        dest: &mut [u8],
    ) -> Result<(), ReadError> {
        let rank = group.rank();
        for turn in 0..group.size() {
            if turn == rank && !dest.is_empty() {
                debug!(
                    rank,
                    path = %path.display(),
                    offset,
                    bytes = dest.len(),
                    "serialized chunk read"
                );
                open_and_read(path, offset, dest)?;
            }
            group.barrier()?;
        }
        Ok(())
    }
}
