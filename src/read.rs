//! Collective chunked reading.
//!
//! All members of a group call [`ChunkedReader::read`] together. For every
//! chunk, in chunk order, the members agree through a max-reduce on whether
//! anybody needs data from it; chunks nobody needs are never opened. Chunks
//! somebody needs are read through the configured access strategy, with
//! every member taking part. Finally the members agree on the new cursor:
//! the furthest position reached by any of them.
//!
//! ```ignore
//! let results = run_in_threads(3, |member| {
//!     let reader = ChunkedReader::new(member, ReadConfig::default());
//!     let mut handle = ChunkedFileHandle::open(root, 4, table.clone())?;
//!     let mut buffer = vec![0_u8; 8 * 4];
//!     let n = reader.read(&mut handle, &mut buffer, 0, 8)?;
//!     Ok::<_, ReadError>((n, handle.cursor()))
//! });
//! ```
use crate::access::{access_for, ChunkFileAccess};
use crate::config::ReadConfig;
use crate::group::{CollectiveGroup, ReduceTag};
use crate::handle::ChunkedFileHandle;
use crate::resolve::resolve;
use tracing::{debug, trace};

//-----------------------------------------------------------------------------
/// Errors returned by chunked reads and group collectives.
///
/// A failed read aborts the group: the call is invalidated on every member
/// and no further collectives succeed. Nothing is retried.
#[derive(Debug)]
pub enum ReadError {
    /// Opening, seeking or reading a chunk file failed.
    IO(std::io::Error),
    /// Members issued different collective operations.
    Protocol(String),
    /// A member aborted the group.
    Aborted { rank: usize },
    /// A member left the group.
    Disconnected { rank: usize },
    /// Caller buffer cannot hold the requested items.
    BufferTooSmall { needed: usize, actual: usize },
    /// Chunk table failed validation.
    InvalidTable(String),
    Other(String),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::IO(err) => write!(f, "I/O error: {}", err),
            ReadError::Protocol(msg) => write!(f, "collective protocol violation: {}", msg),
            ReadError::Aborted { rank } => write!(f, "group aborted by rank {}", rank),
            ReadError::Disconnected { rank } => write!(f, "rank {} left the group", rank),
            ReadError::BufferTooSmall { needed, actual } => write!(
                f,
                "buffer too small: {} bytes needed, {} available",
                needed, actual
            ),
            ReadError::InvalidTable(msg) => write!(f, "invalid chunk table: {}", msg),
            ReadError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::IO(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        ReadError::IO(err)
    }
}

//-----------------------------------------------------------------------------
/// Chunked read engine bound to one group member.
pub struct ChunkedReader<G> {
    group: G,
    access: Box<dyn ChunkFileAccess + Send + Sync>,
    config: ReadConfig,
}

impl<G: CollectiveGroup> ChunkedReader<G> {
    pub fn new(group: G, config: ReadConfig) -> Self {
        Self {
            group,
            access: access_for(config.access_mode()),
            config,
        }
    }

    /// Use a custom access strategy instead of the one selected by the
    /// configured access mode.
    pub fn with_access(mut self, access: Box<dyn ChunkFileAccess + Send + Sync>) -> Self {
        self.access = access;
        self
    }

    pub fn group(&self) -> &G {
        &self.group
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Read up to `count` items starting at `handle.cursor() + local_offset`
    /// into `buffer`, returning the number of items this member read.
    ///
    /// Fewer than `count` items are returned only when the chunk table is
    /// exhausted. On return the handle cursor holds the furthest position
    /// reached across the group. A member with `count == 0` does not move
    /// the cursor by itself.
    pub fn read(
        &self,
        handle: &mut ChunkedFileHandle,
        buffer: &mut [u8],
        local_offset: u64,
        count: u64,
    ) -> Result<u64, ReadError> {
        self.try_read(handle, buffer, local_offset, count)
            .map_err(|err| {
                self.group.abort();
                err
            })
    }

    fn try_read(
        &self,
        handle: &mut ChunkedFileHandle,
        buffer: &mut [u8],
        local_offset: u64,
        count: u64,
    ) -> Result<u64, ReadError> {
        if self.config.validate_table() {
            handle.table().validate()?;
        }
        let item_size = handle.item_size();
        let needed = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(item_size))
            .ok_or_else(|| ReadError::Other(format!("cannot address {} items", count)))?;
        if buffer.len() < needed {
            return Err(ReadError::BufferTooSmall {
                needed,
                actual: buffer.len(),
            });
        }
        let rank = self.group.rank();
        let start = handle.cursor().checked_add(local_offset).ok_or_else(|| {
            ReadError::Other(format!(
                "offset {} past cursor {} overflows",
                local_offset,
                handle.cursor()
            ))
        })?;
        let resolution = resolve(start, count, handle.table());
        for (slice, chunk) in resolution.slices.iter().zip(handle.table()) {
            let tag = ReduceTag::Take { chunk: slice.chunk };
            let group_take = self.group.all_reduce_max(tag, slice.take)?;
            if group_take == 0 {
                trace!(rank, chunk = slice.chunk, "chunk not needed by group");
                continue;
            }
            debug!(
                rank,
                chunk = slice.chunk,
                skip = slice.skip,
                take = slice.take,
                group_take,
                "reading chunk"
            );
            let offset = chunk.header_offset + slice.skip * item_size as u64;
            let begin = slice.buffer_items as usize * item_size;
            let end = begin + slice.take as usize * item_size;
            self.access.read_chunk(
                &self.group,
                &handle.chunk_path(slice.chunk),
                offset,
                &mut buffer[begin..end],
            )?;
        }
        let reached = if count > 0 { resolution.end } else { handle.cursor() };
        let cursor = self.group.all_reduce_max(ReduceTag::Cursor, reached)?;
        debug!(rank, items = resolution.items, cursor, "chunked read complete");
        handle.set_cursor(cursor);
        Ok(resolution.items)
    }
}

//-----------------------------------------------------------------------------
/// Single call form of [`ChunkedReader::read`].
pub fn read_chunked<G: CollectiveGroup>(
    handle: &mut ChunkedFileHandle,
    group: &G,
    config: ReadConfig,
    buffer: &mut [u8],
    local_offset: u64,
    count: u64,
) -> Result<u64, ReadError> {
    ChunkedReader::new(group, config).read(handle, buffer, local_offset, count)
}
