//! # Collective chunked file reading
//! This crate reads a logically contiguous array of fixed-size items that is
//! physically split across numbered chunk files `<root>.0`, `<root>.1`, ...,
//! on behalf of a fixed group of cooperating members that read in lock-step.
//!
//! Each read call resolves the requested item range against the chunk
//! table, then walks the chunks in order. For each chunk the group agrees,
//! through a max-reduce, whether any member needs data from it: chunks no
//! member needs are never opened. The shared cursor is advanced to the
//! furthest position reached by any member.
//!
//! Files are read through positional `pread`-style calls. On storage that
//! cannot take concurrent access to one file, members take turns separated
//! by barriers ([`AccessMode::Serialized`]); otherwise they read
//! concurrently ([`AccessMode::Parallel`]).
//!
//! ## Reading
//!
//! ```ignore
//! use par_chunk_io::{run_in_threads, ChunkedFileHandle, ChunkedReader, ReadConfig, ReadError};
//!
//! let table = par_chunk_io::write_chunked(root, 4, &bytes, 1000, &header)?;
//! let results = run_in_threads(4, |member| {
//!     let reader = ChunkedReader::new(member, ReadConfig::default());
//!     let mut handle = ChunkedFileHandle::open(root, 4, table.clone())?;
//!     let mut buffer = vec![0_u8; 250 * 4];
//!     let items = reader.read(&mut handle, &mut buffer, 0, 250)?;
//!     Ok::<_, ReadError>(items)
//! });
//! ```
//!
//! ## Writing
//! [`write_chunked`] splits an in-memory array into chunk files and returns
//! the matching [`ChunkTable`].
pub mod access;
pub mod config;
pub mod group;
pub mod handle;
mod io;
pub mod read;
pub mod resolve;
pub mod table;
pub mod write;

pub use access::{ChunkFileAccess, ParallelFileAccess, SerializedFileAccess};
pub use config::{AccessMode, ReadConfig};
pub use group::{
    run_in_threads, thread_group, CollectiveGroup, ReduceTag, SoloGroup, ThreadMember,
};
pub use handle::{chunk_path, ChunkedFileHandle};
pub use read::{read_chunked, ChunkedReader, ReadError};
pub use resolve::{resolve, ChunkSlice, Resolution};
pub use table::{ChunkDescriptor, ChunkTable};
pub use write::{write_chunked, WriteError};
