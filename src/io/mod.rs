//! Read/write data at offset from/to chunk files, conditionally including
//! UNIX/Windows implementations.
#[cfg(unix)]
mod io_at_unix;
#[cfg(unix)]
pub use io_at_unix::{read_bytes_at, write_bytes_at};

#[cfg(windows)]
mod io_at_windows;
#[cfg(windows)]
pub use io_at_windows::{read_bytes_at, write_bytes_at};
