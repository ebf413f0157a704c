//! Functions to read/write from/to files at specified offset wrapping
//! `pread`/`pwrite`.
use crate::read::ReadError;
use crate::write::WriteError;
use std::fs::File;
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;

//-----------------------------------------------------------------------------
/// Fill `buffer` with bytes read from `file` starting at `offset`.
/// Running out of file before the buffer is full is an error.
pub fn read_bytes_at(buffer: &mut [u8], file: &File, mut offset: u64) -> Result<(), ReadError> {
    let mut data_read = 0;
    while data_read < buffer.len() {
        match file.read_at(&mut buffer[data_read..], offset) {
            Ok(0) => {
                return Err(ReadError::IO(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("chunk file ends at offset {}", offset),
                )))
            }
            Ok(n) => {
                data_read += n;
                offset += n as u64;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ReadError::IO(err)),
        }
    }
    Ok(())
}

//-----------------------------------------------------------------------------
/// Write all of `buffer` to `file` starting at `offset`.
pub fn write_bytes_at(buffer: &[u8], file: &File, mut offset: u64) -> Result<(), WriteError> {
    let mut written = 0;
    while written < buffer.len() {
        match file.write_at(&buffer[written..], offset) {
            Ok(0) => {
                return Err(WriteError::IO(std::io::Error::new(
                    ErrorKind::WriteZero,
                    format!("cannot write at offset {}", offset),
                )))
            }
            Ok(n) => {
                written += n;
                offset += n as u64;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(WriteError::IO(err)),
        }
    }
    Ok(())
}
