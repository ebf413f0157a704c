use crate::read::ReadError;
use crate::write::WriteError;
use std::fs::File;
use std::io::ErrorKind;
use std::os::windows::fs::FileExt;

pub fn read_bytes_at(buffer: &mut [u8], file: &File, mut offset: u64) -> Result<(), ReadError> {
    let mut data_read = 0;
    while data_read < buffer.len() {
        let n = file
            .seek_read(&mut buffer[data_read..], offset)
            .map_err(ReadError::IO)?;
        if n == 0 {
            return Err(ReadError::IO(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("chunk file ends at offset {}", offset),
            )));
        }
        data_read += n;
        offset += n as u64;
    }
    Ok(())
}

pub fn write_bytes_at(buffer: &[u8], file: &File, mut offset: u64) -> Result<(), WriteError> {
    let mut written = 0;
    while written < buffer.len() {
        let n = file
            .seek_write(&buffer[written..], offset)
            .map_err(WriteError::IO)?;
        if n == 0 {
            return Err(WriteError::IO(std::io::Error::new(
                ErrorKind::WriteZero,
                format!("cannot write at offset {}", offset),
            )));
        }
        written += n;
        offset += n as u64;
    }
    Ok(())
}
