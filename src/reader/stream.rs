//! Positioned little-endian reader over a byte source.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::error::Result;
use crate::reader::Source;

/// Cursor over one open handle to the backing source.
///
/// All primitive reads are little-endian and advance the cursor. A reader
/// is bound to a single source for its whole life; the pool never rebinds
/// one across stores.
#[derive(Debug)]
pub struct Reader {
    inner: Inner,
    /// Current absolute position, tracked here to avoid a syscall per query
    position: u64,
    /// Source length, cached for bounds checks
    source_len: u64,
}

#[derive(Debug)]
enum Inner {
    File(BufReader<File>),
    Memory(Bytes),
}

impl Reader {
    /// Open a new reader over the source
    pub(crate) fn open(source: &Source) -> Result<Self> {
        let inner = match source {
            Source::File { path, .. } => Inner::File(BufReader::new(File::open(path)?)),
            Source::Memory(buf) => Inner::Memory(buf.clone()),
        };
        Ok(Self {
            inner,
            position: 0,
            source_len: source.len(),
        })
    }

    /// Current absolute position in the source
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the source in bytes
    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    /// Seek to an absolute position
    pub fn seek(&mut self, position: u64) -> Result<()> {
        match &mut self.inner {
            // Absolute seek resyncs the OS cursor even if a previous read
            // failed partway and left it somewhere unexpected
            Inner::File(file) => {
                file.seek(SeekFrom::Start(position))?;
            }
            Inner::Memory(_) => {
                if position > self.source_len {
                    return Err(unexpected_eof(position, self.source_len).into());
                }
            }
        }
        self.position = position;
        Ok(())
    }

    /// Fill `buf` exactly from the current position
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match &mut self.inner {
            Inner::File(file) => file.read_exact(buf)?,
            Inner::Memory(bytes) => {
                let start = self.position as usize;
                let end = start + buf.len();
                if end as u64 > self.source_len {
                    return Err(unexpected_eof(end as u64, self.source_len).into());
                }
                buf.copy_from_slice(&bytes[start..end]);
            }
        }
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Read `n` bytes from the current position
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }
}

fn unexpected_eof(wanted: u64, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read past end of source: position {} of {}", wanted, len),
    )
}
