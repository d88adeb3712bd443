//! ISO-8859-1 output sink.
//!
//! ODV reads 8-bit text. Characters outside Latin-1 are replaced by `?`.

use crate::error::Result;
use std::io::Write;

/// Byte sink that encodes text as Latin-1
#[derive(Debug)]
pub struct Latin1Writer<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    bytes_written: u64,
}

impl<W: Write> Latin1Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            bytes_written: 0,
        }
    }

    /// Encode and write `text`
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.buffer.clear();
        self.buffer.extend(text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')));
        self.inner.write_all(&self.buffer)?;
        self.bytes_written += self.buffer.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
