//! Big-endian cursor over a byte slice
//!
//! Reads the primitive encodings of Java's `DataInput`, which is what the
//! TZDB compiler writes with. Every read checks the remaining length first,
//! so a truncated stream surfaces as [`PayloadError::UnexpectedEof`] instead
//! of a panic.

use bytes::Buf;

use crate::error::PayloadError;

type Result<T> = std::result::Result<T, PayloadError>;

/// Cursor over a borrowed buffer
#[derive(Debug, Clone)]
pub struct DataReader<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.len - self.buf.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(PayloadError::UnexpectedEof {
                offset: self.position(),
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    /// Borrow the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read a `writeUTF` string: u16 byte length followed by the text.
    ///
    /// Only standard UTF-8 is accepted; the modified encodings Java uses
    /// for NUL and supplementary characters never occur in zone ids.
    pub fn read_utf(&mut self) -> Result<&'a str> {
        let len = self.read_u16()? as usize;
        let offset = self.position();
        let raw = self.read_bytes(len)?;
        std::str::from_utf8(raw).map_err(|_| PayloadError::InvalidUtf8 { offset })
    }

    /// Read a non-negative `i32` element count
    pub fn read_count_i32(&mut self, field: &'static str) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| PayloadError::NegativeCount {
            field,
            count: count.into(),
        })
    }

    /// Read a non-negative `i16` element count
    pub fn read_count_i16(&mut self, field: &'static str) -> Result<usize> {
        let count = self.read_i16()?;
        usize::try_from(count).map_err(|_| PayloadError::NegativeCount {
            field,
            count: count.into(),
        })
    }

    /// Read a non-negative `i8` element count
    pub fn read_count_i8(&mut self, field: &'static str) -> Result<usize> {
        let count = self.read_i8()?;
        usize::try_from(count).map_err(|_| PayloadError::NegativeCount {
            field,
            count: count.into(),
        })
    }

    /// Consume the reader, failing if anything is left unread
    pub fn finish(self) -> Result<()> {
        match self.buf.remaining() {
            0 => Ok(()),
            count => Err(PayloadError::TrailingBytes { count }),
        }
    }
}
