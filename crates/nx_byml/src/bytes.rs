//! Bounds checked, byte order aware access to document buffers.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::format::{Endianness, MAX_COUNT};

/// Random access reads from a document buffer
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    endianness: Endianness,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        ByteReader { data, endianness }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Borrow `length` bytes starting at `offset`
    pub fn slice(&self, offset: usize, length: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(length)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(Error::TruncatedInput { offset, length })
    }

    /// Borrow the bytes from `offset` up to, not including, the next NUL
    pub fn null_terminated(&self, offset: usize) -> Result<&'a [u8]> {
        let rest = self.data.get(offset..).ok_or(Error::TruncatedInput {
            offset,
            length: 1,
        })?;
        let end = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(Error::TruncatedInput {
                offset,
                length: rest.len() + 1,
            })?;
        Ok(&rest[..end])
    }

    pub fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn u24(&self, offset: usize) -> Result<u32> {
        let bytes = self.slice(offset, 3)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u24(bytes),
            Endianness::Little => LittleEndian::read_u24(bytes),
        })
    }

    pub fn u32(&self, offset: usize) -> Result<u32> {
        let bytes = self.slice(offset, 4)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u32(bytes),
            Endianness::Little => LittleEndian::read_u32(bytes),
        })
    }

    pub fn f32(&self, offset: usize) -> Result<f32> {
        let bytes = self.slice(offset, 4)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_f32(bytes),
            Endianness::Little => LittleEndian::read_f32(bytes),
        })
    }

    pub fn u64(&self, offset: usize) -> Result<u64> {
        let bytes = self.slice(offset, 8)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u64(bytes),
            Endianness::Little => LittleEndian::read_u64(bytes),
        })
    }

    pub fn f64(&self, offset: usize) -> Result<f64> {
        let bytes = self.slice(offset, 8)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_f64(bytes),
            Endianness::Little => LittleEndian::read_f64(bytes),
        })
    }
}

/// Append only buffer with back patching of previously written words
#[derive(Debug)]
pub(crate) struct ByteWriter {
    buffer: Vec<u8>,
    endianness: Endianness,
}

impl ByteWriter {
    pub fn new(endianness: Endianness) -> Self {
        ByteWriter {
            buffer: Vec::new(),
            endianness,
        }
    }

    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Pad with zeros up to the next multiple of `alignment`
    pub fn align(&mut self, alignment: usize) {
        let aligned = self.buffer.len().next_multiple_of(alignment);
        self.buffer.resize(aligned, 0);
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Write a 24 bit count, failing if it does not fit
    pub fn u24(&mut self, value: usize) -> Result<()> {
        if value > MAX_COUNT {
            return Err(Error::ContainerTooLarge { len: value });
        }
        let value = value as u32;
        match self.endianness {
            Endianness::Big => self.buffer.write_u24::<BigEndian>(value)?,
            Endianness::Little => self.buffer.write_u24::<LittleEndian>(value)?,
        }
        Ok(())
    }

    pub fn u32(&mut self, value: u32) -> Result<()> {
        match self.endianness {
            Endianness::Big => self.buffer.write_u32::<BigEndian>(value)?,
            Endianness::Little => self.buffer.write_u32::<LittleEndian>(value)?,
        }
        Ok(())
    }

    pub fn u64(&mut self, value: u64) -> Result<()> {
        match self.endianness {
            Endianness::Big => self.buffer.write_u64::<BigEndian>(value)?,
            Endianness::Little => self.buffer.write_u64::<LittleEndian>(value)?,
        }
        Ok(())
    }

    /// Overwrite a word written earlier
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        let slot = &mut self.buffer[at..at + 4];
        match self.endianness {
            Endianness::Big => BigEndian::write_u32(slot, value),
            Endianness::Little => LittleEndian::write_u32(slot, value),
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Convert a buffer position into a stored offset
pub(crate) fn to_offset(position: usize) -> Result<u32> {
    u32::try_from(position).map_err(|_| Error::ContainerTooLarge { len: position })
}
