use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Invalid size: needs {needed} bytes at offset {offset}, only {available} left")]
    InvalidSize {
        needed: usize,
        available: usize,
        offset: usize,
    },
    #[error("Invalid value")]
    InvalidValue,
}

// Bounded cursor over a byte slice
// Reads never go past the end of the slice: an overrun is reported as an error
pub struct Reader<'a> {
    bytes: &'a [u8],
    total: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, total: 0 }
    }

    pub fn read_bytes_ref(&mut self, n: usize) -> Result<&'a [u8], ReaderError> {
        let available = self.size();
        if n > available {
            return Err(ReaderError::InvalidSize {
                needed: n,
                available,
                offset: self.total,
            });
        }

        let slice = &self.bytes[self.total..self.total + n];
        self.total += n;
        Ok(slice)
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ReaderError> {
        let slice = self.read_bytes_ref(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(slice);
        Ok(bytes)
    }

    pub fn read_bytes_32(&mut self) -> Result<[u8; 32], ReaderError> {
        self.read_bytes::<32>()
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.read_bytes::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ReaderError> {
        Ok(i8::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        Ok(u16::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, ReaderError> {
        Ok(i16::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        Ok(u32::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ReaderError> {
        Ok(i32::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        Ok(u64::from_le_bytes(self.read_bytes()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, ReaderError> {
        Ok(i64::from_le_bytes(self.read_bytes()?))
    }

    // Any non-zero byte is read as true
    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        Ok(self.read_u8()? != 0)
    }

    // Bytes left to read
    pub fn size(&self) -> usize {
        self.bytes.len() - self.total
    }

    // Bytes already consumed
    pub fn total_read(&self) -> usize {
        self.total
    }

    // Length of the whole underlying slice
    pub fn total_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_advances_cursor() {
        let bytes = [0x40, 0x42, 0x0F, 0x00, 0x01];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_u32().unwrap(), 1_000_000);
        assert_eq!(reader.total_read(), 4);
        assert!(reader.read_bool().unwrap());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_overrun_is_reported_not_read() {
        let bytes = [1, 2, 3];
        let mut reader = Reader::new(&bytes);
        reader.read_u8().unwrap();
        let err = reader.read_u64().unwrap_err();
        assert_eq!(
            err,
            ReaderError::InvalidSize {
                needed: 8,
                available: 2,
                offset: 1
            }
        );
        // A failed read consumes nothing
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
    }
}
