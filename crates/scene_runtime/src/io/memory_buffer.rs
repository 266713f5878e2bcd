//! Read-only stream over borrowed memory

use super::stream::{Stream, StreamError};

/// Positioned read-only view over a borrowed byte slice.
///
/// Useful for deserializing from memory that is owned elsewhere, without
/// copying it into a [`super::VectorBuffer`].
#[derive(Debug)]
pub struct MemoryBuffer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> MemoryBuffer<'a> {
    /// Construct over a byte slice, positioned at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }
}

impl Stream for MemoryBuffer<'_> {
    fn read(&mut self, dest: &mut [u8]) -> Result<usize, StreamError> {
        let available = self.data.len().saturating_sub(self.position);
        let count = dest.len().min(available);
        dest[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }

    fn write(&mut self, _data: &[u8]) -> Result<usize, StreamError> {
        Err(StreamError::NotWritable)
    }

    fn seek(&mut self, position: usize) -> Result<usize, StreamError> {
        self.position = position.min(self.data.len());
        Ok(self.position)
    }

    fn position(&self) -> usize {
        self.position
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }
}
