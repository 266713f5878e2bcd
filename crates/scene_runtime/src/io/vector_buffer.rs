//! Growable in-memory stream

use super::stream::{Stream, StreamError};

/// Dynamically sized buffer that can be read and written as a stream.
#[derive(Debug, Clone, Default)]
pub struct VectorBuffer {
    data: Vec<u8>,
    position: usize,
}

impl VectorBuffer {
    /// Construct an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from existing data, positioned at the start.
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// The buffer contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its contents.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Remove all contents and reset the position.
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }
}

impl Stream for VectorBuffer {
    fn read(&mut self, dest: &mut [u8]) -> Result<usize, StreamError> {
        let available = self.data.len().saturating_sub(self.position);
        let count = dest.len().min(available);
        dest[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        let overlap = self.data.len().saturating_sub(self.position).min(data.len());
        self.data[self.position..self.position + overlap].copy_from_slice(&data[..overlap]);
        self.data.extend_from_slice(&data[overlap..]);
        self.position += data.len();
        Ok(data.len())
    }

    fn seek(&mut self, position: usize) -> Result<usize, StreamError> {
        // Clamp to the current size.
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
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_round_trip() {
        let mut buffer = VectorBuffer::new();
        buffer.write_u8(0xAB).unwrap();
        buffer.write_i32(-123_456).unwrap();
        buffer.write_u32(0xDEAD_BEEF).unwrap();
        buffer.write_f32(1.25).unwrap();
        buffer.write_f64(-0.5).unwrap();
        buffer.write_bool(true).unwrap();
        buffer.write_i64(i64::MIN).unwrap();

        buffer.seek(0).unwrap();
        assert_eq!(buffer.read_u8().unwrap(), 0xAB);
        assert_eq!(buffer.read_i32().unwrap(), -123_456);
        assert_eq!(buffer.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(buffer.read_f32().unwrap(), 1.25);
        assert_eq!(buffer.read_f64().unwrap(), -0.5);
        assert!(buffer.read_bool().unwrap());
        assert_eq!(buffer.read_i64().unwrap(), i64::MIN);
        assert!(buffer.is_eof());
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buffer = VectorBuffer::new();
        buffer.write_u32(0x0102_0304).unwrap();
        assert_eq!(buffer.data(), &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_vle_boundaries() {
        let values = [
            (0u32, 1usize),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (0x1F_FFFF, 3),
            (0x20_0000, 4),
            (0x0FFF_FFFF, 4),
        ];
        for (value, expected_len) in values {
            let mut buffer = VectorBuffer::new();
            buffer.write_vle(value).unwrap();
            assert_eq!(buffer.size(), expected_len, "encoded length of {value:#x}");
            buffer.seek(0).unwrap();
            assert_eq!(buffer.read_vle().unwrap(), value);
        }
    }

    #[test]
    fn test_string_round_trip() {
        let mut buffer = VectorBuffer::new();
        buffer.write_string("Hello").unwrap();
        buffer.write_string("").unwrap();
        buffer.write_string("päivää ✨").unwrap();

        buffer.seek(0).unwrap();
        assert_eq!(buffer.read_string().unwrap(), "Hello");
        assert_eq!(buffer.read_string().unwrap(), "");
        assert_eq!(buffer.read_string().unwrap(), "päivää ✨");
    }

    #[test]
    fn test_string_without_terminator_stops_at_eof() {
        let mut buffer = VectorBuffer::from_data(b"abc".to_vec());
        assert_eq!(buffer.read_string().unwrap(), "abc");
        assert!(buffer.is_eof());
    }

    #[test]
    fn test_buffer_round_trip() {
        let mut buffer = VectorBuffer::new();
        buffer.write_buffer(&[1, 2, 3, 4, 5]).unwrap();
        buffer.write_buffer(&[]).unwrap();

        buffer.seek(0).unwrap();
        assert_eq!(buffer.read_buffer().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(buffer.read_buffer().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_file_id_round_trip() {
        let mut buffer = VectorBuffer::new();
        buffer.write_file_id("SCNE").unwrap();
        buffer.write_file_id("AB").unwrap();

        buffer.seek(0).unwrap();
        assert_eq!(buffer.read_file_id().unwrap(), "SCNE");
        assert_eq!(buffer.read_file_id().unwrap(), "AB  ");
    }

    #[test]
    fn test_read_past_end() {
        let mut buffer = VectorBuffer::from_data(vec![1, 2]);
        assert!(matches!(buffer.read_u32(), Err(StreamError::UnexpectedEof)));
    }

    #[test]
    fn test_seek_clamps() {
        let mut buffer = VectorBuffer::from_data(vec![0; 8]);
        assert_eq!(buffer.seek(100).unwrap(), 8);
        assert!(buffer.is_eof());
        assert_eq!(buffer.seek(4).unwrap(), 4);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut buffer = VectorBuffer::from_data(vec![0; 4]);
        buffer.write_u16(0xFFFF).unwrap();
        buffer.write_u32(0x0102_0304).unwrap();
        assert_eq!(buffer.size(), 6);
        assert_eq!(buffer.data(), &[0xFF, 0xFF, 0x04, 0x03, 0x02, 0x01]);
    }
}
