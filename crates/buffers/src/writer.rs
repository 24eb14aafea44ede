//! Binary buffer writer with auto-growing capacity.

/// A binary buffer writer that grows automatically as bytes are appended.
///
/// Multi-byte integers are written big-endian, which is the byte order of
/// every length and value field in the formats this workspace emits.
///
/// # Example
///
/// ```
/// use formpack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x02, 0x03]);
/// ```
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a writer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last flush/reset.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written since the last flush/reset.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View of the bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Discards all written bytes, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Reserves room for at least `additional` more bytes.
    pub fn ensure_capacity(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    /// Returns the written bytes and leaves the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Consumes the writer, returning the written bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.buf.push(val as u8);
    }

    /// Writes an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 16-bit integer (big-endian).
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 32-bit integer (big-endian).
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a signed 64-bit integer (big-endian).
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 32-bit floating point number (big-endian).
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a 64-bit floating point number (big-endian).
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes two consecutive u8 values.
    pub fn u8u8(&mut self, first: u8, second: u8) {
        self.buf.push(first);
        self.buf.push(second);
    }

    /// Writes a u8 followed by a u16 (big-endian).
    pub fn u8u16(&mut self, u8_val: u8, u16_val: u16) {
        self.buf.push(u8_val);
        self.buf.extend_from_slice(&u16_val.to_be_bytes());
    }

    /// Writes a u8 followed by a u32 (big-endian).
    pub fn u8u32(&mut self, u8_val: u8, u32_val: u32) {
        self.buf.push(u8_val);
        self.buf.extend_from_slice(&u32_val.to_be_bytes());
    }

    /// Writes a u8 followed by a u64 (big-endian).
    pub fn u8u64(&mut self, u8_val: u8, u64_val: u64) {
        self.buf.push(u8_val);
        self.buf.extend_from_slice(&u64_val.to_be_bytes());
    }

    /// Writes a u8 followed by a f32 (big-endian).
    pub fn u8f32(&mut self, u8_val: u8, f32_val: f32) {
        self.buf.push(u8_val);
        self.buf.extend_from_slice(&f32_val.to_be_bytes());
    }

    /// Writes a u8 followed by a f64 (big-endian).
    pub fn u8f64(&mut self, u8_val: u8, f64_val: f64) {
        self.buf.push(u8_val);
        self.buf.extend_from_slice(&f64_val.to_be_bytes());
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a string known to be ASCII byte-for-byte.
    pub fn ascii(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        let bytes = s.as_bytes();
        self.buf.extend_from_slice(bytes);
        bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Writer;

    #[test]
    fn writes_big_endian_integers() {
        let mut writer = Writer::new();
        writer.u16(0x0102);
        writer.u32(0x0304_0506);
        writer.u64(0x0708_090a_0b0c_0d0e);
        assert_eq!(
            writer.flush(),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e]
        );
    }

    #[test]
    fn writes_floats_big_endian() {
        let mut writer = Writer::new();
        writer.f32(1.5);
        assert_eq!(writer.flush(), 1.5f32.to_be_bytes());
        writer.f64(-2.25);
        assert_eq!(writer.flush(), (-2.25f64).to_be_bytes());
    }

    #[test]
    fn combined_writes_match_sequential() {
        let mut a = Writer::new();
        a.u8u16(0xda, 0x0010);
        a.u8u32(0xdb, 7);
        let mut b = Writer::new();
        b.u8(0xda);
        b.u16(0x0010);
        b.u8(0xdb);
        b.u32(7);
        assert_eq!(a.flush(), b.flush());
    }

    #[test]
    fn flush_empties_the_writer() {
        let mut writer = Writer::new();
        writer.ascii("abc");
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.flush(), b"abc");
        assert!(writer.is_empty());
    }

    #[test]
    fn utf8_reports_byte_count() {
        let mut writer = Writer::new();
        let n = writer.utf8("héllo");
        assert_eq!(n, 6);
        assert_eq!(writer.as_slice(), "héllo".as_bytes());
    }
}
