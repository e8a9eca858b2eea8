use lms_core::compress::{CodecError, Lz11Codec};

/// No-op collaborator: hands payloads through unchanged.
///
/// Serves workflows whose containers were never compressed, and the
/// round-trip tests that exercise the envelope plumbing without a
/// real LZ11 implementation.
pub struct Passthrough;

impl Lz11Codec for Passthrough {
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn compress(&self, data: &[u8], _level: i32) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }
}
