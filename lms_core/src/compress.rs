use crate::error::{Error, Result};

/// Leading byte of an LZ11 whole-file envelope.
pub const LZ11_MARKER: u8 = 0x11;

/// Compression level used when re-sealing an envelope.
pub const DEFAULT_LEVEL: i32 = 6;

/// Error type surfaced by a compression collaborator.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// The external LZ11 collaborator: a pure byte-in/byte-out pair.
///
/// The library never implements the codec itself. Callers hand one in
/// at the archive boundary; the bundled `Passthrough` from
/// `lms_codecs` serves workflows whose containers were never
/// compressed.
pub trait Lz11Codec {
    fn decompress(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CodecError>;

    fn compress(&self, data: &[u8], level: i32) -> std::result::Result<Vec<u8>, CodecError>;
}

/// Whether a whole-file blob carries the LZ11 envelope.
pub fn is_compressed(data: &[u8]) -> bool {
    data.first() == Some(&LZ11_MARKER)
}

/// Strip the optional envelope. Returns the payload and whether the
/// envelope was present, so emission can re-seal it the same way.
pub fn unwrap(data: &[u8], codec: &dyn Lz11Codec) -> Result<(Vec<u8>, bool)> {
    if is_compressed(data) {
        let payload = codec
            .decompress(data)
            .map_err(|e| Error::Codec(e.to_string()))?;
        Ok((payload, true))
    } else {
        Ok((data.to_vec(), false))
    }
}

/// Re-seal a payload in its original envelope state.
pub fn wrap(data: Vec<u8>, compressed: bool, codec: &dyn Lz11Codec) -> Result<Vec<u8>> {
    if compressed {
        codec
            .compress(&data, DEFAULT_LEVEL)
            .map_err(|e| Error::Codec(e.to_string()))
    } else {
        Ok(data)
    }
}
