use crate::msf::BlockTag;

pub type Result<T> = std::result::Result<T, Error>;

/// Codec and bundle-assembly errors.
///
/// Parse and emit failures bubble to the outermost call unchanged;
/// there is no retry and no partial success. The bundle is the one
/// component that degrades instead of failing: an unresolvable control
/// record is logged as [`Error::UnresolvedTagRef`] and kept with its
/// raw indices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Header magic mismatch.
    #[error("invalid magic: expected {expected}, got {found:02X?}")]
    BadMagic {
        expected: &'static str,
        found: Vec<u8>,
    },

    /// Byte-order mark is neither `FF FE` nor `FE FF`.
    #[error("invalid byte-order mark {0:02X?}")]
    BadBom([u8; 2]),

    /// Unsupported container or message-file version.
    #[error("unsupported format version {0:#010x}")]
    BadVersion(u32),

    /// Text encoding code outside {0, 1, 2}.
    #[error("invalid text encoding code {0}")]
    BadEncoding(u8),

    /// A read ran past the end of the input buffer.
    #[error("truncated input: {needed} bytes requested at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Block tag absent from the file kind's dispatch table.
    #[error("unknown block tag {0}")]
    UnknownBlockTag(BlockTag),

    /// A control record's indices do not resolve against the project
    /// tables. Non-fatal: the bundle keeps the record raw.
    #[error("unresolved tag reference (group {group}, tag {tag})")]
    UnresolvedTagRef { group: u16, tag: u16 },

    /// Bundle assembly did not find exactly one `.msbp` entry.
    #[error("archive does not contain exactly one .msbp project file")]
    MissingProject,

    /// Failure reported by the external compression collaborator.
    #[error("compression collaborator failed: {0}")]
    Codec(String),
}
