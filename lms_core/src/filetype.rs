use crate::compress::LZ11_MARKER;
use crate::darc;
use crate::msf::MsfKind;

/// File kinds recognized by the prefix sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// LZ11-compressed envelope (leading byte `0x11`).
    Lz11,
    /// `darc` archive container.
    Archive,
    /// `MsgStdBn` standard message file.
    Standard,
    /// `MsgPrjBn` project file.
    Project,
    /// `MsgFlwBn` flow file.
    Flow,
    Unknown,
}

impl FileType {
    /// Classify a whole-file blob by its leading bytes.
    ///
    /// The `0x11` envelope check comes first: a compressed payload may
    /// happen to resemble any of the magics.
    pub fn sniff(data: &[u8]) -> FileType {
        if data.first() == Some(&LZ11_MARKER) {
            return FileType::Lz11;
        }
        if data.starts_with(darc::MAGIC) {
            return FileType::Archive;
        }
        if data.starts_with(MsfKind::Standard.magic()) {
            return FileType::Standard;
        }
        if data.starts_with(MsfKind::Project.magic()) {
            return FileType::Project;
        }
        if data.starts_with(MsfKind::Flow.magic()) {
            return FileType::Flow;
        }
        FileType::Unknown
    }
}
