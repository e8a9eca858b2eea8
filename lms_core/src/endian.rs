use crate::error::{Error, Result};

pub const BOM_LITTLE: [u8; 2] = [0xFF, 0xFE];
pub const BOM_BIG: [u8; 2] = [0xFE, 0xFF];

/// Byte order of a single file, classified from its BOM at parse time
/// and carried along as a plain value. There is no process-wide
/// endianness state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn from_bom(bom: [u8; 2]) -> Result<ByteOrder> {
        match bom {
            BOM_LITTLE => Ok(ByteOrder::Little),
            BOM_BIG => Ok(ByteOrder::Big),
            other => Err(Error::BadBom(other)),
        }
    }

    pub fn bom(self) -> [u8; 2] {
        match self {
            ByteOrder::Little => BOM_LITTLE,
            ByteOrder::Big => BOM_BIG,
        }
    }

    pub fn u16_bytes(self, v: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }

    pub fn u32_bytes(self, v: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }

    pub fn i32_bytes(self, v: i32) -> [u8; 4] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }

    pub fn u16_from(self, b: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        }
    }

    pub fn u32_from(self, b: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        }
    }

    pub fn i32_from(self, b: [u8; 4]) -> i32 {
        match self {
            ByteOrder::Little => i32::from_le_bytes(b),
            ByteOrder::Big => i32::from_be_bytes(b),
        }
    }
}

/// Text encoding of a message-studio file. The wire code selects the
/// width; the concrete UTF-16/UTF-32 flavor follows the file's
/// [`ByteOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16,
    Utf32,
}

impl TextEncoding {
    pub fn from_code(code: u8) -> Result<TextEncoding> {
        match code {
            0 => Ok(TextEncoding::Utf8),
            1 => Ok(TextEncoding::Utf16),
            2 => Ok(TextEncoding::Utf32),
            other => Err(Error::BadEncoding(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            TextEncoding::Utf8 => 0,
            TextEncoding::Utf16 => 1,
            TextEncoding::Utf32 => 2,
        }
    }

    /// Width of one code unit in bytes.
    pub fn unit_width(self) -> usize {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16 => 2,
            TextEncoding::Utf32 => 4,
        }
    }
}
