use std::fmt;

use log::debug;

use crate::blocks::{self, Block, HashTableBlock, TagIndexBlock, TagParamsBlock, TextBlock};
use crate::endian::{ByteOrder, TextEncoding};
use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::writer::Writer;

const VERSION: u8 = 3;
/// Byte offset of the file-size field, patched after emission.
const FILE_SIZE_AT: usize = 18;
const BLOCK_ALIGN: usize = 16;
/// Fill byte between blocks. Parsers accept any fill.
const BLOCK_FILL: u8 = 0xAB;

/// Four-character ASCII tag identifying a block type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockTag(pub [u8; 4]);

impl BlockTag {
    pub const CLR1: BlockTag = BlockTag(*b"CLR1");
    pub const CLB1: BlockTag = BlockTag(*b"CLB1");
    pub const ATI2: BlockTag = BlockTag(*b"ATI2");
    pub const ALB1: BlockTag = BlockTag(*b"ALB1");
    pub const ALI2: BlockTag = BlockTag(*b"ALI2");
    pub const TGG2: BlockTag = BlockTag(*b"TGG2");
    pub const TAG2: BlockTag = BlockTag(*b"TAG2");
    pub const TGP2: BlockTag = BlockTag(*b"TGP2");
    pub const TGL2: BlockTag = BlockTag(*b"TGL2");
    pub const SYL3: BlockTag = BlockTag(*b"SYL3");
    pub const SLB1: BlockTag = BlockTag(*b"SLB1");
    pub const CTI1: BlockTag = BlockTag(*b"CTI1");
    pub const LBL1: BlockTag = BlockTag(*b"LBL1");
    pub const ATR1: BlockTag = BlockTag(*b"ATR1");
    pub const TXT2: BlockTag = BlockTag(*b"TXT2");
    pub const FLW3: BlockTag = BlockTag(*b"FLW3");
    pub const FEN1: BlockTag = BlockTag(*b"FEN1");

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockTag").field(&self.as_str()).finish()
    }
}

/// The three message-studio file kinds, distinguished by header magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsfKind {
    Project,
    Standard,
    Flow,
}

impl MsfKind {
    pub fn magic(self) -> &'static [u8; 8] {
        match self {
            MsfKind::Project => b"MsgPrjBn",
            MsfKind::Standard => b"MsgStdBn",
            MsfKind::Flow => b"MsgFlwBn",
        }
    }

    pub fn from_magic(magic: &[u8; 8]) -> Option<MsfKind> {
        [MsfKind::Project, MsfKind::Standard, MsfKind::Flow]
            .into_iter()
            .find(|k| k.magic() == magic)
    }
}

/// Byte order and text encoding shared by every block codec in a
/// file. Flows on the stack; blocks themselves hold only values.
#[derive(Debug, Clone, Copy)]
pub struct BlockCtx {
    pub order: ByteOrder,
    pub encoding: TextEncoding,
}

impl BlockCtx {
    /// Read a NUL-terminated string in the file encoding.
    pub fn read_str(&self, r: &mut Reader<'_>) -> Result<String> {
        match self.encoding {
            TextEncoding::Utf8 => {
                let mut bytes = Vec::new();
                loop {
                    let b = r.u8()?;
                    if b == 0 {
                        break;
                    }
                    bytes.push(b);
                }
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            TextEncoding::Utf16 => {
                let mut units = Vec::new();
                loop {
                    let u = r.u16()?;
                    if u == 0 {
                        break;
                    }
                    units.push(u);
                }
                Ok(String::from_utf16_lossy(&units))
            }
            TextEncoding::Utf32 => {
                let mut s = String::new();
                loop {
                    let u = r.u32()?;
                    if u == 0 {
                        break;
                    }
                    s.push(char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                Ok(s)
            }
        }
    }

    /// Write a string plus the encoding's NUL terminator.
    pub fn write_str(&self, w: &mut Writer, s: &str) {
        match self.encoding {
            TextEncoding::Utf8 => {
                w.bytes(s.as_bytes());
                w.u8(0);
            }
            TextEncoding::Utf16 => {
                for u in s.encode_utf16() {
                    w.u16(u);
                }
                w.u16(0);
            }
            TextEncoding::Utf32 => {
                for c in s.chars() {
                    w.u32(c as u32);
                }
                w.u32(0);
            }
        }
    }
}

/// A parsed message-studio file: header fields plus an ordered
/// sequence of typed blocks. Block order is preserved on emit.
#[derive(Debug, Clone, PartialEq)]
pub struct MsfFile {
    kind: MsfKind,
    order: ByteOrder,
    encoding: TextEncoding,
    blocks: Vec<(BlockTag, Block)>,
}

impl MsfFile {
    pub fn new(kind: MsfKind, order: ByteOrder, encoding: TextEncoding) -> MsfFile {
        MsfFile {
            kind,
            order,
            encoding,
            blocks: Vec::new(),
        }
    }

    pub fn kind(&self) -> MsfKind {
        self.kind
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn ctx(&self) -> BlockCtx {
        BlockCtx {
            order: self.order,
            encoding: self.encoding,
        }
    }

    pub fn blocks(&self) -> &[(BlockTag, Block)] {
        &self.blocks
    }

    pub fn block(&self, tag: BlockTag) -> Option<&Block> {
        self.blocks.iter().find(|(t, _)| *t == tag).map(|(_, b)| b)
    }

    pub fn block_mut(&mut self, tag: BlockTag) -> Option<&mut Block> {
        self.blocks
            .iter_mut()
            .find(|(t, _)| *t == tag)
            .map(|(_, b)| b)
    }

    /// Append a block. Emission preserves insertion order.
    pub fn push_block(&mut self, tag: BlockTag, block: Block) {
        self.blocks.push((tag, block));
    }

    /// The label hash table (`LBL1` / `FEN1`), if present.
    pub fn labels(&self) -> Option<&HashTableBlock> {
        match self
            .block(BlockTag::LBL1)
            .or_else(|| self.block(BlockTag::FEN1))
        {
            Some(Block::Labels(t)) => Some(t),
            _ => None,
        }
    }

    /// The `TXT2` message block, if present.
    pub fn text(&self) -> Option<&TextBlock> {
        match self.block(BlockTag::TXT2) {
            Some(Block::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn tag_groups(&self) -> Option<&TagIndexBlock> {
        match self.block(BlockTag::TGG2) {
            Some(Block::TagGroups(b)) => Some(b),
            _ => None,
        }
    }

    pub fn tags(&self) -> Option<&TagIndexBlock> {
        match self.block(BlockTag::TAG2) {
            Some(Block::Tags(b)) => Some(b),
            _ => None,
        }
    }

    pub fn tag_params(&self) -> Option<&TagParamsBlock> {
        match self.block(BlockTag::TGP2) {
            Some(Block::TagParams(b)) => Some(b),
            _ => None,
        }
    }

    /// Parse any of the three file kinds; the kind is taken from the
    /// header magic.
    pub fn parse(data: &[u8]) -> Result<MsfFile> {
        let mut r = Reader::new(data, ByteOrder::Little);

        let magic = r.array::<8>()?;
        let kind = MsfKind::from_magic(&magic).ok_or(Error::BadMagic {
            expected: "MsgPrjBn/MsgStdBn/MsgFlwBn",
            found: magic.to_vec(),
        })?;
        let order = ByteOrder::from_bom(r.array::<2>()?)?;
        r.set_order(order);

        r.skip(2)?;
        let encoding_code = r.u8()?;
        let version = r.u8()?;
        if version != VERSION {
            return Err(Error::BadVersion(version as u32));
        }
        let encoding = TextEncoding::from_code(encoding_code)?;
        let block_count = r.u16()?;
        r.skip(2)?;
        let _file_size = r.u32()?;
        r.skip(10)?;

        let ctx = BlockCtx { order, encoding };
        let mut blocks = Vec::new();
        for _ in 0..block_count {
            let tag = BlockTag(r.array::<4>()?);
            let size = r.u32()?;
            r.skip(8)?;
            let body = r.bytes(size as usize)?;
            debug!("{:?}: {} block, {} bytes", kind, tag, size);
            blocks.push((tag, blocks::parse(kind, tag, body, &ctx)?));
            r.align(BLOCK_ALIGN);
        }

        Ok(MsfFile {
            kind,
            order,
            encoding,
            blocks,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new(self.order);
        w.bytes(self.kind.magic());
        w.bytes(&self.order.bom());
        w.zeros(2);
        w.u8(self.encoding.code());
        w.u8(VERSION);
        w.u16(self.blocks.len() as u16);
        w.zeros(2);
        w.u32(0); // file size, patched below
        w.zeros(10);

        let ctx = self.ctx();
        for (tag, block) in &self.blocks {
            let body = blocks::emit(block, &ctx);
            w.bytes(&tag.0);
            w.u32(body.len() as u32);
            w.zeros(8);
            w.bytes(&body);
            w.align(BLOCK_ALIGN, BLOCK_FILL);
        }

        let total = w.pos() as u32;
        w.patch_u32(FILE_SIZE_AT, total);
        w.into_bytes()
    }
}
