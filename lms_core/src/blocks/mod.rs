mod hash;
mod project;
mod text;

pub use hash::HashTableBlock;
pub use project::{
    AttrInfo, AttrInfoBlock, ColorsBlock, ItemListsBlock, NameListBlock, Rgba, SourceFilesBlock,
    StyleRecord, StylesBlock, TagIndexBlock, TagIndexEntry, TagParam, TagParamsBlock,
};
pub use text::{ControlTag, Message, OpaqueBlock, TextBlock, PLACEHOLDER};

use crate::error::{Error, Result};
use crate::msf::{BlockCtx, BlockTag, MsfKind};

/// A parsed block, keyed by its four-character tag.
///
/// One variant per known layout; several tags share a layout (all five
/// label tables are [`HashTableBlock`], and `TGG2`/`TAG2` differ only
/// in meaning).
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `CLR1` — ordered RGBA colors.
    Colors(ColorsBlock),
    /// `ATI2` — attribute descriptors.
    AttrInfo(AttrInfoBlock),
    /// `ALI2` — per-attribute item name lists.
    ItemLists(ItemListsBlock),
    /// `TGG2` — tag groups with member tag indices.
    TagGroups(TagIndexBlock),
    /// `TAG2` — tags with member parameter indices.
    Tags(TagIndexBlock),
    /// `TGP2` — tag parameter descriptors.
    TagParams(TagParamsBlock),
    /// `TGL2` — tag-parameter item names.
    TagList(NameListBlock),
    /// `SYL3` — style records.
    Styles(StylesBlock),
    /// `CTI1` — project source filenames.
    Sources(SourceFilesBlock),
    /// `LBL1` / `CLB1` / `ALB1` / `SLB1` / `FEN1` — label hash table.
    Labels(HashTableBlock),
    /// `TXT2` — messages.
    Text(TextBlock),
    /// `ATR1` / `FLW3` — layout not modeled; bytes kept verbatim.
    Opaque(OpaqueBlock),
}

/// Closed dispatch: each file kind accepts exactly its known tags.
pub(crate) fn parse(kind: MsfKind, tag: BlockTag, body: &[u8], ctx: &BlockCtx) -> Result<Block> {
    let block = match (kind, tag) {
        (MsfKind::Project, BlockTag::CLR1) => Block::Colors(ColorsBlock::from_bytes(body, ctx)?),
        (MsfKind::Project, BlockTag::CLB1)
        | (MsfKind::Project, BlockTag::ALB1)
        | (MsfKind::Project, BlockTag::SLB1)
        | (MsfKind::Standard, BlockTag::LBL1)
        | (MsfKind::Flow, BlockTag::FEN1) => {
            Block::Labels(HashTableBlock::from_bytes(body, ctx)?)
        }
        (MsfKind::Project, BlockTag::ATI2) => {
            Block::AttrInfo(AttrInfoBlock::from_bytes(body, ctx)?)
        }
        (MsfKind::Project, BlockTag::ALI2) => {
            Block::ItemLists(ItemListsBlock::from_bytes(body, ctx)?)
        }
        (MsfKind::Project, BlockTag::TGG2) => {
            Block::TagGroups(TagIndexBlock::from_bytes(body, ctx)?)
        }
        (MsfKind::Project, BlockTag::TAG2) => Block::Tags(TagIndexBlock::from_bytes(body, ctx)?),
        (MsfKind::Project, BlockTag::TGP2) => {
            Block::TagParams(TagParamsBlock::from_bytes(body, ctx)?)
        }
        (MsfKind::Project, BlockTag::TGL2) => Block::TagList(NameListBlock::from_bytes(body, ctx)?),
        (MsfKind::Project, BlockTag::SYL3) => Block::Styles(StylesBlock::from_bytes(body, ctx)?),
        (MsfKind::Project, BlockTag::CTI1) => {
            Block::Sources(SourceFilesBlock::from_bytes(body, ctx)?)
        }
        (MsfKind::Standard, BlockTag::TXT2) => Block::Text(TextBlock::from_bytes(body, ctx)?),
        (MsfKind::Standard, BlockTag::ATR1) | (MsfKind::Flow, BlockTag::FLW3) => {
            Block::Opaque(OpaqueBlock::from_bytes(body))
        }
        _ => return Err(Error::UnknownBlockTag(tag)),
    };
    Ok(block)
}

/// Emission never fails; every block serializes from owned values (or
/// verbatim bytes for the opaque ones).
pub(crate) fn emit(block: &Block, ctx: &BlockCtx) -> Vec<u8> {
    match block {
        Block::Colors(b) => b.to_bytes(ctx),
        Block::AttrInfo(b) => b.to_bytes(ctx),
        Block::ItemLists(b) => b.to_bytes(ctx),
        Block::TagGroups(b) | Block::Tags(b) => b.to_bytes(ctx),
        Block::TagParams(b) => b.to_bytes(ctx),
        Block::TagList(b) => b.to_bytes(ctx),
        Block::Styles(b) => b.to_bytes(ctx),
        Block::Sources(b) => b.to_bytes(ctx),
        Block::Labels(b) => b.to_bytes(ctx),
        Block::Text(b) => b.to_bytes(ctx),
        Block::Opaque(b) => b.to_bytes(),
    }
}
