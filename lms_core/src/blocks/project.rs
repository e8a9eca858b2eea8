use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::msf::BlockCtx;
use crate::reader::Reader;
use crate::writer::Writer;

/// Parameter type code for enumerations, the one `TGP2` record kind
/// that carries an item list.
const PARAM_ENUM: u8 = 9;

/// One RGBA color from `CLR1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// `CLR1` — the project's ordered color table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorsBlock {
    pub colors: Vec<Rgba>,
}

impl ColorsBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<ColorsBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u32()?;
        let mut colors = Vec::new();
        for _ in 0..count {
            colors.push(Rgba {
                r: rd.u8()?,
                g: rd.u8()?,
                b: rd.u8()?,
                a: rd.u8()?,
            });
        }
        Ok(ColorsBlock { colors })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.colors.len() as u32);
        for c in &self.colors {
            w.u8(c.r);
            w.u8(c.g);
            w.u8(c.b);
            w.u8(c.a);
        }
        w.into_bytes()
    }
}

/// One `ATI2` descriptor: attribute value type, an unidentified byte,
/// the index of its `ALI2` item list, and its byte offset into the
/// standard files' `ATR1` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrInfo {
    pub kind: u8,
    pub unk: u8,
    pub list_index: u16,
    pub offset: u32,
}

/// `ATI2` — attribute descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrInfoBlock {
    pub attributes: Vec<AttrInfo>,
}

impl AttrInfoBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<AttrInfoBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u32()?;
        let mut attributes = Vec::new();
        for _ in 0..count {
            attributes.push(AttrInfo {
                kind: rd.u8()?,
                unk: rd.u8()?,
                list_index: rd.u16()?,
                offset: rd.u32()?,
            });
        }
        Ok(AttrInfoBlock { attributes })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.attributes.len() as u32);
        for a in &self.attributes {
            w.u8(a.kind);
            w.u8(a.unk);
            w.u16(a.list_index);
            w.u32(a.offset);
        }
        w.into_bytes()
    }
}

/// `ALI2` — per-attribute lists of item names: an offset table whose
/// targets are themselves offset tables of NUL-terminated strings
/// (string offsets relative to the inner table's base).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListsBlock {
    pub lists: Vec<Vec<String>>,
}

impl ItemListsBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<ItemListsBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u32()?;
        let mut lists = Vec::new();
        for _ in 0..count {
            let base = rd.u32()? as usize;
            let mut lr = rd.at(base)?;
            let items = lr.u32()?;
            let mut names = Vec::new();
            for _ in 0..items {
                let name_offset = lr.u32()? as usize;
                let mut nr = lr.at(base + name_offset)?;
                names.push(ctx.read_str(&mut nr)?);
            }
            lists.push(names);
        }
        Ok(ItemListsBlock { lists })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.lists.len() as u32);
        let table = w.pos();
        w.zeros(4 * self.lists.len());

        for (i, list) in self.lists.iter().enumerate() {
            let base = w.pos();
            w.patch_u32(table + 4 * i, base as u32);
            w.u32(list.len() as u32);
            let inner = w.pos();
            w.zeros(4 * list.len());
            for (j, name) in list.iter().enumerate() {
                let pos = w.pos();
                w.patch_u32(inner + 4 * j, (pos - base) as u32);
                ctx.write_str(&mut w, name);
            }
            w.align(4, 0);
        }
        w.into_bytes()
    }
}

/// One named record with its member indices: a group's tags (`TGG2`)
/// or a tag's parameters (`TAG2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndexEntry {
    pub name: String,
    pub indices: Vec<u16>,
}

/// Shared layout of `TGG2` and `TAG2`: a u16-counted offset table of
/// `(index list, name)` records, each padded to a u32 boundary. The
/// two tags differ only in what the indices mean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndexBlock {
    pub entries: Vec<TagIndexEntry>,
}

impl TagIndexBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<TagIndexBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u16()?;
        rd.skip(2)?;
        let mut entries = Vec::new();
        for _ in 0..count {
            let offset = rd.u32()? as usize;
            let mut er = rd.at(offset)?;
            let items = er.u16()?;
            let mut indices = Vec::new();
            for _ in 0..items {
                indices.push(er.u16()?);
            }
            let name = ctx.read_str(&mut er)?;
            entries.push(TagIndexEntry { name, indices });
        }
        Ok(TagIndexBlock { entries })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u16(self.entries.len() as u16);
        w.zeros(2);
        let table = w.pos();
        w.zeros(4 * self.entries.len());

        for (i, entry) in self.entries.iter().enumerate() {
            let pos = w.pos() as u32;
            w.patch_u32(table + 4 * i, pos);
            w.u16(entry.indices.len() as u16);
            for &x in &entry.indices {
                w.u16(x);
            }
            ctx.write_str(&mut w, &entry.name);
            w.align(4, 0);
        }
        w.into_bytes()
    }
}

/// One `TGP2` record: parameter name, wire type code (0..=9), and the
/// `TGL2` item indices when the type is an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagParam {
    pub name: String,
    pub kind: u8,
    pub items: Vec<u16>,
}

/// `TGP2` — tag parameter descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagParamsBlock {
    pub parameters: Vec<TagParam>,
}

impl TagParamsBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<TagParamsBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u16()?;
        rd.skip(2)?;
        let mut parameters = Vec::new();
        for _ in 0..count {
            let offset = rd.u32()? as usize;
            let mut pr = rd.at(offset)?;
            let kind = pr.u8()?;
            let mut items = Vec::new();
            if kind == PARAM_ENUM {
                pr.skip(1)?;
                let n = pr.u16()?;
                for _ in 0..n {
                    items.push(pr.u16()?);
                }
            }
            let name = ctx.read_str(&mut pr)?;
            parameters.push(TagParam { name, kind, items });
        }
        Ok(TagParamsBlock { parameters })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u16(self.parameters.len() as u16);
        w.zeros(2);
        let table = w.pos();
        w.zeros(4 * self.parameters.len());

        for (i, param) in self.parameters.iter().enumerate() {
            let pos = w.pos() as u32;
            w.patch_u32(table + 4 * i, pos);
            w.u8(param.kind);
            if param.kind == PARAM_ENUM {
                w.u8(0);
                w.u16(param.items.len() as u16);
                for &x in &param.items {
                    w.u16(x);
                }
            }
            ctx.write_str(&mut w, &param.name);
            w.align(4, 0);
        }
        w.into_bytes()
    }
}

/// `TGL2` — the tag-parameter item names. A u16-counted offset table;
/// the string bodies are packed without padding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameListBlock {
    pub names: Vec<String>,
}

impl NameListBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<NameListBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u16()?;
        rd.skip(2)?;
        let mut names = Vec::new();
        for _ in 0..count {
            let offset = rd.u32()? as usize;
            let mut nr = rd.at(offset)?;
            names.push(ctx.read_str(&mut nr)?);
        }
        Ok(NameListBlock { names })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u16(self.names.len() as u16);
        w.zeros(2);
        let table = w.pos();
        w.zeros(4 * self.names.len());
        for (i, name) in self.names.iter().enumerate() {
            let pos = w.pos() as u32;
            w.patch_u32(table + 4 * i, pos);
            ctx.write_str(&mut w, name);
        }
        w.into_bytes()
    }
}

/// One `SYL3` style record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRecord {
    pub region_width: u32,
    pub line_count: u32,
    pub font_index: u32,
    pub base_color: i32,
}

/// `SYL3` — style records, 16 bytes each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesBlock {
    pub styles: Vec<StyleRecord>,
}

impl StylesBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<StylesBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u32()?;
        let mut styles = Vec::new();
        for _ in 0..count {
            styles.push(StyleRecord {
                region_width: rd.u32()?,
                line_count: rd.u32()?,
                font_index: rd.u32()?,
                base_color: rd.i32()?,
            });
        }
        Ok(StylesBlock { styles })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.styles.len() as u32);
        for s in &self.styles {
            w.u32(s.region_width);
            w.u32(s.line_count);
            w.u32(s.font_index);
            w.i32(s.base_color);
        }
        w.into_bytes()
    }
}

/// `CTI1` — the project's source filenames. Same shape as `TGL2` but
/// with a full u32 count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilesBlock {
    pub filenames: Vec<String>,
}

impl SourceFilesBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<SourceFilesBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u32()?;
        let mut filenames = Vec::new();
        for _ in 0..count {
            let offset = rd.u32()? as usize;
            let mut nr = rd.at(offset)?;
            filenames.push(ctx.read_str(&mut nr)?);
        }
        Ok(SourceFilesBlock { filenames })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.filenames.len() as u32);
        let table = w.pos();
        w.zeros(4 * self.filenames.len());
        for (i, name) in self.filenames.iter().enumerate() {
            let pos = w.pos() as u32;
            w.patch_u32(table + 4 * i, pos);
            ctx.write_str(&mut w, name);
        }
        w.into_bytes()
    }
}
