use serde::{Deserialize, Serialize};

use crate::endian::TextEncoding;
use crate::error::Result;
use crate::msf::BlockCtx;
use crate::reader::Reader;
use crate::writer::Writer;

/// Code unit introducing an inline control record.
const CONTROL_MARKER: u32 = 0x000E;
/// Low byte of the one-unit button-label shorthand.
const BUTTON_MARKER: u32 = 0xE0;
/// Placeholder character standing in for a control record in decoded
/// message text, one per record in order.
pub const PLACEHOLDER: char = '\u{FFFC}';

/// An inline control record of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlTag {
    /// A `(group, tag)` reference into the project tables plus its
    /// raw parameter bytes. Parameter decoding is a rendering
    /// concern; the codec carries the bytes.
    Tag {
        group: u16,
        tag: u16,
        params: Vec<u8>,
    },
    /// The button-label shorthand: a single code unit `xx E0` whose
    /// high byte is the label index.
    Button(u8),
}

/// A single message: decoded text with one [`PLACEHOLDER`] per control
/// record, and the records in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub tags: Vec<ControlTag>,
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Message {
        Message {
            text: text.into(),
            tags: Vec::new(),
        }
    }
}

/// `TXT2` — the message block: a u32-counted offset table (offsets
/// relative to the block body start), each target a NUL-terminated
/// code-unit sequence with in-band control records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub messages: Vec<Message>,
}

impl TextBlock {
    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<TextBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let count = rd.u32()?;
        let mut messages = Vec::new();
        for _ in 0..count {
            let offset = rd.u32()? as usize;
            let mut mr = rd.at(offset)?;
            messages.push(read_message(&mut mr, ctx)?);
        }
        Ok(TextBlock { messages })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.messages.len() as u32);
        let table = w.pos();
        w.zeros(4 * self.messages.len());
        for (i, msg) in self.messages.iter().enumerate() {
            let pos = w.pos() as u32;
            w.patch_u32(table + 4 * i, pos);
            write_message(&mut w, msg, ctx);
        }
        w.into_bytes()
    }
}

fn read_unit(r: &mut Reader<'_>, encoding: TextEncoding) -> Result<u32> {
    Ok(match encoding {
        TextEncoding::Utf8 => r.u8()? as u32,
        TextEncoding::Utf16 => r.u16()? as u32,
        TextEncoding::Utf32 => r.u32()?,
    })
}

fn write_unit(w: &mut Writer, encoding: TextEncoding, unit: u32) {
    match encoding {
        TextEncoding::Utf8 => w.u8(unit as u8),
        TextEncoding::Utf16 => w.u16(unit as u16),
        TextEncoding::Utf32 => w.u32(unit),
    }
}

/// Append a run of plain-text code units to `text`, decoding in the
/// file encoding. Runs are flushed at markers and at the terminator so
/// surrogate pairs stay intact.
fn flush_run(text: &mut String, run: &mut Vec<u32>, encoding: TextEncoding) {
    if run.is_empty() {
        return;
    }
    match encoding {
        TextEncoding::Utf8 => {
            let bytes: Vec<u8> = run.iter().map(|&u| u as u8).collect();
            text.push_str(&String::from_utf8_lossy(&bytes));
        }
        TextEncoding::Utf16 => {
            let units: Vec<u16> = run.iter().map(|&u| u as u16).collect();
            text.push_str(&String::from_utf16_lossy(&units));
        }
        TextEncoding::Utf32 => {
            for &u in run.iter() {
                text.push(char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }
    run.clear();
}

fn read_message(r: &mut Reader<'_>, ctx: &BlockCtx) -> Result<Message> {
    let mut text = String::new();
    let mut tags = Vec::new();
    let mut run: Vec<u32> = Vec::new();

    loop {
        let unit = read_unit(r, ctx.encoding)?;
        if unit == 0 {
            break;
        }
        if unit == CONTROL_MARKER {
            flush_run(&mut text, &mut run, ctx.encoding);
            let group = r.u16()?;
            let tag = r.u16()?;
            let size = r.u16()?;
            let params = r.bytes(size as usize)?.to_vec();
            tags.push(ControlTag::Tag { group, tag, params });
            text.push(PLACEHOLDER);
        } else if ctx.encoding == TextEncoding::Utf16 && unit & 0xFF == BUTTON_MARKER {
            // The shorthand only exists in 16-bit text; 0xE0 is a
            // legitimate lead byte in UTF-8.
            flush_run(&mut text, &mut run, ctx.encoding);
            tags.push(ControlTag::Button((unit >> 8) as u8));
            text.push(PLACEHOLDER);
        } else {
            run.push(unit);
        }
    }
    flush_run(&mut text, &mut run, ctx.encoding);

    Ok(Message { text, tags })
}

fn write_message(w: &mut Writer, msg: &Message, ctx: &BlockCtx) {
    let mut records = msg.tags.iter();
    for c in msg.text.chars() {
        if c == PLACEHOLDER {
            match records.next() {
                Some(ControlTag::Tag { group, tag, params }) => {
                    write_unit(w, ctx.encoding, CONTROL_MARKER);
                    w.u16(*group);
                    w.u16(*tag);
                    w.u16(params.len() as u16);
                    w.bytes(params);
                }
                Some(ControlTag::Button(label)) => {
                    write_unit(w, ctx.encoding, (*label as u32) << 8 | BUTTON_MARKER);
                }
                // A placeholder with no record left has nothing to
                // emit; it is dropped.
                None => {}
            }
        } else {
            match ctx.encoding {
                TextEncoding::Utf8 => {
                    let mut buf = [0u8; 4];
                    w.bytes(c.encode_utf8(&mut buf).as_bytes());
                }
                TextEncoding::Utf16 => {
                    let mut buf = [0u16; 2];
                    for &u in c.encode_utf16(&mut buf).iter() {
                        w.u16(u);
                    }
                }
                TextEncoding::Utf32 => w.u32(c as u32),
            }
        }
    }
    write_unit(w, ctx.encoding, 0);
}

/// Verbatim bytes of a block whose interior layout is not modeled
/// (`ATR1`, `FLW3`). Emission can never fail and never differs from
/// the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueBlock {
    pub data: Vec<u8>,
}

impl OpaqueBlock {
    pub fn from_bytes(data: &[u8]) -> OpaqueBlock {
        OpaqueBlock {
            data: data.to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }
}
