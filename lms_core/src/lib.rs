//! Codec and object model for the `darc` archive container and the
//! message-studio file family (`MsgPrjBn` / `MsgStdBn` / `MsgFlwBn`).
//!
//! Reading runs bytes → optional LZ11 unwrap → [`Archive`] →
//! per-entry [`MsfFile`] parse → [`Bundle`]; writing runs the same
//! pipe in reverse. Every codec re-emits what it parsed byte for
//! byte, padding included.

pub mod blocks;
pub mod bundle;
pub mod compress;
pub mod darc;
pub mod endian;
pub mod error;
pub mod filetype;
pub mod msf;
pub mod reader;
pub mod writer;

pub use blocks::Block;
pub use bundle::Bundle;
pub use compress::Lz11Codec;
pub use darc::{Archive, Entry, EntryId, EntryKind};
pub use endian::{ByteOrder, TextEncoding};
pub use error::{Error, Result};
pub use filetype::FileType;
pub use msf::{BlockCtx, BlockTag, MsfFile, MsfKind};
pub use reader::Reader;
pub use writer::Writer;
