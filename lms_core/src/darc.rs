use log::debug;

use crate::endian::ByteOrder;
use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::writer::Writer;

pub const MAGIC: &[u8; 4] = b"darc";

const VERSION: u32 = 0x0100_0000;
const HEADER_LEN: u32 = 0x1C;
const ENTRY_SIZE: usize = 12;
/// Bit 24 of the name field marks a directory entry.
const DIR_BIT: u32 = 0x0100_0000;
const DATA_ALIGN: usize = 32;

/// Index of an entry in the archive's arena. The root is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

impl EntryId {
    pub const ROOT: EntryId = EntryId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the archive tree: a named directory, or a named file with
/// an owned payload.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    parent: Option<EntryId>,
    kind: EntryKind,
}

#[derive(Debug, Clone)]
pub enum EntryKind {
    Dir { children: Vec<EntryId> },
    File { data: Vec<u8> },
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Dir { .. })
    }

    /// Payload bytes; `None` for directories.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.kind {
            EntryKind::File { data } => Some(data),
            EntryKind::Dir { .. } => None,
        }
    }

    /// Child ids in insertion order; empty for files.
    pub fn children(&self) -> &[EntryId] {
        match &self.kind {
            EntryKind::Dir { children } => children,
            EntryKind::File { .. } => &[],
        }
    }
}

/// The `darc` tree container.
///
/// Entries live in an arena indexed by [`EntryId`]; parent links are
/// indices rather than pointers, so the tree has single ownership and
/// no cycles. A root directory with an empty name always exists.
#[derive(Debug, Clone)]
pub struct Archive {
    order: ByteOrder,
    entries: Vec<Entry>,
}

impl Archive {
    pub fn new(order: ByteOrder) -> Archive {
        Archive {
            order,
            entries: vec![Entry {
                name: String::new(),
                parent: None,
                kind: EntryKind::Dir {
                    children: Vec::new(),
                },
            }],
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn root(&self) -> EntryId {
        EntryId::ROOT
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.index()]
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Full `/`-joined path of an entry. The root contributes its
    /// empty name, so a file directly under the root is `/name`.
    pub fn path(&self, id: EntryId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let entry = &self.entries[c.index()];
            parts.push(entry.name.as_str());
            cur = entry.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Depth-first pre-order walk, root first, children in insertion
    /// order.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            archive: self,
            stack: vec![EntryId::ROOT],
        }
    }

    /// Number of entries in the subtree rooted at `id`, including
    /// `id` itself.
    pub fn subtree_size(&self, id: EntryId) -> usize {
        match &self.entry(id).kind {
            EntryKind::File { .. } => 1,
            EntryKind::Dir { children } => {
                1 + children.iter().map(|&c| self.subtree_size(c)).sum::<usize>()
            }
        }
    }

    /// Direct child of a directory by name.
    pub fn child(&self, dir: EntryId, name: &str) -> Option<EntryId> {
        self.entry(dir)
            .children()
            .iter()
            .copied()
            .find(|&c| self.entry(c).name == name)
    }

    /// Entry with the given full path, if any.
    pub fn find(&self, path: &str) -> Option<EntryId> {
        let mut node = EntryId::ROOT;
        for part in path.split('/') {
            if part.is_empty() {
                continue;
            }
            node = self.child(node, part)?;
        }
        Some(node)
    }

    fn push_entry(&mut self, parent: EntryId, name: String, kind: EntryKind) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(Entry {
            name,
            parent: Some(parent),
            kind,
        });
        match &mut self.entries[parent.index()].kind {
            EntryKind::Dir { children } => children.push(id),
            EntryKind::File { .. } => unreachable!("parent entries are always directories"),
        }
        id
    }

    /// Create (or find) a directory at `path`, building intermediate
    /// directories as needed. Empty segments anchor at the root.
    pub fn add_dir(&mut self, path: &str) -> EntryId {
        let mut node = EntryId::ROOT;
        for part in path.split('/') {
            if part.is_empty() {
                continue;
            }
            node = match self.child(node, part) {
                Some(c) if self.entry(c).is_dir() => c,
                _ => self.push_entry(
                    node,
                    part.to_owned(),
                    EntryKind::Dir {
                        children: Vec::new(),
                    },
                ),
            };
        }
        node
    }

    /// Insert a file at `path`, creating intermediate directories.
    pub fn add_file(&mut self, path: &str, data: Vec<u8>) -> EntryId {
        let (dir, name) = match path.rfind('/') {
            Some(i) => (self.add_dir(&path[..i]), &path[i + 1..]),
            None => (EntryId::ROOT, path),
        };
        self.push_entry(dir, name.to_owned(), EntryKind::File { data })
    }

    /// Replace a file's payload.
    ///
    /// # Panics
    ///
    /// Panics if `id` refers to a directory.
    pub fn set_data(&mut self, id: EntryId, data: Vec<u8>) {
        match &mut self.entries[id.index()].kind {
            EntryKind::File { data: slot } => *slot = data,
            EntryKind::Dir { .. } => panic!("set_data on a directory entry"),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Archive> {
        let mut r = Reader::new(data, ByteOrder::Little);

        let magic = r.array::<4>()?;
        if &magic != MAGIC {
            return Err(Error::BadMagic {
                expected: "darc",
                found: magic.to_vec(),
            });
        }
        let order = ByteOrder::from_bom(r.array::<2>()?)?;
        r.set_order(order);

        let _header_len = r.u16()?;
        let version = r.u32()?;
        if version != VERSION {
            return Err(Error::BadVersion(version));
        }
        let _file_size = r.u32()?;
        let _table_offset = r.u32()?;
        let _table_len = r.u32()?;
        let _data_offset = r.u32()?;

        // The root record's third field is the exclusive end of the
        // whole table, i.e. the total entry count.
        let _root_name = r.u32()?;
        let _root_parent = r.u32()?;
        let entry_count = r.u32()? as usize;
        debug!("darc: {} entries, {:?}", entry_count, order);

        let mut raw = Vec::new();
        for _ in 1..entry_count {
            raw.push((r.u32()?, r.u32()?, r.u32()?));
        }
        let name_table = r.pos();

        let mut archive = Archive::new(order);
        // Stack of (directory, exclusive end index of its subtree).
        let mut stack: Vec<(EntryId, usize)> = vec![(EntryId::ROOT, entry_count)];
        for (i, &(name_field, second, third)) in raw.iter().enumerate() {
            let index = i + 1;
            while stack.last().is_some_and(|&(_, end)| end == index) {
                stack.pop();
            }
            let parent = stack.last().map_or(EntryId::ROOT, |&(id, _)| id);

            let is_dir = name_field & DIR_BIT != 0;
            let name_offset = (name_field & !DIR_BIT) as usize;
            let mut nr = r.at(name_table + name_offset)?;
            let name = read_name(&mut nr)?;

            if is_dir {
                let id = archive.push_entry(
                    parent,
                    name,
                    EntryKind::Dir {
                        children: Vec::new(),
                    },
                );
                stack.push((id, third as usize));
            } else {
                let mut fr = r.at(second as usize)?;
                let payload = fr.bytes(third as usize)?.to_vec();
                archive.push_entry(parent, name, EntryKind::File { data: payload });
            }
        }

        Ok(archive)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new(self.order);
        w.bytes(MAGIC);
        w.bytes(&self.order.bom());
        w.u16(HEADER_LEN as u16);
        w.u32(VERSION);
        let size_at = w.pos();
        w.u32(0); // total file size, patched last
        w.u32(HEADER_LEN);
        let table_len_at = w.pos();
        w.u32(0); // file-table length, patched after the name table
        let data_off_at = w.pos();
        w.u32(0); // file-data offset, patched after alignment

        // Record pass: table indices follow depth-first pre-order, the
        // name table accumulates on the side.
        let table_base = w.pos();
        let mut names = Writer::new(self.order);
        let mut index_of = vec![0usize; self.entries.len()];
        for (seq, (id, entry)) in self.entries().enumerate() {
            index_of[id.index()] = seq;
            let name_offset = names.pos() as u32;
            for unit in entry.name().encode_utf16() {
                names.u16(unit);
            }
            names.u16(0);

            match &entry.kind {
                EntryKind::Dir { .. } => {
                    w.u32(name_offset | DIR_BIT);
                    w.u32(entry.parent().map_or(0, |p| index_of[p.index()] as u32));
                    w.u32((seq + self.subtree_size(id)) as u32);
                }
                EntryKind::File { data } => {
                    w.u32(name_offset);
                    w.u32(0); // payload offset, patched on the data pass
                    w.u32(data.len() as u32);
                }
            }
        }

        let names = names.into_bytes();
        w.bytes(&names);
        let table_len = (w.pos() - table_base) as u32;
        w.patch_u32(table_len_at, table_len);

        w.align(DATA_ALIGN, 0);
        let data_offset = w.pos() as u32;
        w.patch_u32(data_off_at, data_offset);

        // Data pass: each directory flushes its sub-directories' files
        // first, then its own, so a directory's files cluster together.
        let mut files = Vec::new();
        self.collect_files(EntryId::ROOT, &mut files);
        for id in files {
            w.align(DATA_ALIGN, 0);
            let offset = w.pos() as u32;
            let EntryKind::File { data } = &self.entry(id).kind else {
                continue;
            };
            w.bytes(data);
            let record = table_base + ENTRY_SIZE * index_of[id.index()];
            w.patch_u32(record + 4, offset);
            w.patch_u32(record + 8, data.len() as u32);
        }

        let total = w.pos() as u32;
        w.patch_u32(size_at, total);
        w.into_bytes()
    }

    fn collect_files(&self, dir: EntryId, out: &mut Vec<EntryId>) {
        let children = self.entry(dir).children();
        for &c in children {
            if self.entry(c).is_dir() {
                self.collect_files(c, out);
            }
        }
        for &c in children {
            if !self.entry(c).is_dir() {
                out.push(c);
            }
        }
    }

    fn tree_eq(&self, a: EntryId, other: &Archive, b: EntryId) -> bool {
        let (ea, eb) = (self.entry(a), other.entry(b));
        if ea.name != eb.name {
            return false;
        }
        match (&ea.kind, &eb.kind) {
            (EntryKind::File { data: da }, EntryKind::File { data: db }) => da == db,
            (EntryKind::Dir { children: ca }, EntryKind::Dir { children: cb }) => {
                ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb.iter())
                        .all(|(&x, &y)| self.tree_eq(x, other, y))
            }
            _ => false,
        }
    }
}

/// Arena ids depend on insertion history, so equality compares the
/// trees structurally.
impl PartialEq for Archive {
    fn eq(&self, other: &Archive) -> bool {
        self.order == other.order && self.tree_eq(EntryId::ROOT, other, EntryId::ROOT)
    }
}

impl Eq for Archive {}

pub struct Entries<'a> {
    archive: &'a Archive,
    stack: Vec<EntryId>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (EntryId, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let entry = self.archive.entry(id);
        for &c in entry.children().iter().rev() {
            self.stack.push(c);
        }
        Some((id, entry))
    }
}

/// NUL-terminated UTF-16 string in the archive's byte order.
fn read_name(r: &mut Reader<'_>) -> Result<String> {
    let mut units = Vec::new();
    loop {
        let unit = r.u16()?;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    Ok(String::from_utf16_lossy(&units))
}
