use std::collections::BTreeMap;
use std::fmt::Write as _;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::blocks::{Block, ControlTag, Message, PLACEHOLDER};
use crate::compress::{self, Lz11Codec};
use crate::darc::Archive;
use crate::error::{Error, Result};
use crate::msf::{BlockTag, MsfFile, MsfKind};

/// A tag parameter descriptor from the project's `TGP2` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagParameter {
    pub name: String,
    /// Wire type code (0..=9); 9 is an enumeration over `items`.
    pub kind: u8,
    pub items: Vec<u16>,
}

/// A tag descriptor: its name and the indices of its parameters in
/// the project's parameter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub parameters: Vec<u16>,
}

/// A tag group: its name and the indices of its member tags in the
/// project's tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroup {
    pub name: String,
    pub tags: Vec<u16>,
}

/// One control record of a decorated message.
///
/// Cross-references stay indices rather than pointers, so they can be
/// rebound after the project is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTag {
    /// Indices validated against the project tables: `group` is a
    /// position in the group table, `tag` a position within that
    /// group's member list.
    Resolved {
        group: u16,
        tag: u16,
        params: Vec<u8>,
    },
    /// Out-of-range indices, kept raw.
    Unresolved {
        group: u16,
        tag: u16,
        params: Vec<u8>,
    },
    /// The button-label shorthand.
    Button(u8),
}

/// A message decorated for display: `{0}`-numbered placeholders in
/// left-to-right order, one per control record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedMessage {
    pub text: String,
    pub tags: Vec<MessageTag>,
}

/// All decorated messages of one standard file, keyed by label.
pub type MessageSet = BTreeMap<String, DecoratedMessage>;

/// A project joined with the standard files that reference it.
///
/// The archive and every parsed file are retained so the bundle can
/// re-emit itself; the decorated view is derived and can be rebuilt
/// with [`Bundle::redecorate`] after edits.
#[derive(Debug)]
pub struct Bundle {
    archive: Archive,
    compressed: bool,
    project_path: String,
    project: MsfFile,
    standards: BTreeMap<String, MsfFile>,
    parameters: Vec<TagParameter>,
    tags: Vec<Tag>,
    groups: Vec<TagGroup>,
    item_names: Vec<String>,
    messages: BTreeMap<String, MessageSet>,
}

impl Bundle {
    /// Assemble from an uncompressed archive. The archive must contain
    /// exactly one `*.msbp` entry.
    pub fn from_archive(archive: Archive) -> Result<Bundle> {
        Bundle::assemble(archive, false)
    }

    /// Strip an optional LZ11 envelope, parse the archive, and
    /// assemble. The envelope state is kept for [`Bundle::to_bytes`].
    pub fn from_bytes(data: &[u8], codec: &dyn Lz11Codec) -> Result<Bundle> {
        let (payload, compressed) = compress::unwrap(data, codec)?;
        Bundle::assemble(Archive::parse(&payload)?, compressed)
    }

    fn assemble(archive: Archive, compressed: bool) -> Result<Bundle> {
        let mut project_paths = Vec::new();
        let mut standard_paths = Vec::new();
        for (id, entry) in archive.entries() {
            if entry.is_dir() {
                continue;
            }
            let path = archive.path(id);
            if path.ends_with(".msbp") {
                project_paths.push((path, id));
            } else if path.ends_with(".msbt") {
                standard_paths.push((path, id));
            }
        }
        if project_paths.len() != 1 {
            return Err(Error::MissingProject);
        }
        let (project_path, project_id) = project_paths.remove(0);

        let project = MsfFile::parse(archive.entry(project_id).data().unwrap_or_default())?;
        if project.kind() != MsfKind::Project {
            return Err(Error::MissingProject);
        }
        let (parameters, tags, groups, item_names) = derive_tables(&project);

        let mut bundle = Bundle {
            archive,
            compressed,
            project_path,
            project,
            standards: BTreeMap::new(),
            parameters,
            tags,
            groups,
            item_names,
            messages: BTreeMap::new(),
        };
        for (path, id) in standard_paths {
            let file = MsfFile::parse(bundle.archive.entry(id).data().unwrap_or_default())?;
            let set = bundle.decorate(&file);
            bundle.messages.insert(path.clone(), set);
            bundle.standards.insert(path, file);
        }
        Ok(bundle)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Whether the source blob carried an LZ11 envelope; re-emission
    /// preserves this.
    pub fn compressed(&self) -> bool {
        self.compressed
    }

    pub fn set_compressed(&mut self, compressed: bool) {
        self.compressed = compressed;
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn project(&self) -> &MsfFile {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut MsfFile {
        &mut self.project
    }

    pub fn standard(&self, path: &str) -> Option<&MsfFile> {
        self.standards.get(path)
    }

    pub fn standard_mut(&mut self, path: &str) -> Option<&mut MsfFile> {
        self.standards.get_mut(path)
    }

    pub fn standards(&self) -> impl Iterator<Item = (&str, &MsfFile)> {
        self.standards.iter().map(|(p, f)| (p.as_str(), f))
    }

    pub fn parameters(&self) -> &[TagParameter] {
        &self.parameters
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn groups(&self) -> &[TagGroup] {
        &self.groups
    }

    /// The `TGL2` name list that enumeration parameters index into.
    pub fn item_names(&self) -> &[String] {
        &self.item_names
    }

    /// Display name behind one entry of an enumeration parameter's
    /// item list.
    pub fn item_name(&self, index: u16) -> Option<&str> {
        self.item_names.get(index as usize).map(String::as_str)
    }

    /// Decorated messages per standard-file path.
    pub fn messages(&self) -> &BTreeMap<String, MessageSet> {
        &self.messages
    }

    pub fn message(&self, path: &str, label: &str) -> Option<&DecoratedMessage> {
        self.messages.get(path)?.get(label)
    }

    /// The group / tag / parameter descriptors behind a resolved
    /// record. `None` for unresolved records and button shorthands.
    pub fn describe(&self, record: &MessageTag) -> Option<(&TagGroup, &Tag, Vec<&TagParameter>)> {
        let MessageTag::Resolved { group, tag, .. } = record else {
            return None;
        };
        let group = self.groups.get(*group as usize)?;
        let global = *group.tags.get(*tag as usize)? as usize;
        let tag = self.tags.get(global)?;
        let parameters = tag
            .parameters
            .iter()
            .filter_map(|&p| self.parameters.get(p as usize))
            .collect();
        Some((group, tag, parameters))
    }

    /// Rebuild the derived tables and the decorated view after the
    /// editing collaborator has modified the project or the standard
    /// files.
    pub fn redecorate(&mut self) {
        let (parameters, tags, groups, item_names) = derive_tables(&self.project);
        self.parameters = parameters;
        self.tags = tags;
        self.groups = groups;
        self.item_names = item_names;

        let sets: Vec<(String, MessageSet)> = self
            .standards
            .iter()
            .map(|(path, file)| (path.clone(), self.decorate(file)))
            .collect();
        self.messages = sets.into_iter().collect();
    }

    /// Re-emit every parsed file into its archive entry and seal the
    /// envelope.
    pub fn to_bytes(&mut self, codec: &dyn Lz11Codec) -> Result<Vec<u8>> {
        let bytes = self.project.to_bytes();
        if let Some(id) = self.archive.find(&self.project_path) {
            self.archive.set_data(id, bytes);
        }
        let paths: Vec<String> = self.standards.keys().cloned().collect();
        for path in paths {
            let bytes = self.standards[&path].to_bytes();
            if let Some(id) = self.archive.find(&path) {
                self.archive.set_data(id, bytes);
            }
        }
        compress::wrap(self.archive.to_bytes(), self.compressed, codec)
    }

    fn decorate(&self, file: &MsfFile) -> MessageSet {
        let mut set = MessageSet::new();
        let (Some(labels), Some(text)) = (file.labels(), file.text()) else {
            return set;
        };

        // Invert the label table: message index -> label.
        let mut by_index: BTreeMap<u32, &str> = BTreeMap::new();
        for (label, index) in labels.labels() {
            by_index.insert(*index, label.as_str());
        }

        for (i, msg) in text.messages.iter().enumerate() {
            let Some(label) = by_index.get(&(i as u32)) else {
                warn!("message {} has no label entry, skipping", i);
                continue;
            };
            set.insert((*label).to_owned(), self.decorate_message(msg));
        }
        set
    }

    fn decorate_message(&self, msg: &Message) -> DecoratedMessage {
        let mut text = String::new();
        let mut tags: Vec<MessageTag> = Vec::new();
        for c in msg.text.chars() {
            if c != PLACEHOLDER {
                text.push(c);
                continue;
            }
            let decorated = match msg.tags.get(tags.len()) {
                Some(ControlTag::Tag { group, tag, params }) => {
                    self.resolve(*group, *tag, params.clone())
                }
                Some(ControlTag::Button(label)) => MessageTag::Button(*label),
                // A stray placeholder with no record behind it stays
                // literal text.
                None => {
                    text.push(c);
                    continue;
                }
            };
            let _ = write!(text, "{{{}}}", tags.len());
            tags.push(decorated);
        }
        DecoratedMessage { text, tags }
    }

    fn resolve(&self, group: u16, tag: u16, params: Vec<u8>) -> MessageTag {
        let in_range = self
            .groups
            .get(group as usize)
            .and_then(|g| g.tags.get(tag as usize))
            .is_some_and(|&global| (global as usize) < self.tags.len());
        if in_range {
            MessageTag::Resolved { group, tag, params }
        } else {
            warn!("{}", Error::UnresolvedTagRef { group, tag });
            MessageTag::Unresolved { group, tag, params }
        }
    }
}

type ProjectTables = (Vec<TagParameter>, Vec<Tag>, Vec<TagGroup>, Vec<String>);

fn derive_tables(project: &MsfFile) -> ProjectTables {
    let mut parameters = Vec::new();
    if let Some(block) = project.tag_params() {
        for p in &block.parameters {
            parameters.push(TagParameter {
                name: p.name.clone(),
                kind: p.kind,
                items: p.items.clone(),
            });
        }
    }
    let mut tags = Vec::new();
    if let Some(block) = project.tags() {
        for e in &block.entries {
            tags.push(Tag {
                name: e.name.clone(),
                parameters: e.indices.clone(),
            });
        }
    }
    let mut groups = Vec::new();
    if let Some(block) = project.tag_groups() {
        for e in &block.entries {
            groups.push(TagGroup {
                name: e.name.clone(),
                tags: e.indices.clone(),
            });
        }
    }
    let item_names = match project.block(BlockTag::TGL2) {
        Some(Block::TagList(b)) => b.names.clone(),
        _ => Vec::new(),
    };
    (parameters, tags, groups, item_names)
}
