use crate::error::Result;
use crate::msf::BlockCtx;
use crate::reader::Reader;
use crate::writer::Writer;

/// Label hash table shared by `LBL1`, `CLB1`, `ALB1`, `SLB1` and
/// `FEN1`: a closed-addressing map from label to a u32 item index.
///
/// `slot_count` is preserved verbatim across round-trips; emission
/// rebuckets the labels with the stored slot count, so a file parsed
/// and re-emitted keeps its exact slot layout.
#[derive(Debug, Clone)]
pub struct HashTableBlock {
    slot_count: u32,
    labels: Vec<(String, u32)>,
}

/// Parsing yields labels in slot order, so equality ignores label
/// order.
impl PartialEq for HashTableBlock {
    fn eq(&self, other: &HashTableBlock) -> bool {
        if self.slot_count != other.slot_count || self.labels.len() != other.labels.len() {
            return false;
        }
        let mut a: Vec<&(String, u32)> = self.labels.iter().collect();
        let mut b: Vec<&(String, u32)> = other.labels.iter().collect();
        a.sort();
        b.sort();
        a == b
    }
}

impl Eq for HashTableBlock {}

impl HashTableBlock {
    pub fn new(slot_count: u32) -> HashTableBlock {
        HashTableBlock {
            slot_count,
            labels: Vec::new(),
        }
    }

    /// Slot of `label` in a table with `slot_count` slots. The hash
    /// runs over UTF-8 code units regardless of the file's text
    /// encoding.
    pub fn hash(label: &str, slot_count: u32) -> u32 {
        let mut h: u32 = 0;
        for &b in label.as_bytes() {
            h = h.wrapping_mul(0x492).wrapping_add(b as u32);
        }
        h % slot_count.max(1)
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Labels in parse order (slot order, then insertion order within
    /// a slot).
    pub fn labels(&self) -> &[(String, u32)] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.labels
            .iter()
            .find(|(l, _)| l == label)
            .map(|&(_, v)| v)
    }

    /// Reverse lookup: the label mapped to `value`, if any.
    pub fn label_for(&self, value: u32) -> Option<&str> {
        self.labels
            .iter()
            .find(|&&(_, v)| v == value)
            .map(|(l, _)| l.as_str())
    }

    /// Insert a label, replacing the value if it already exists.
    pub fn insert(&mut self, label: impl Into<String>, value: u32) {
        let label = label.into();
        match self.labels.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.labels.push((label, value)),
        }
    }

    pub fn from_bytes(data: &[u8], ctx: &BlockCtx) -> Result<HashTableBlock> {
        let mut rd = Reader::new(data, ctx.order);
        let slot_count = rd.u32()?;

        let mut labels = Vec::new();
        for _ in 0..slot_count {
            let count = rd.u32()?;
            let offset = rd.u32()? as usize;
            if count == 0 {
                continue;
            }
            let mut lr = rd.at(offset)?;
            for _ in 0..count {
                let len = lr.u8()? as usize;
                let label = String::from_utf8_lossy(lr.bytes(len)?).into_owned();
                let value = lr.u32()?;
                labels.push((label, value));
            }
        }

        Ok(HashTableBlock { slot_count, labels })
    }

    pub fn to_bytes(&self, ctx: &BlockCtx) -> Vec<u8> {
        let mut w = Writer::new(ctx.order);
        w.u32(self.slot_count);

        let mut slots: Vec<Vec<(&str, u32)>> = vec![Vec::new(); self.slot_count as usize];
        for (label, value) in &self.labels {
            slots[Self::hash(label, self.slot_count) as usize].push((label.as_str(), *value));
        }

        let table = w.pos();
        w.zeros(8 * self.slot_count as usize);
        for (i, bucket) in slots.iter().enumerate() {
            let pos = w.pos() as u32;
            w.patch_u32(table + 8 * i, bucket.len() as u32);
            w.patch_u32(table + 8 * i + 4, pos);
            for (label, value) in bucket {
                w.u8(label.len() as u8);
                w.bytes(label.as_bytes());
                w.u32(*value);
            }
        }
        w.into_bytes()
    }
}
