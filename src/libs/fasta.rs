use crate::libs::interval::GenomicInterval;
use anyhow::{bail, Context};
use indexmap::IndexMap;

/// In-memory store of reference sequences, uppercased at load.
///
/// Lookup is by `(name, start, end)` with 0-based, half-open coordinates.
/// The store is read-only after load and safe to share across workers.
pub struct SeqStore {
    seq_of: IndexMap<String, Vec<u8>>,
}

impl SeqStore {
    pub fn load(input: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(input)?;
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let mut seq_of = IndexMap::new();
        for result in fa_in.records() {
            let record =
                result.with_context(|| format!("malformed FASTA record in {}", input))?;
            let name = String::from_utf8(record.name().into())?;
            let seq: Vec<u8> = record
                .sequence()
                .as_ref()
                .iter()
                .map(|b| b.to_ascii_uppercase())
                .collect();
            seq_of.insert(name, seq);
        }

        if seq_of.is_empty() {
            bail!("no sequences found in {}", input);
        }

        Ok(Self { seq_of })
    }

    pub fn len_of(&self, name: &str) -> Option<usize> {
        self.seq_of.get(name).map(|s| s.len())
    }

    pub fn fetch(&self, name: &str, start: usize, end: usize) -> anyhow::Result<&[u8]> {
        let seq = self
            .seq_of
            .get(name)
            .with_context(|| format!("sequence {} not found in the store", name))?;
        if start > end || end > seq.len() {
            bail!(
                "{}:{}-{} outside of sequence bounds (length {})",
                name,
                start,
                end,
                seq.len()
            );
        }

        Ok(&seq[start..end])
    }

    /// One whole-length interval per stored sequence, in load order
    pub fn intervals(&self) -> Vec<GenomicInterval> {
        self.seq_of
            .iter()
            .map(|(name, seq)| GenomicInterval::new(name, 0, seq.len()))
            .collect()
    }
}
