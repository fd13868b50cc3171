//! Thread-safe reference cache: a mutex-guarded map from chromosome name
//! to its uppercase sequence bytes, lazily populated from a random-access
//! indexed FASTA.
//!
//! Modelled as `HashMap<String, Vec<Fasta>>` (one bucket per key, as the
//! spec's §9 design note requires), even though in practice a single
//! FASTA never supplies two sequences with the same name. `fetch`
//! returns the first bucket entry whose name matches the key exactly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bio::io::fasta;
use log::debug;

use crate::errors::Error;

/// A cached chromosome sequence.
#[derive(Clone, Debug)]
pub struct Fasta {
    pub name: String,
    pub seq: Vec<u8>,
}

impl Fasta {
    pub fn seq_length(&self) -> usize {
        self.seq.len()
    }
}

/// Lazily-populated, thread-safe reference cache.
///
/// The critical section spans lookup-through-insertion: concurrent
/// fetches of distinct chromosomes still serialize on this mutex, but
/// once a chromosome is warm, subsequent `fetch` calls are cheap map
/// lookups performed under the same (uncontended, fast) lock.
pub struct ReferenceCache {
    fasta_path: PathBuf,
    buckets: Mutex<HashMap<String, Vec<Fasta>>>,
}

impl ReferenceCache {
    pub fn new(fasta_path: impl AsRef<Path>) -> Self {
        ReferenceCache {
            fasta_path: fasta_path.as_ref().to_owned(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the (uppercased) sequence for `name`, faulting it in from
    /// the indexed FASTA collaborator on a cache miss.
    pub fn fetch(&self, name: &str) -> Result<Fasta, Error> {
        let mut buckets = self.buckets.lock().unwrap();

        if let Some(bucket) = buckets.get(name) {
            if let Some(entry) = bucket.iter().find(|f| f.name == name) {
                return Ok(entry.clone());
            }
        }

        let mut reader = fasta::IndexedReader::from_file(&self.fasta_path)
            .map_err(|_| Error::FastaIndexOpen {
                path: self.fasta_path.clone(),
            })?;
        reader
            .fetch_all(name)
            .map_err(|_| Error::SequenceMissing {
                chrom: name.to_owned(),
            })?;
        let mut seq = Vec::new();
        reader
            .read(&mut seq)
            .map_err(|_| Error::SequenceMissing {
                chrom: name.to_owned(),
            })?;
        seq.make_ascii_uppercase();

        let entry = Fasta {
            name: name.to_owned(),
            seq,
        };
        buckets
            .entry(name.to_owned())
            .or_insert_with(Vec::new)
            .push(entry.clone());

        debug!("faulted in reference sequence for {} ({} bp)", name, entry.seq_length());

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fasta(dir: &tempfile::TempDir, name: &str, seq: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, ">chr1").unwrap();
        writeln!(f, "{}", seq).unwrap();
        drop(f);
        let mut index = std::fs::File::create(path.with_extension("fa.fai")).unwrap();
        writeln!(
            index,
            "chr1\t{}\t6\t{}\t{}",
            seq.len(),
            seq.len(),
            seq.len() + 1
        )
        .unwrap();
        path
    }

    #[test]
    fn test_fetch_uppercases_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(&dir, "ref.fa", "acgtacgt");
        let cache = ReferenceCache::new(&path);

        let first = cache.fetch("chr1").unwrap();
        assert_eq!(first.seq, b"ACGTACGT");

        let second = cache.fetch("chr1").unwrap();
        assert_eq!(second.seq, first.seq);
    }

    #[test]
    fn test_fetch_missing_chrom_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(&dir, "ref.fa", "acgt");
        let cache = ReferenceCache::new(&path);
        assert!(cache.fetch("chr2").is_err());
    }
}
