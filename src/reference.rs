use std::fs;
use std::path::Path;
use std::str;
use std::sync::Arc;
use std::sync::{Mutex, RwLock};

use anyhow::{anyhow, Result};
use bio::io::fasta;
use lru_time_cache::LruCache;

use crate::errors::Error;

/// The sequence of a single chromosome.
#[derive(Debug, Clone, new, Getters)]
pub struct ChrReference {
    #[getset(get = "pub")]
    name: String,
    sequence: Arc<Vec<u8>>,
}

impl ChrReference {
    /// Reference base at the given 1-based position.
    pub fn base_at(&self, position: u64) -> Option<u8> {
        if position == 0 {
            return None;
        }
        self.sequence.get(position as usize - 1).cloned()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A lazy buffer for reference sequences.
pub struct Buffer {
    reader: RwLock<fasta::IndexedReader<fs::File>>,
    sequences: Mutex<LruCache<String, Arc<Vec<u8>>>>,
}

impl Buffer {
    pub fn from_path<P: AsRef<Path> + std::fmt::Debug>(path: P, capacity: usize) -> Result<Self> {
        let fasta: fasta::IndexedReader<fs::File> = fasta::IndexedReader::from_file(&path)?;
        Ok(Buffer {
            reader: RwLock::new(fasta),
            sequences: Mutex::new(LruCache::with_capacity(capacity)),
        })
    }

    pub fn sequences(&self) -> Result<Vec<fasta::Sequence>> {
        let reader = self
            .reader
            .read()
            .map_err(|_| anyhow!("reference reader lock poisoned"))?;
        Ok(reader.index.sequences())
    }

    /// Load given chromosome. This is O(1) if the chromosome was loaded before.
    pub fn seq(&self, chrom: &str) -> Result<Arc<Vec<u8>>> {
        let mut sequences = self
            .sequences
            .lock()
            .map_err(|_| anyhow!("reference cache lock poisoned"))?;

        if let Some(sequence) = sequences.get(chrom) {
            return Ok(Arc::clone(sequence));
        }

        let mut sequence = Vec::new();
        {
            let mut reader = self
                .reader
                .write()
                .map_err(|_| anyhow!("reference reader lock poisoned"))?;
            if reader.fetch_all(chrom).is_err() {
                return Err(Error::UnknownContig {
                    contig: chrom.to_owned(),
                }
                .into());
            }
            reader.read(&mut sequence)?;
        }
        let sequence = Arc::new(sequence);
        sequences.insert(chrom.to_owned(), Arc::clone(&sequence));
        Ok(sequence)
    }

    pub fn chr_reference(&self, chrom: &str) -> Result<ChrReference> {
        Ok(ChrReference::new(chrom.to_owned(), self.seq(chrom)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_base_at() {
        let reference = ChrReference::new("chr1".to_owned(), Arc::new(b"ACGTN".to_vec()));
        assert_eq!(reference.base_at(0), None);
        assert_eq!(reference.base_at(1), Some(b'A'));
        assert_eq!(reference.base_at(5), Some(b'N'));
        assert_eq!(reference.base_at(6), None);
        assert_eq!(reference.len(), 5);
    }

    #[test]
    fn test_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let fasta_path = dir.path().join("ref.fa");
        let mut fasta = fs::File::create(&fasta_path).unwrap();
        fasta.write_all(b">chr1\nACGTACGTAC\n>chr2\nGGGG\n").unwrap();
        let mut fai = fs::File::create(dir.path().join("ref.fa.fai")).unwrap();
        fai.write_all(b"chr1\t10\t6\t10\t11\nchr2\t4\t23\t4\t5\n").unwrap();

        let buffer = Buffer::from_path(&fasta_path, 1).unwrap();
        assert_eq!(buffer.sequences().unwrap().len(), 2);
        let chr1 = buffer.chr_reference("chr1").unwrap();
        assert_eq!(chr1.len(), 10);
        assert_eq!(chr1.base_at(4), Some(b'T'));
        let chr2 = buffer.chr_reference("chr2").unwrap();
        assert_eq!(chr2.base_at(1), Some(b'G'));
        assert!(buffer.chr_reference("chr3").is_err());
    }
}
