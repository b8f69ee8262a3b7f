// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Interval filters restricting which reference positions are reported.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::bed;

use crate::region::Region;

/// Sorted, non-overlapping intervals per chromosome.
#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    intervals: HashMap<String, Vec<Region>>,
}

impl IntervalSet {
    /// Load intervals from a BED file (0-based, half-open) as 1-based inclusive regions.
    pub fn from_bed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = bed::Reader::from_file(path.as_ref())
            .with_context(|| format!("error opening BED file {}", path.as_ref().display()))?;
        let mut intervals = IntervalSet::default();
        for record in reader.records() {
            let record = record.context("error reading BED record")?;
            if record.end() <= record.start() {
                warn!(
                    "Skipping empty BED interval {}:{}-{}.",
                    record.chrom(),
                    record.start(),
                    record.end()
                );
                continue;
            }
            intervals.insert(record.chrom(), Region::new(record.start() + 1, record.end())?);
        }
        info!(
            "Loaded {} intervals on {} chromosomes.",
            intervals.len(),
            intervals.intervals.len()
        );
        Ok(intervals)
    }

    /// Insert an interval, merging it with overlapping or adjacent ones.
    pub fn insert(&mut self, chrom: &str, region: Region) {
        let regions = self
            .intervals
            .entry(chrom.to_owned())
            .or_insert_with(Vec::new);
        let mut merged = region;
        let mut result = Vec::with_capacity(regions.len() + 1);
        for existing in regions.drain(..) {
            if let Some(union) = merged.merge(&existing) {
                merged = union;
            } else {
                result.push(existing);
            }
        }
        result.push(merged);
        result.sort_by_key(|region| region.start());
        *regions = result;
    }

    pub fn chrom_intervals(&self, chrom: &str) -> Option<&[Region]> {
        self.intervals.get(chrom).map(|regions| regions.as_slice())
    }

    /// Parts of the given region covered by intervals of the chromosome.
    pub fn clip(&self, chrom: &str, region: &Region) -> Vec<Region> {
        self.chrom_intervals(chrom)
            .map(|intervals| {
                intervals
                    .iter()
                    .filter_map(|interval| interval.intersect(region))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.intervals.values().map(|regions| regions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn region(start: u64, end: u64) -> Region {
        Region::new(start, end).unwrap()
    }

    #[test]
    fn test_insert_merges() {
        let mut intervals = IntervalSet::default();
        intervals.insert("chr1", region(100, 200));
        intervals.insert("chr1", region(300, 400));
        intervals.insert("chr1", region(150, 299));
        intervals.insert("chr1", region(10, 20));
        assert_eq!(
            intervals.chrom_intervals("chr1").unwrap(),
            &[region(10, 20), region(100, 400)]
        );
        assert!(intervals.chrom_intervals("chr2").is_none());
        assert_eq!(intervals.len(), 2);
    }

    #[test]
    fn test_clip() {
        let mut intervals = IntervalSet::default();
        intervals.insert("chr1", region(990, 1010));
        intervals.insert("chr1", region(1500, 1500));
        assert_eq!(
            intervals.clip("chr1", &region(1001, 2000)),
            vec![region(1001, 1010), region(1500, 1500)]
        );
        assert!(intervals.clip("chr2", &region(1001, 2000)).is_empty());
    }

    #[test]
    fn test_from_bed() {
        let mut bed = tempfile::NamedTempFile::new().unwrap();
        bed.write_all(b"chr1\t498\t501\nchr1\t10\t10\nchr2\t0\t5\n").unwrap();
        let intervals = IntervalSet::from_bed(bed.path()).unwrap();
        assert_eq!(intervals.chrom_intervals("chr1").unwrap(), &[region(499, 501)]);
        assert_eq!(intervals.chrom_intervals("chr2").unwrap(), &[region(1, 5)]);
    }
}
