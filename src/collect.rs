// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Driving a region state manager over the reads of one chromosome.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use progress_logger::ProgressLogger;
use rust_htslib::bam::{self, Read as BamRead};

use crate::alignment::{AlignmentSet, Read};
use crate::alleles::CandidateAllele;
use crate::batch::CandidateBatch;
use crate::config::ManagerConfig;
use crate::intervals::IntervalSet;
use crate::manager::RegionStateManager;
use crate::reference::{self, ChrReference};
use crate::region::Region;
use crate::utils::SimpleCounter;

#[derive(Hash, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr, Display, Debug)]
pub enum SkipReason {
    #[strum(serialize = "unmapped reads")]
    Unmapped,
    #[strum(serialize = "secondary or supplementary alignments")]
    Secondary,
    #[strum(serialize = "duplicate reads")]
    Duplicate,
    #[strum(serialize = "reads failing quality checks")]
    QcFail,
    #[strum(serialize = "reads below the minimum mapping quality")]
    LowMappingQuality,
    #[strum(serialize = "reads without stored sequence")]
    MissingSequence,
}

/// A processed batch as it is reported.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct BatchSummary {
    chromosome: String,
    cleared_regions: Vec<Region>,
    max_cleared_position: Option<u64>,
    candidates: Vec<CandidateAllele>,
}

impl BatchSummary {
    pub fn new(chromosome: &str, batch: CandidateBatch) -> Self {
        let cleared_regions = batch
            .cleared_regions()
            .map(|regions| regions.to_vec())
            .unwrap_or_default();
        let max_cleared_position = batch.max_cleared_position();
        BatchSummary {
            chromosome: chromosome.to_owned(),
            cleared_regions,
            max_cleared_position,
            candidates: batch.into_candidates(),
        }
    }
}

#[derive(Debug, Clone, new)]
pub struct Collector {
    config: ManagerConfig,
    intervals: Option<Arc<IntervalSet>>,
}

impl Collector {
    fn manager(&self) -> Result<RegionStateManager> {
        let manager = RegionStateManager::from_config(&self.config)?;
        Ok(match &self.intervals {
            Some(intervals) => manager.with_intervals(Arc::clone(intervals)),
            None => manager,
        })
    }

    fn skip_reason(&self, record: &bam::Record) -> Option<SkipReason> {
        if record.is_unmapped() {
            Some(SkipReason::Unmapped)
        } else if self.config.skip_secondary() && (record.is_secondary() || record.is_supplementary())
        {
            Some(SkipReason::Secondary)
        } else if self.config.skip_duplicates() && record.is_duplicate() {
            Some(SkipReason::Duplicate)
        } else if record.is_quality_check_failed() {
            Some(SkipReason::QcFail)
        } else if record.mapq() < self.config.min_mapping_quality() {
            Some(SkipReason::LowMappingQuality)
        } else if record.seq_len() == 0 {
            Some(SkipReason::MissingSequence)
        } else {
            None
        }
    }

    /// Feed position-sorted alignment sets and candidates of one chromosome through a fresh
    /// manager, handing every non-empty batch to `emit`.
    pub fn process_reads<I, E>(
        &self,
        reference: &ChrReference,
        alignment_sets: I,
        candidates: Vec<CandidateAllele>,
        mut emit: E,
    ) -> Result<()>
    where
        I: IntoIterator<Item = Result<AlignmentSet>>,
        E: FnMut(CandidateBatch) -> Result<()>,
    {
        let mut manager = self.manager()?;
        let mut candidates = candidates.into_iter().peekable();

        let mut release = |manager: &mut RegionStateManager, up_to: Option<u64>| -> Result<()> {
            if let Some(batch) = manager.get_candidates_to_process(up_to, Some(reference)) {
                manager.done_processing(&batch);
                if !batch.is_empty() {
                    emit(batch)?;
                }
            }
            Ok(())
        };

        for alignment_set in alignment_sets {
            let alignment_set = alignment_set?;
            let position = alignment_set.partner_read1().position();
            while let Some(candidate) =
                candidates.next_if(|candidate| candidate.reference_position() < position)
            {
                manager.add_candidates(Some(candidate))?;
            }
            release(&mut manager, Some(position))?;
            manager.add_allele_counts(&alignment_set)?;
        }

        manager.add_candidates(candidates)?;
        release(&mut manager, None)?;
        debug!(
            "Finished {} using {} windows.",
            reference.name(),
            manager.allocated_windows()
        );
        Ok(())
    }

    /// Process all reads of the given contig in an indexed BAM file.
    pub fn process_bam<P: AsRef<Path>>(
        &self,
        bam_path: P,
        reference_buffer: &reference::Buffer,
        contig: &str,
        candidates: Vec<CandidateAllele>,
    ) -> Result<Vec<BatchSummary>> {
        let mut bam_reader = bam::IndexedReader::from_path(bam_path.as_ref())?;
        if bam_reader.header().tid(contig.as_bytes()).is_none() {
            warn!("Contig {} not found in BAM file, skipping it.", contig);
            return Ok(Vec::new());
        }
        bam_reader.fetch(contig)?;
        let reference = reference_buffer.chr_reference(contig)?;
        info!("Processing {}.", contig);

        let mut skips = SimpleCounter::default();
        let mut progress_logger = ProgressLogger::builder()
            .with_items_name("reads")
            .with_frequency(std::time::Duration::from_secs(20))
            .start();

        let alignment_sets = bam_reader.records().filter_map(|record| match record {
            Err(err) => Some(Err(err.into())),
            Ok(record) => {
                progress_logger.update(1u64);
                if let Some(reason) = self.skip_reason(&record) {
                    skips.incr(reason);
                    None
                } else {
                    Some(Read::from_record(&record, contig).map(AlignmentSet::single))
                }
            }
        });

        let mut summaries = Vec::new();
        self.process_reads(&reference, alignment_sets, candidates, |batch| {
            summaries.push(BatchSummary::new(contig, batch));
            Ok(())
        })?;

        progress_logger.stop();
        skips.log_summary(contig);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alleles::{AlleleCategory, DirectionType};
    use crate::config::ManagerConfigBuilder;
    use rust_htslib::bam::record::{Cigar, CigarString};

    const SECONDARY_FLAG: u16 = 0x100;

    fn reference() -> ChrReference {
        ChrReference::new(
            "chr1".to_owned(),
            Arc::new(b"ACGT".iter().cycle().take(5000).cloned().collect()),
        )
    }

    fn alignment_set(position: u64, len: usize) -> Result<AlignmentSet> {
        let sequence: Vec<u8> = b"ACGT"
            .iter()
            .cycle()
            .skip((position as usize - 1) % 4)
            .take(len)
            .cloned()
            .collect();
        Ok(AlignmentSet::single(Read::with_direction(
            "chr1",
            position,
            sequence,
            vec![30; len],
            CigarString(vec![Cigar::Match(len as u32)]),
            DirectionType::Forward,
        )?))
    }

    #[test]
    fn test_process_reads() {
        let collector = Collector::new(ManagerConfig::default(), None);
        let reads = vec![
            alignment_set(990, 20),
            alignment_set(1450, 100),
            alignment_set(2100, 50),
            alignment_set(3500, 50),
        ];
        let candidates = vec![
            CandidateAllele::new("chr1", 995, "T", "A", AlleleCategory::Snv).with_support([1, 0, 0]),
            CandidateAllele::new("chr1", 1500, "C", "T", AlleleCategory::Snv).with_support([2, 0, 0]),
        ];

        let mut batches = Vec::new();
        collector
            .process_reads(&reference(), reads, candidates, |batch| {
                batches.push(batch);
                Ok(())
            })
            .unwrap();

        let cleared: Vec<Vec<u64>> = batches.iter().map(|b| b.window_keys().to_vec()).collect();
        // each read start crosses into a new window, the final flush releases the last one
        assert_eq!(cleared, vec![vec![1], vec![2], vec![3], vec![4]]);
        assert_eq!(batches[0].candidates().len(), 1);
        assert_eq!(batches[1].candidates()[0].reference_position(), 1500);
        assert_eq!(batches[1].max_cleared_position(), Some(2000));
        assert!(!batches[2].has_candidates());
    }

    #[test]
    fn test_skip_record_without_sequence() {
        let config = ManagerConfigBuilder::default()
            .skip_secondary(false)
            .build()
            .unwrap();
        let collector = Collector::new(config, None);

        let mut record = bam::Record::new();
        record.set(b"read1", Some(&CigarString(vec![Cigar::Match(4)])), b"", &[]);
        record.set_tid(0);
        record.set_pos(99);
        record.set_flags(SECONDARY_FLAG);
        assert!(Read::from_record(&record, "chr1").is_err());
        assert_eq!(collector.skip_reason(&record), Some(SkipReason::MissingSequence));

        record.set(
            b"read1",
            Some(&CigarString(vec![Cigar::Match(4)])),
            b"ACGT",
            &[30, 30, 30, 30],
        );
        assert_eq!(collector.skip_reason(&record), None);
        assert!(Read::from_record(&record, "chr1").is_ok());
    }

    #[test]
    fn test_process_reads_with_reference() {
        let mut config = ManagerConfig::default();
        config.set_include_reference_alleles(true);
        let collector = Collector::new(config, None);
        let mut batches = Vec::new();
        collector
            .process_reads(&reference(), vec![alignment_set(100, 10)], Vec::new(), |batch| {
                batches.push(batch);
                Ok(())
            })
            .unwrap();
        assert_eq!(batches.len(), 1);
        let candidates = batches[0].candidates();
        assert_eq!(candidates.len(), 10);
        assert!(candidates.iter().all(|c| c.is_reference() && c.total_support() == 1));
    }

    #[test]
    fn test_batch_summary() {
        let mut batch = CandidateBatch::default();
        batch.add_cleared_window(2, Region::new(1001, 2000).unwrap());
        let summary = BatchSummary::new("chr1", batch);
        assert_eq!(summary.max_cleared_position(), &Some(2000));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"chromosome\":\"chr1\""));
    }
}
