// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Routing of read evidence and candidates into fixed-size windows, and extraction of
//! the windows that are complete enough to be processed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use rust_htslib::bam::record::Cigar;

use crate::alignment::{AlignmentSet, Read};
use crate::alleles::{AlleleType, CandidateAllele, DirectionType};
use crate::batch::CandidateBatch;
use crate::config::ManagerConfig;
use crate::errors::Error;
use crate::intervals::IntervalSet;
use crate::reference::ChrReference;
use crate::region::{Region, RegionState};

/// Point queries on accumulated allele evidence.
pub trait AlleleSource {
    /// Number of bases of the given type and direction observed at a position.
    fn allele_count(
        &self,
        position: u64,
        allele_type: AlleleType,
        direction: DirectionType,
    ) -> Result<u32>;

    fn gapped_mnv_ref_count(&self, position: u64) -> Result<u32>;
}

/// Key of the window containing the given 1-based position.
pub fn window_key(position: u64, block_size: u64) -> u64 {
    (position + block_size - 1) / block_size
}

/// Manages the windows of one chromosome.
///
/// Window storage lives in an arena. Windows acknowledged via `done_processing` are put
/// on a free list and reset for reuse, so peak memory is bounded by the number of windows
/// in flight instead of the chromosome length.
#[derive(Debug)]
pub struct RegionStateManager {
    block_size: u64,
    min_basecall_quality: u8,
    include_reference_alleles: bool,
    intervals: Option<Arc<IntervalSet>>,
    windows: Vec<RegionState>,
    free: Vec<usize>,
    active: BTreeMap<u64, usize>,
    last_accessed: Option<(u64, usize)>,
    last_up_to_key: Option<u64>,
}

impl RegionStateManager {
    pub fn new(
        block_size: u64,
        min_basecall_quality: u8,
        include_reference_alleles: bool,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::InvalidBlockSize.into());
        }
        Ok(RegionStateManager {
            block_size,
            min_basecall_quality,
            include_reference_alleles,
            intervals: None,
            windows: Vec::new(),
            free: Vec::new(),
            active: BTreeMap::new(),
            last_accessed: None,
            last_up_to_key: None,
        })
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self> {
        Self::new(
            config.block_size(),
            config.min_basecall_quality(),
            config.include_reference_alleles(),
        )
    }

    /// Restrict reported reference positions to the given intervals.
    pub fn with_intervals(mut self, intervals: Arc<IntervalSet>) -> Self {
        self.intervals = Some(intervals);
        self
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Number of windows currently holding unprocessed evidence.
    pub fn active_windows(&self) -> usize {
        self.active.len()
    }

    /// Number of retired windows waiting for reuse.
    pub fn pooled_windows(&self) -> usize {
        self.free.len()
    }

    /// Total number of windows ever allocated.
    pub fn allocated_windows(&self) -> usize {
        self.windows.len()
    }

    fn window_index(&mut self, position: u64) -> Result<usize> {
        if position == 0 {
            return Err(Error::InvalidPosition { pos: position }.into());
        }
        let key = window_key(position, self.block_size);
        if let Some((cached_key, index)) = self.last_accessed {
            if cached_key == key {
                return Ok(index);
            }
        }

        let index = match self.active.get(&key) {
            Some(&index) => index,
            None => {
                let region = Region::new((key - 1) * self.block_size + 1, key * self.block_size)?;
                let index = if let Some(index) = self.free.pop() {
                    debug!("Reusing pooled window for {}.", region);
                    self.windows[index].reset(region);
                    index
                } else {
                    debug!("Allocating window for {}.", region);
                    self.windows.push(RegionState::new(region));
                    self.windows.len() - 1
                };
                self.active.insert(key, index);
                index
            }
        };
        self.last_accessed = Some((key, index));
        Ok(index)
    }

    /// Window containing the given position, created (or recycled) if necessary.
    pub fn get_or_create_window(&mut self, position: u64) -> Result<&mut RegionState> {
        let index = self.window_index(position)?;
        Ok(&mut self.windows[index])
    }

    pub fn add_candidates<I>(&mut self, candidates: I) -> Result<()>
    where
        I: IntoIterator<Item = CandidateAllele>,
    {
        for candidate in candidates {
            self.get_or_create_window(candidate.reference_position())?
                .add_candidate(candidate)?;
        }
        Ok(())
    }

    fn add_allele_count(
        &mut self,
        position: u64,
        allele_type: AlleleType,
        direction: DirectionType,
    ) -> Result<()> {
        self.get_or_create_window(position)?
            .add_allele_count(position, allele_type, direction);
        Ok(())
    }

    /// Count the bases of all reads in the given set.
    pub fn add_allele_counts(&mut self, alignment_set: &AlignmentSet) -> Result<()> {
        for read in alignment_set.reads() {
            self.add_read_counts(read)?;
        }
        Ok(())
    }

    fn add_read_counts(&mut self, read: &Read) -> Result<()> {
        let mut read_index = 0;
        let mut ref_pos = read.position();
        let mut last_direction = None;

        for op in read.cigar().iter() {
            let len = op.len() as usize;
            match op {
                Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => {
                    for _ in 0..len {
                        let direction = read.directions()[read_index];
                        let mapped = read.position_map()[read_index];
                        if mapped > 0 {
                            let allele_type = if read.qualities()[read_index] < self.min_basecall_quality {
                                AlleleType::N
                            } else {
                                AlleleType::from_base(read.sequence()[read_index])
                            };
                            self.add_allele_count(mapped as u64, allele_type, direction)?;
                        }
                        last_direction = Some(direction);
                        read_index += 1;
                    }
                    ref_pos += len as u64;
                }
                Cigar::Ins(_) | Cigar::SoftClip(_) => read_index += len,
                Cigar::Del(_) => {
                    // at the front edge, the deletion inherits the direction of the following base
                    let direction =
                        last_direction.or_else(|| read.directions().get(read_index).cloned());
                    if let Some(direction) = direction {
                        for pos in ref_pos..ref_pos + len as u64 {
                            self.add_allele_count(pos, AlleleType::Deletion, direction)?;
                        }
                    }
                    ref_pos += len as u64;
                }
                Cigar::RefSkip(_) => ref_pos += len as u64,
                Cigar::HardClip(_) | Cigar::Pad(_) => (),
            }
        }
        Ok(())
    }

    /// Add reference support for gapped MNVs, given as position to count.
    pub fn add_gapped_mnv_ref_counts(&mut self, counts: &HashMap<u64, u32>) -> Result<()> {
        for (&position, &count) in counts {
            self.get_or_create_window(position)?
                .add_gapped_mnv_ref_count(position, count);
        }
        Ok(())
    }

    /// Collect all windows that can be safely processed given that all reads starting before
    /// `up_to` have been added. `None` flushes every remaining window.
    ///
    /// Returns `None` if `up_to` falls into the same window as the previous call, because
    /// nothing new can have become eligible then.
    /// Windows are released in position order; the first window holding a candidate that
    /// reaches beyond `up_to` stops the walk, keeping it and all later windows.
    pub fn get_candidates_to_process(
        &mut self,
        up_to: Option<u64>,
        reference: Option<&ChrReference>,
    ) -> Option<CandidateBatch> {
        let up_to_key = up_to.map(|up_to| window_key(up_to, self.block_size));
        if up_to_key.is_some() && up_to_key == self.last_up_to_key {
            return None;
        }

        let mut batch = CandidateBatch::default();
        let mut held_back = false;
        for (&key, &index) in &self.active {
            let window = &self.windows[index];
            if let Some(up_to) = up_to {
                if window.end() >= up_to {
                    break;
                }
                if window.max_allele_endpoint() > up_to {
                    debug!(
                        "Holding back window {} until position {} has been passed.",
                        window.region(),
                        window.max_allele_endpoint()
                    );
                    held_back = true;
                    break;
                }
            }
            // a chromosome without intervals gets an empty filter
            let interval_filter = match (&self.intervals, reference) {
                (Some(intervals), Some(reference)) => {
                    Some(intervals.clip(reference.name(), window.region()))
                }
                _ => None,
            };
            batch.add(window.all_candidates(
                self.include_reference_alleles,
                reference,
                interval_filter.as_deref(),
            ));
            batch.add_cleared_window(key, *window.region());
        }

        // a held back window has to be reconsidered by the next call
        self.last_up_to_key = if held_back { None } else { up_to_key };
        Some(batch)
    }

    /// Retire the windows of a processed batch into the pool.
    /// Keys that are no longer active are ignored.
    pub fn done_processing(&mut self, batch: &CandidateBatch) {
        for key in batch.window_keys() {
            if let Some(index) = self.active.remove(key) {
                self.free.push(index);
                if let Some((cached_key, _)) = self.last_accessed {
                    if cached_key == *key {
                        self.last_accessed = None;
                    }
                }
            }
        }
    }
}

impl AlleleSource for RegionStateManager {
    fn allele_count(
        &self,
        position: u64,
        allele_type: AlleleType,
        direction: DirectionType,
    ) -> Result<u32> {
        match self.active.get(&window_key(position, self.block_size)) {
            Some(&index) => self.windows[index].allele_count(position, allele_type, direction),
            None => Ok(0),
        }
    }

    fn gapped_mnv_ref_count(&self, position: u64) -> Result<u32> {
        match self.active.get(&window_key(position, self.block_size)) {
            Some(&index) => self.windows[index].gapped_mnv_ref_count(position),
            None => Ok(0),
        }
    }
}
