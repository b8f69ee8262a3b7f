// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeMap;
use std::ops::Deref;

use anyhow::Result;
use ndarray::Array3;

use crate::alleles::{
    AlleleCategory, AlleleType, CandidateAllele, DirectionType, NUM_ALLELE_TYPES,
    NUM_DIRECTION_TYPES,
};
use crate::errors::Error;
use crate::reference::ChrReference;

use super::Region;

/// Evidence collected for one window of the genome.
///
/// Holds a dense `[position][allele type][direction]` count matrix, a per-position
/// counter of reference support for gapped MNVs and the sparse set of non-reference
/// candidates starting inside the window. Reference alleles are never stored;
/// they are synthesized from the count matrix when candidates are requested.
#[derive(Debug, Clone)]
pub struct RegionState {
    region: Region,
    counts: Array3<u32>,
    gapped_mnv_ref_counts: Vec<u32>,
    candidates: BTreeMap<u64, Vec<CandidateAllele>>,
    max_allele_endpoint: u64,
}

impl RegionState {
    pub fn new(region: Region) -> Self {
        let size = region.size() as usize;
        RegionState {
            region,
            counts: Array3::zeros((size, NUM_ALLELE_TYPES, NUM_DIRECTION_TYPES)),
            gapped_mnv_ref_counts: vec![0; size],
            candidates: BTreeMap::new(),
            max_allele_endpoint: 0,
        }
    }

    /// Move this state to new bounds, clearing all evidence.
    /// Storage is kept as long as the window size does not change.
    pub fn reset(&mut self, region: Region) {
        let size = region.size() as usize;
        if size == self.region.size() as usize {
            self.counts.fill(0);
            self.gapped_mnv_ref_counts.iter_mut().for_each(|count| *count = 0);
        } else {
            self.counts = Array3::zeros((size, NUM_ALLELE_TYPES, NUM_DIRECTION_TYPES));
            self.gapped_mnv_ref_counts = vec![0; size];
        }
        self.candidates.clear();
        self.max_allele_endpoint = 0;
        self.region = region;
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Furthest reference position reached by any multi-base candidate added so far.
    pub fn max_allele_endpoint(&self) -> u64 {
        self.max_allele_endpoint
    }

    fn offset(&self, position: u64) -> Option<usize> {
        if self.region.contains_position(position) {
            Some((position - self.region.start()) as usize)
        } else {
            None
        }
    }

    fn checked_offset(&self, position: u64) -> Result<usize> {
        self.offset(position).ok_or_else(|| {
            Error::PositionOutOfBounds {
                pos: position,
                start: self.region.start(),
                end: self.region.end(),
            }
            .into()
        })
    }

    /// Add a candidate, accumulating its support into an already stored equal candidate.
    pub fn add_candidate(&mut self, candidate: CandidateAllele) -> Result<()> {
        if candidate.is_reference() {
            return Err(Error::ReferenceCandidate {
                chrom: candidate.chromosome().to_owned(),
                pos: candidate.reference_position(),
            }
            .into());
        }
        if self.offset(candidate.reference_position()).is_none() {
            return Err(Error::CandidateOutOfBounds {
                chrom: candidate.chromosome().to_owned(),
                pos: candidate.reference_position(),
                start: self.region.start(),
                end: self.region.end(),
            }
            .into());
        }

        self.max_allele_endpoint = self.max_allele_endpoint.max(candidate.endpoint());

        let candidates = self
            .candidates
            .entry(candidate.reference_position())
            .or_insert_with(Vec::new);
        if let Some(existing) = candidates.iter_mut().find(|c| **c == candidate) {
            existing.add_support(candidate.support_by_direction());
        } else {
            candidates.push(candidate);
        }
        Ok(())
    }

    /// Count a single observed base. Positions outside of the window are ignored.
    pub fn add_allele_count(
        &mut self,
        position: u64,
        allele_type: AlleleType,
        direction: DirectionType,
    ) {
        if let Some(offset) = self.offset(position) {
            self.counts[[offset, allele_type.index(), direction.index()]] += 1;
        }
    }

    /// Add reference support for gapped MNVs. Positions outside of the window are ignored.
    pub fn add_gapped_mnv_ref_count(&mut self, position: u64, count: u32) {
        if let Some(offset) = self.offset(position) {
            self.gapped_mnv_ref_counts[offset] += count;
        }
    }

    pub fn allele_count(
        &self,
        position: u64,
        allele_type: AlleleType,
        direction: DirectionType,
    ) -> Result<u32> {
        let offset = self.checked_offset(position)?;
        Ok(self.counts[[offset, allele_type.index(), direction.index()]])
    }

    pub fn gapped_mnv_ref_count(&self, position: u64) -> Result<u32> {
        let offset = self.checked_offset(position)?;
        Ok(self.gapped_mnv_ref_counts[offset])
    }

    fn total_count(&self, offset: usize) -> u32 {
        let mut total = 0;
        for allele in 0..NUM_ALLELE_TYPES {
            for direction in 0..NUM_DIRECTION_TYPES {
                total += self.counts[[offset, allele, direction]];
            }
        }
        total
    }

    fn reference_candidate(
        &self,
        position: u64,
        reference: &ChrReference,
        report_uncovered: bool,
    ) -> Option<CandidateAllele> {
        let offset = self.offset(position)?;
        let base = reference.base_at(position)?.to_ascii_uppercase();
        let allele_type = AlleleType::from_base(base);
        if allele_type == AlleleType::N {
            return None;
        }
        if !report_uncovered && self.total_count(offset) == 0 {
            return None;
        }

        let mut support = [0; NUM_DIRECTION_TYPES];
        for (direction, count) in support.iter_mut().enumerate() {
            *count = self.counts[[offset, allele_type.index(), direction]];
        }
        let allele = (base as char).to_string();
        Some(
            CandidateAllele::new(
                reference.name(),
                position,
                &allele,
                &allele,
                AlleleCategory::Reference,
            )
            .with_support(support),
        )
    }

    /// All stored candidates of this window, ordered by position.
    ///
    /// With `include_reference_alleles` and a chromosome reference, a reference candidate is
    /// synthesized per covered position. If `interval_filter` is given, reference candidates are
    /// restricted to the window positions inside the filter, and reported even without coverage.
    pub fn all_candidates(
        &self,
        include_reference_alleles: bool,
        reference: Option<&ChrReference>,
        interval_filter: Option<&[Region]>,
    ) -> Vec<CandidateAllele> {
        let mut candidates: Vec<CandidateAllele> =
            self.candidates.values().flatten().cloned().collect();

        if let (true, Some(reference)) = (include_reference_alleles, reference) {
            match interval_filter {
                Some(intervals) => {
                    for interval in intervals {
                        if let Some(target) = interval.intersect(&self.region) {
                            candidates.extend(
                                target
                                    .positions()
                                    .filter_map(|pos| self.reference_candidate(pos, reference, true)),
                            );
                        }
                    }
                }
                None => {
                    candidates.extend(
                        self.region
                            .positions()
                            .filter_map(|pos| self.reference_candidate(pos, reference, false)),
                    );
                }
            }
            // stable, keeps insertion order of variants at the same position
            candidates.sort_by_key(|c| (c.reference_position(), !c.is_reference()));
        }

        candidates
    }
}

impl Deref for RegionState {
    type Target = Region;

    fn deref(&self) -> &Self::Target {
        &self.region
    }
}
