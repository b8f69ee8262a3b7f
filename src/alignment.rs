// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Aligned reads as consumed by the region state manager.

use anyhow::Result;
use rust_htslib::bam;
use rust_htslib::bam::record::{Aux, Cigar, CigarString};

use crate::alleles::DirectionType;
use crate::errors::Error;

/// Aux tag holding per-base directions of stitched read pairs, e.g. `5F10S5R`.
pub const DIRECTION_TAG: &[u8] = b"XD";

/// A decoded, aligned read.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Read {
    #[getset(get = "pub")]
    chromosome: String,
    /// 1-based reference position of the first aligned base.
    #[getset(get_copy = "pub")]
    position: u64,
    #[getset(get = "pub")]
    sequence: Vec<u8>,
    #[getset(get = "pub")]
    qualities: Vec<u8>,
    #[getset(get = "pub")]
    cigar: CigarString,
    #[getset(get = "pub")]
    directions: Vec<DirectionType>,
    /// 1-based reference position per sequenced base, -1 for bases not aligned to the reference.
    #[getset(get = "pub")]
    position_map: Vec<i64>,
}

fn consumes_query(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

impl Read {
    pub fn new(
        chromosome: &str,
        position: u64,
        sequence: Vec<u8>,
        qualities: Vec<u8>,
        cigar: CigarString,
        directions: Vec<DirectionType>,
    ) -> Result<Self> {
        if position == 0 {
            return Err(Error::InvalidPosition { pos: position }.into());
        }
        let query_len: usize = cigar
            .iter()
            .filter(|op| consumes_query(op))
            .map(|op| op.len() as usize)
            .sum();
        if query_len != sequence.len() || qualities.len() != sequence.len() {
            return Err(Error::InconsistentRead {
                seq: sequence.len(),
                qual: qualities.len(),
                cigar: query_len,
            }
            .into());
        }
        if directions.len() != sequence.len() {
            return Err(Error::DirectionLengthMismatch {
                covered: directions.len(),
                len: sequence.len(),
            }
            .into());
        }

        let position_map = Self::build_position_map(position, &cigar, sequence.len());
        Ok(Read {
            chromosome: chromosome.to_owned(),
            position,
            sequence,
            qualities,
            cigar,
            directions,
            position_map,
        })
    }

    /// Create a read whose bases all share the same direction.
    pub fn with_direction(
        chromosome: &str,
        position: u64,
        sequence: Vec<u8>,
        qualities: Vec<u8>,
        cigar: CigarString,
        direction: DirectionType,
    ) -> Result<Self> {
        let directions = vec![direction; sequence.len()];
        Self::new(chromosome, position, sequence, qualities, cigar, directions)
    }

    /// Convert an aligned BAM record.
    pub fn from_record(record: &bam::Record, chromosome: &str) -> Result<Self> {
        let sequence = record.seq().as_bytes();
        let directions = match record.aux(DIRECTION_TAG) {
            Ok(Aux::String(directions)) => parse_directions(directions, sequence.len())?,
            _ => {
                let direction = if record.is_reverse() {
                    DirectionType::Reverse
                } else {
                    DirectionType::Forward
                };
                vec![direction; sequence.len()]
            }
        };
        Self::new(
            chromosome,
            record.pos() as u64 + 1,
            sequence,
            record.qual().to_vec(),
            record.cigar().take(),
            directions,
        )
    }

    fn build_position_map(position: u64, cigar: &CigarString, len: usize) -> Vec<i64> {
        let mut position_map = Vec::with_capacity(len);
        let mut ref_pos = position as i64;
        for op in cigar.iter() {
            let op_len = op.len() as i64;
            match op {
                Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => {
                    position_map.extend(ref_pos..ref_pos + op_len);
                    ref_pos += op_len;
                }
                Cigar::Ins(_) | Cigar::SoftClip(_) => {
                    position_map.extend(std::iter::repeat(-1).take(op_len as usize))
                }
                Cigar::Del(_) | Cigar::RefSkip(_) => ref_pos += op_len,
                Cigar::HardClip(_) | Cigar::Pad(_) => (),
            }
        }
        position_map
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Parse run-length encoded per-base directions, e.g. `5F10S5R`.
pub(crate) fn parse_directions(value: &str, len: usize) -> Result<Vec<DirectionType>> {
    let invalid = || Error::InvalidDirectionInfo {
        value: value.to_owned(),
    };
    let mut directions = Vec::with_capacity(len);
    let mut count: Option<usize> = None;
    for c in value.chars() {
        if let Some(digit) = c.to_digit(10) {
            count = Some(count.unwrap_or(0) * 10 + digit as usize);
            continue;
        }
        let direction = match c {
            'F' => DirectionType::Forward,
            'R' => DirectionType::Reverse,
            'S' => DirectionType::Stitched,
            _ => return Err(invalid().into()),
        };
        match count.take() {
            Some(n) if n > 0 => directions.extend(std::iter::repeat(direction).take(n)),
            _ => return Err(invalid().into()),
        }
    }
    if count.is_some() {
        return Err(invalid().into());
    }
    if directions.len() != len {
        return Err(Error::DirectionLengthMismatch {
            covered: directions.len(),
            len,
        }
        .into());
    }
    Ok(directions)
}

/// A read or a pair of mates that are processed together.
#[derive(Debug, Clone, new, Getters)]
pub struct AlignmentSet {
    #[getset(get = "pub")]
    partner_read1: Read,
    #[getset(get = "pub")]
    partner_read2: Option<Read>,
}

impl AlignmentSet {
    pub fn single(read: Read) -> Self {
        AlignmentSet::new(read, None)
    }

    pub fn reads(&self) -> impl Iterator<Item = &Read> {
        std::iter::once(&self.partner_read1).chain(self.partner_read2.iter())
    }
}
