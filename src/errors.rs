use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("reference alleles are derived from allele counts and cannot be added as candidates ({chrom}:{pos})")]
    ReferenceCandidate { chrom: String, pos: u64 },
    #[error("candidate at {chrom}:{pos} lies outside of window {start}-{end}")]
    CandidateOutOfBounds {
        chrom: String,
        pos: u64,
        start: u64,
        end: u64,
    },
    #[error("position {pos} lies outside of window {start}-{end}")]
    PositionOutOfBounds { pos: u64, start: u64, end: u64 },
    #[error("invalid region {start}-{end}: positions are 1-based and end must not be smaller than start")]
    InvalidRegion { start: u64, end: u64 },
    #[error("invalid position {pos}: positions are 1-based")]
    InvalidPosition { pos: u64 },
    #[error("invalid block size: must be greater than zero")]
    InvalidBlockSize,
    #[error("invalid direction information '{value}', must be a run-length string over 'F', 'R' and 'S' (e.g. 5F10S5R)")]
    InvalidDirectionInfo { value: String },
    #[error("direction information covers {covered} bases but read has {len} bases")]
    DirectionLengthMismatch { covered: usize, len: usize },
    #[error("read sequence, qualities and cigar disagree in length ({seq} bases, {qual} qualities, {cigar} cigar query bases)")]
    InconsistentRead { seq: usize, qual: usize, cigar: usize },
    #[error("contig {contig} not found in reference")]
    UnknownContig { contig: String },
    #[error("record {i} in candidate BCF/VCF does not define a chromosome")]
    RecordMissingChrom { i: usize },
}
