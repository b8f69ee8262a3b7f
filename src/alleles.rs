// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::hash::{Hash, Hasher};

/// Number of distinct `AlleleType`s, i.e. the second dimension of a window's count matrix.
pub const NUM_ALLELE_TYPES: usize = 6;
/// Number of distinct `DirectionType`s, i.e. the third dimension of a window's count matrix.
pub const NUM_DIRECTION_TYPES: usize = 3;

/// Base observed at a reference position.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum AlleleType {
    A,
    C,
    G,
    T,
    /// No-call, either an ambiguous base or a base below the quality threshold.
    N,
    Deletion,
}

impl AlleleType {
    pub fn from_base(base: u8) -> Self {
        match base.to_ascii_uppercase() {
            b'A' => AlleleType::A,
            b'C' => AlleleType::C,
            b'G' => AlleleType::G,
            b'T' => AlleleType::T,
            _ => AlleleType::N,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Direction of the read evidence behind a base.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum DirectionType {
    Forward,
    Reverse,
    /// Base covered by both mates of a stitched read pair.
    Stitched,
}

impl DirectionType {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum AlleleCategory {
    Snv,
    Insertion,
    Deletion,
    Mnv,
    Reference,
}

/// A putative variant allele together with its accumulated read support.
///
/// Equality and hashing only consider the identity of the allele
/// (chromosome, position, alleles and category), never its support.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, CopyGetters)]
pub struct CandidateAllele {
    #[getset(get = "pub")]
    chromosome: String,
    #[getset(get_copy = "pub")]
    reference_position: u64,
    #[getset(get = "pub")]
    reference_allele: String,
    #[getset(get = "pub")]
    alternate_allele: String,
    #[getset(get_copy = "pub")]
    category: AlleleCategory,
    #[getset(get = "pub")]
    support_by_direction: [u32; NUM_DIRECTION_TYPES],
}

impl CandidateAllele {
    pub fn new(
        chromosome: &str,
        reference_position: u64,
        reference_allele: &str,
        alternate_allele: &str,
        category: AlleleCategory,
    ) -> Self {
        CandidateAllele {
            chromosome: chromosome.to_owned(),
            reference_position,
            reference_allele: reference_allele.to_owned(),
            alternate_allele: alternate_allele.to_owned(),
            category,
            support_by_direction: [0; NUM_DIRECTION_TYPES],
        }
    }

    pub fn with_support(mut self, support_by_direction: [u32; NUM_DIRECTION_TYPES]) -> Self {
        self.support_by_direction = support_by_direction;
        self
    }

    /// Add the given directional support element-wise.
    pub fn add_support(&mut self, support_by_direction: &[u32; NUM_DIRECTION_TYPES]) {
        for (total, support) in self
            .support_by_direction
            .iter_mut()
            .zip(support_by_direction.iter())
        {
            *total = total.saturating_add(*support);
        }
    }

    pub fn support(&self, direction: DirectionType) -> u32 {
        self.support_by_direction[direction.index()]
    }

    pub fn total_support(&self) -> u32 {
        self.support_by_direction
            .iter()
            .fold(0u32, |total, support| total.saturating_add(*support))
    }

    /// Furthest reference position touched by this allele.
    pub fn endpoint(&self) -> u64 {
        match self.category {
            AlleleCategory::Deletion | AlleleCategory::Mnv => {
                self.reference_position + (self.reference_allele.len().max(1) as u64) - 1
            }
            AlleleCategory::Insertion => self.reference_position + 1,
            AlleleCategory::Snv | AlleleCategory::Reference => self.reference_position,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.category == AlleleCategory::Reference
    }
}

impl PartialEq for CandidateAllele {
    fn eq(&self, other: &Self) -> bool {
        self.reference_position == other.reference_position
            && self.category == other.category
            && self.chromosome == other.chromosome
            && self.reference_allele == other.reference_allele
            && self.alternate_allele == other.alternate_allele
    }
}

impl Eq for CandidateAllele {}

impl Hash for CandidateAllele {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chromosome.hash(state);
        self.reference_position.hash(state);
        self.reference_allele.hash(state);
        self.alternate_allele.hash(state);
        self.category.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_enum_sizes() {
        assert_eq!(AlleleType::iter().count(), NUM_ALLELE_TYPES);
        assert_eq!(DirectionType::iter().count(), NUM_DIRECTION_TYPES);
        for (i, allele_type) in AlleleType::iter().enumerate() {
            assert_eq!(allele_type.index(), i);
        }
    }

    #[test]
    fn test_allele_type_from_base() {
        assert_eq!(AlleleType::from_base(b'a'), AlleleType::A);
        assert_eq!(AlleleType::from_base(b'T'), AlleleType::T);
        assert_eq!(AlleleType::from_base(b'N'), AlleleType::N);
        assert_eq!(AlleleType::from_base(b'R'), AlleleType::N);
    }

    #[test]
    fn test_identity_ignores_support() {
        let a = CandidateAllele::new("chr1", 10, "A", "T", AlleleCategory::Snv).with_support([5, 0, 0]);
        let b = CandidateAllele::new("chr1", 10, "A", "T", AlleleCategory::Snv).with_support([0, 3, 1]);
        let c = CandidateAllele::new("chr1", 10, "A", "G", AlleleCategory::Snv);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_add_support() {
        let mut a = CandidateAllele::new("chr1", 10, "A", "T", AlleleCategory::Snv).with_support([5, 1, 0]);
        a.add_support(&[2, 0, 4]);
        assert_eq!(a.support_by_direction(), &[7, 1, 4]);
        assert_eq!(a.total_support(), 12);
        assert_eq!(a.support(DirectionType::Stitched), 4);
    }

    #[test]
    fn test_add_support_saturates() {
        let mut a = CandidateAllele::new("chr1", 10, "A", "T", AlleleCategory::Snv)
            .with_support([u32::MAX - 1, u32::MAX, 0]);
        a.add_support(&[5, 1, 0]);
        assert_eq!(a.support_by_direction(), &[u32::MAX, u32::MAX, 0]);
        assert_eq!(a.total_support(), u32::MAX);
    }

    #[test]
    fn test_endpoint() {
        let del = CandidateAllele::new("chr1", 998, "ACGTACGTACGTA", "A", AlleleCategory::Deletion);
        assert_eq!(del.endpoint(), 1010);
        let ins = CandidateAllele::new("chr1", 100, "A", "ATT", AlleleCategory::Insertion);
        assert_eq!(ins.endpoint(), 101);
        let mnv = CandidateAllele::new("chr1", 100, "AC", "GT", AlleleCategory::Mnv);
        assert_eq!(mnv.endpoint(), 101);
        let snv = CandidateAllele::new("chr1", 100, "A", "C", AlleleCategory::Snv);
        assert_eq!(snv.endpoint(), 100);
    }
}
