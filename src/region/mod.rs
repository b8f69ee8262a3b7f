// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use anyhow::Result;

use crate::errors::Error;

pub mod state;

pub use state::RegionState;

/// An inclusive, 1-based interval `[start, end]` on a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, CopyGetters)]
pub struct Region {
    #[getset(get_copy = "pub")]
    start: u64,
    #[getset(get_copy = "pub")]
    end: u64,
}

impl Region {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start == 0 || end < start {
            return Err(Error::InvalidRegion { start, end }.into());
        }
        Ok(Region { start, end })
    }

    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains_position(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }

    /// Returns true if `other` lies completely within this region.
    pub fn contains(&self, other: &Region) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if self.overlaps(other) {
            Some(Region {
                start: self.start.max(other.start),
                end: self.end.min(other.end),
            })
        } else {
            None
        }
    }

    /// Union of two overlapping or directly adjacent regions.
    /// Returns `None` if there is a gap between them.
    pub fn merge(&self, other: &Region) -> Option<Region> {
        if self.start <= other.end + 1 && other.start <= self.end + 1 {
            Some(Region {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            })
        } else {
            None
        }
    }

    pub(crate) fn positions(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_region() {
        assert!(Region::new(0, 10).is_err());
        assert!(Region::new(10, 9).is_err());
        assert!(Region::new(10, 10).is_ok());
    }

    #[test]
    fn test_size_and_containment() {
        let region = Region::new(1001, 2000).unwrap();
        assert_eq!(region.size(), 1000);
        assert!(region.contains_position(1001));
        assert!(region.contains_position(2000));
        assert!(!region.contains_position(1000));
        assert!(!region.contains_position(2001));
        assert!(region.contains(&Region::new(1500, 1600).unwrap()));
        assert!(!region.contains(&Region::new(1500, 2600).unwrap()));
    }

    #[test]
    fn test_overlap_and_intersect() {
        let a = Region::new(10, 20).unwrap();
        let b = Region::new(20, 30).unwrap();
        let c = Region::new(21, 30).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.intersect(&b), Some(Region::new(20, 20).unwrap()));
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_merge() {
        let a = Region::new(10, 20).unwrap();
        assert_eq!(
            a.merge(&Region::new(21, 30).unwrap()),
            Some(Region::new(10, 30).unwrap())
        );
        assert_eq!(
            a.merge(&Region::new(5, 12).unwrap()),
            Some(Region::new(5, 20).unwrap())
        );
        assert_eq!(a.merge(&Region::new(22, 30).unwrap()), None);
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(Region::new(1, 5).unwrap(), Region::new(1, 5).unwrap());
        assert_eq!(format!("{}", Region::new(1, 5).unwrap()), "1-5");
    }
}
