use crate::alleles::CandidateAllele;
use crate::region::Region;

/// Candidates and cleared windows released by one call to
/// `RegionStateManager::get_candidates_to_process`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateBatch {
    candidates: Vec<CandidateAllele>,
    cleared_regions: Vec<Region>,
    window_keys: Vec<u64>,
}

impl CandidateBatch {
    pub fn add<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = CandidateAllele>,
    {
        self.candidates.extend(candidates);
    }

    pub fn add_cleared_window(&mut self, key: u64, region: Region) {
        self.window_keys.push(key);
        self.cleared_regions.push(region);
    }

    pub fn candidates(&self) -> &[CandidateAllele] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<CandidateAllele> {
        self.candidates
    }

    /// Cleared windows, `None` if no window was cleared.
    pub fn cleared_regions(&self) -> Option<&[Region]> {
        if self.cleared_regions.is_empty() {
            None
        } else {
            Some(&self.cleared_regions)
        }
    }

    /// Highest end position among the cleared windows.
    pub fn max_cleared_position(&self) -> Option<u64> {
        self.cleared_regions.iter().map(|region| region.end()).max()
    }

    pub fn window_keys(&self) -> &[u64] {
        &self.window_keys
    }

    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.window_keys.is_empty()
    }
}
