// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Candidate alleles given as VCF/BCF records.

use std::collections::HashMap;
use std::path::Path;
use std::str;

use anyhow::{Context, Result};
use rust_htslib::bcf::{self, Read};

use crate::alleles::{AlleleCategory, CandidateAllele};
use crate::errors;
use crate::utils::SimpleCounter;

#[derive(Hash, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr, Display, Debug)]
pub enum SkipReason {
    #[strum(serialize = "symbolic or breakend alleles")]
    Symbolic,
    #[strum(serialize = "complex alleles (neither SNV, MNV nor anchored indel)")]
    Complex,
    #[strum(serialize = "alleles equal to the reference")]
    Reference,
}

/// Classify an ALT allele against its REF allele.
pub fn classify(ref_allele: &[u8], alt_allele: &[u8]) -> Result<AlleleCategory, SkipReason> {
    if alt_allele.is_empty()
        || alt_allele.starts_with(b"<")
        || alt_allele
            .iter()
            .any(|base| matches!(base, b'[' | b']' | b'*' | b'.'))
    {
        return Err(SkipReason::Symbolic);
    }
    if ref_allele.eq_ignore_ascii_case(alt_allele) {
        return Err(SkipReason::Reference);
    }
    match (ref_allele.len(), alt_allele.len()) {
        (1, 1) => Ok(AlleleCategory::Snv),
        (r, a) if r == a => Ok(AlleleCategory::Mnv),
        (1, _) if ref_allele[0].eq_ignore_ascii_case(&alt_allele[0]) => {
            Ok(AlleleCategory::Insertion)
        }
        (_, 1) if ref_allele[0].eq_ignore_ascii_case(&alt_allele[0]) => {
            Ok(AlleleCategory::Deletion)
        }
        _ => Err(SkipReason::Complex),
    }
}

/// Candidates of one record, one per usable ALT allele.
pub fn collect_candidates(
    record: &bcf::Record,
    chrom: &str,
    skips: &mut SimpleCounter<SkipReason>,
) -> Vec<CandidateAllele> {
    let alleles = record.alleles();
    let ref_allele = alleles[0];
    let pos = record.pos() as u64 + 1;

    let mut candidates = Vec::new();
    for alt_allele in &alleles[1..] {
        match classify(ref_allele, alt_allele) {
            Ok(category) => candidates.push(CandidateAllele::new(
                chrom,
                pos,
                &String::from_utf8_lossy(ref_allele).to_ascii_uppercase(),
                &String::from_utf8_lossy(alt_allele).to_ascii_uppercase(),
                category,
            )),
            Err(reason) => skips.incr(reason),
        }
    }
    candidates
}

/// Load all candidates from a VCF/BCF file, grouped by chromosome and sorted by position.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Vec<CandidateAllele>>> {
    let mut reader = bcf::Reader::from_path(path.as_ref()).with_context(|| {
        format!("error opening candidate file {}", path.as_ref().display())
    })?;
    let header = reader.header().clone();
    let mut skips = SimpleCounter::default();
    let mut candidates: HashMap<String, Vec<CandidateAllele>> = HashMap::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let rid = record.rid().ok_or(errors::Error::RecordMissingChrom { i })?;
        let chrom = str::from_utf8(header.rid2name(rid)?)?;
        let record_candidates = collect_candidates(&record, chrom, &mut skips);
        candidates
            .entry(chrom.to_owned())
            .or_insert_with(Vec::new)
            .extend(record_candidates);
    }

    for chrom_candidates in candidates.values_mut() {
        chrom_candidates.sort_by_key(|candidate| candidate.reference_position());
    }
    info!(
        "Loaded {} candidates on {} chromosomes.",
        candidates.values().map(|c| c.len()).sum::<usize>(),
        candidates.len()
    );
    skips.log_summary("candidates");

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classify() {
        assert_eq!(classify(b"A", b"T").unwrap(), AlleleCategory::Snv);
        assert_eq!(classify(b"AC", b"GT").unwrap(), AlleleCategory::Mnv);
        assert_eq!(classify(b"A", b"ATT").unwrap(), AlleleCategory::Insertion);
        assert_eq!(classify(b"ATT", b"A").unwrap(), AlleleCategory::Deletion);
        assert_eq!(classify(b"A", b"<DEL>").unwrap_err(), SkipReason::Symbolic);
        assert_eq!(classify(b"A", b"A[chr2:100[").unwrap_err(), SkipReason::Symbolic);
        assert_eq!(classify(b"A", b"*").unwrap_err(), SkipReason::Symbolic);
        assert_eq!(classify(b"AT", b"GCC").unwrap_err(), SkipReason::Complex);
        assert_eq!(classify(b"A", b"a").unwrap_err(), SkipReason::Reference);
    }

    #[test]
    fn test_load() {
        let mut vcf = tempfile::Builder::new().suffix(".vcf").tempfile().unwrap();
        vcf.write_all(
            b"##fileformat=VCFv4.2\n\
              ##contig=<ID=chr1,length=3000>\n\
              ##contig=<ID=chr2,length=3000>\n\
              #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
              chr1\t1500\t.\tA\tT,<DEL>\t.\t.\t.\n\
              chr1\t998\t.\tACGTA\tA\t.\t.\t.\n\
              chr2\t10\t.\tC\tCAG\t.\t.\t.\n",
        )
        .unwrap();
        let candidates = load(vcf.path()).unwrap();
        let chr1 = &candidates["chr1"];
        assert_eq!(chr1.len(), 2);
        assert_eq!(chr1[0].reference_position(), 998);
        assert_eq!(chr1[0].category(), AlleleCategory::Deletion);
        assert_eq!(chr1[0].endpoint(), 1002);
        assert_eq!(chr1[1].reference_position(), 1500);
        assert_eq!(candidates["chr2"][0].category(), AlleleCategory::Insertion);
    }
}
