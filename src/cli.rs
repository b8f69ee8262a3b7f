// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;
use structopt::StructOpt;

use crate::candidates;
use crate::collect::Collector;
use crate::config::ManagerConfig;
use crate::intervals::IntervalSet;
use crate::reference;

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "candidate-windows",
    about = "Accumulate read evidence for variant candidates in genomic windows and report them in safely processable batches."
)]
pub struct CandidateWindows {
    #[structopt(long, short, help = "Provide verbose output.")]
    pub verbose: bool,
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt, Clone)]
pub enum Command {
    #[structopt(
        name = "collect",
        about = "Collect allele evidence from a BAM file and write candidate batches as JSON lines."
    )]
    Collect {
        #[structopt(
            long,
            parse(from_os_str),
            help = "Sorted and indexed BAM file with aligned reads."
        )]
        bam: PathBuf,
        #[structopt(
            long,
            parse(from_os_str),
            help = "FASTA file with reference genome. Has to be indexed with samtools faidx."
        )]
        reference: PathBuf,
        #[structopt(
            long,
            parse(from_os_str),
            help = "VCF/BCF file with candidate variants (SNVs, MNVs, anchored indels)."
        )]
        candidates: Option<PathBuf>,
        #[structopt(
            long,
            parse(from_os_str),
            help = "BED file with intervals for which reference positions shall be reported, even without coverage."
        )]
        intervals: Option<PathBuf>,
        #[structopt(
            long,
            parse(from_os_str),
            help = "YAML file with settings (block_size, min_basecall_quality, include_reference_alleles, min_mapping_quality, skip_duplicates, skip_secondary)."
        )]
        config: Option<PathBuf>,
        #[structopt(long = "block-size", help = "Size of the windows evidence is collected in [default: 1000].")]
        block_size: Option<u64>,
        #[structopt(
            long = "min-basecall-quality",
            help = "Bases below this quality are counted as N [default: 20]."
        )]
        min_basecall_quality: Option<u8>,
        #[structopt(
            long = "min-mapping-quality",
            help = "Ignore reads below this mapping quality [default: 0]."
        )]
        min_mapping_quality: Option<u8>,
        #[structopt(
            long = "include-reference",
            help = "Report reference alleles for all covered positions."
        )]
        include_reference: bool,
        #[structopt(
            long,
            short,
            default_value = "1",
            help = "Number of chromosomes to process in parallel."
        )]
        threads: usize,
        #[structopt(
            long,
            parse(from_os_str),
            help = "File to write batches to (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
    },
}

pub fn run(opt: CandidateWindows) -> Result<()> {
    match opt.command {
        Command::Collect {
            ref bam,
            ref reference,
            ref candidates,
            ref intervals,
            ref config,
            block_size,
            min_basecall_quality,
            min_mapping_quality,
            include_reference,
            threads,
            ref output,
        } => {
            let mut manager_config = match config {
                Some(path) => ManagerConfig::from_yaml_file(path)?,
                None => ManagerConfig::default(),
            };
            if let Some(block_size) = block_size {
                manager_config.set_block_size(block_size);
            }
            if let Some(min_basecall_quality) = min_basecall_quality {
                manager_config.set_min_basecall_quality(min_basecall_quality);
            }
            if let Some(min_mapping_quality) = min_mapping_quality {
                manager_config.set_min_mapping_quality(min_mapping_quality);
            }
            if include_reference {
                manager_config.set_include_reference_alleles(true);
            }
            manager_config.validate()?;
            debug!("Using {:?}.", manager_config);

            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()?;

            let reference_buffer = reference::Buffer::from_path(reference, threads.max(1))?;
            let intervals = match intervals {
                Some(path) => Some(Arc::new(IntervalSet::from_bed(path)?)),
                None => None,
            };
            let mut candidates = match candidates {
                Some(path) => candidates::load(path)?,
                None => HashMap::new(),
            };

            let work: Vec<_> = reference_buffer
                .sequences()?
                .into_iter()
                .map(|sequence| {
                    let contig_candidates = candidates.remove(&sequence.name).unwrap_or_default();
                    (sequence.name, contig_candidates)
                })
                .collect();
            for contig in candidates.keys() {
                warn!("Candidates on contig {} are ignored, it is not part of the reference.", contig);
            }

            let collector = Collector::new(manager_config, intervals);
            let results: Vec<_> = work
                .into_par_iter()
                .map(|(contig, contig_candidates)| {
                    collector.process_bam(bam, &reference_buffer, &contig, contig_candidates)
                })
                .collect();

            let mut out: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(BufWriter::new(io::stdout())),
            };
            let mut n_batches = 0;
            for summaries in results {
                for summary in summaries? {
                    serde_json::to_writer(&mut out, &summary)?;
                    writeln!(out)?;
                    n_batches += 1;
                }
            }
            out.flush()?;
            info!("Wrote {} batches.", n_batches);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let opt = CandidateWindows::from_iter(vec![
            "candidate-windows",
            "--verbose",
            "collect",
            "--bam",
            "reads.bam",
            "--reference",
            "ref.fa",
            "--block-size",
            "500",
            "--include-reference",
        ]);
        assert!(opt.verbose);
        match opt.command {
            Command::Collect {
                block_size,
                include_reference,
                threads,
                candidates,
                ..
            } => {
                assert_eq!(block_size, Some(500));
                assert!(include_reference);
                assert_eq!(threads, 1);
                assert!(candidates.is_none());
            }
        }
    }
}
