// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::Error;

/// Settings of a region state manager and the reads it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, CopyGetters)]
#[serde(default, deny_unknown_fields)]
#[builder(default)]
#[getset(get_copy = "pub")]
pub struct ManagerConfig {
    /// Size of the windows evidence is collected in.
    block_size: u64,
    /// Bases below this quality are counted as N.
    min_basecall_quality: u8,
    /// Synthesize reference candidates from the allele counts.
    include_reference_alleles: bool,
    min_mapping_quality: u8,
    skip_duplicates: bool,
    skip_secondary: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            block_size: 1000,
            min_basecall_quality: 20,
            include_reference_alleles: false,
            min_mapping_quality: 0,
            skip_duplicates: true,
            skip_secondary: true,
        }
    }
}

impl ManagerConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading config file {}", path.as_ref().display()))?;
        let config: ManagerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.as_ref().display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidBlockSize.into());
        }
        Ok(())
    }

    pub fn set_block_size(&mut self, block_size: u64) {
        self.block_size = block_size;
    }

    pub fn set_min_basecall_quality(&mut self, min_basecall_quality: u8) {
        self.min_basecall_quality = min_basecall_quality;
    }

    pub fn set_include_reference_alleles(&mut self, include_reference_alleles: bool) {
        self.include_reference_alleles = include_reference_alleles;
    }

    pub fn set_min_mapping_quality(&mut self, min_mapping_quality: u8) {
        self.min_mapping_quality = min_mapping_quality;
    }
}
