//! Windowed accumulation of read evidence for variant candidates.
//!
//! Reads and candidate alleles of one chromosome are fed in position order into a
//! [`RegionStateManager`](manager/struct.RegionStateManager.html). Evidence is kept in
//! fixed-size windows, and windows whose evidence is complete are released as
//! [`CandidateBatch`](batch/struct.CandidateBatch.html)es for downstream processing.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate strum_macros;

pub mod alignment;
pub mod alleles;
pub mod batch;
pub mod candidates;
pub mod cli;
pub mod collect;
pub mod config;
pub mod errors;
pub mod intervals;
pub mod manager;
pub mod reference;
pub mod region;
pub mod utils;

pub use crate::alignment::{AlignmentSet, Read};
pub use crate::alleles::{AlleleCategory, AlleleType, CandidateAllele, DirectionType};
pub use crate::batch::CandidateBatch;
pub use crate::config::ManagerConfig;
pub use crate::manager::{AlleleSource, RegionStateManager};
pub use crate::region::{Region, RegionState};
