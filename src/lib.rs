//! EAGLE: Explicit Alternative Genome Likelihood Evaluator.
//!
//! Scores how well a BAM's reads support each candidate variant's
//! alternative genome against the reference, using a windowed
//! Bayesian read-likelihood model rather than a pileup-based caller.

pub mod altseq;
pub mod cli;
pub mod combinations;
pub mod errors;
pub mod evaluator;
pub mod likelihood;
pub mod natural_sort;
pub mod output;
pub mod partition;
pub mod read;
pub mod refcache;
pub mod variant;
pub mod workpool;
