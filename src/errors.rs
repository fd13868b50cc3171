use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open VCF file {path}")]
    VcfOpen { path: PathBuf },
    #[error("malformed VCF record at line {line}: {reason}")]
    VcfParse { line: usize, reason: String },
    #[error("failed to open FASTA index for {path}")]
    FastaIndexOpen { path: PathBuf },
    #[error("chromosome {chrom} not found in reference index")]
    SequenceMissing { chrom: String },
    #[error("failed to open BAM file {path}")]
    BamOpen { path: PathBuf },
    #[error("BAM file {path} has no index")]
    BamIndexMissing { path: PathBuf },
    #[error("--hetbias must lie in [0, 1], got {value}")]
    InvalidHetbias { value: f64 },
    #[error("--omega must lie in (0, 1), got {value}")]
    InvalidOmega { value: f64 },
    #[error("-t/--numproc must be at least 1, got {value}")]
    InvalidThreadCount { value: usize },
    #[error("invalid region {chrom}:{start}-{end}")]
    InvalidRegion {
        chrom: String,
        start: u32,
        end: u32,
    },
}
