//! Command-line surface (§6): flag definitions and the `run` entry
//! point that wires variant loading through to output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::errors::Error;
use crate::evaluator::EvaluatorConfigBuilder;
use crate::output;
use crate::partition;
use crate::refcache::ReferenceCache;
use crate::variant;
use crate::workpool;

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "eagle",
    about = "Explicit Alternative Genome Likelihood Evaluator: scores candidate variants by \
             the read-level evidence for their alternative genome against the reference.",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
pub struct Opt {
    #[structopt(
        short = "v",
        long = "variants",
        parse(from_os_str),
        help = "Candidate variants, VCF-like (chr, pos, id, ref, alt columns)."
    )]
    pub variants: PathBuf,

    #[structopt(
        short = "a",
        long = "bam",
        parse(from_os_str),
        help = "Indexed BAM file with the reads to score."
    )]
    pub bam: PathBuf,

    #[structopt(
        short = "r",
        long = "reference",
        parse(from_os_str),
        help = "Indexed FASTA reference genome."
    )]
    pub reference: PathBuf,

    #[structopt(
        short = "o",
        long = "output",
        parse(from_os_str),
        help = "Write results here instead of STDOUT."
    )]
    pub output: Option<PathBuf>,

    #[structopt(short = "t", long = "numproc", default_value = "1", help = "Worker thread count.")]
    pub numproc: usize,

    #[structopt(
        short = "n",
        long = "distlim",
        default_value = "10",
        help = "Max distance in bases between variants grouped into one hypothesis set."
    )]
    pub distlim: u32,

    #[structopt(
        short = "s",
        long = "bisulfite",
        default_value = "0",
        help = "Bisulfite strand mode (0 disables)."
    )]
    pub bisulfite: u32,

    #[structopt(short = "w", long = "window", default_value = "0", help = "Extra scoring window padding.")]
    pub window: u32,

    #[structopt(
        long = "maxh",
        default_value = "1024",
        help = "Cap on the number of multi-variant combinations evaluated per set."
    )]
    pub maxh: usize,

    #[structopt(long = "mvh", help = "Score only the maximum-variant hypothesis, not all subsets.")]
    pub mvh: bool,

    #[structopt(long = "pao", help = "Primary alignments only: ignore secondary/supplementary reads and XA hits.")]
    pub pao: bool,

    #[structopt(long = "isc", help = "Ignore soft-clipped bases when scoring.")]
    pub isc: bool,

    #[structopt(long = "nodup", help = "Skip duplicate-flagged reads.")]
    pub nodup: bool,

    #[structopt(long = "splice", help = "Treat N CIGAR operations as splice junctions, not gaps.")]
    pub splice: bool,

    #[structopt(long = "dp", help = "Use affine-gap dynamic programming realignment instead of the windowed search.")]
    pub dp: bool,

    #[structopt(long = "match", default_value = "1", help = "DP match score (with --dp).")]
    pub dp_match: i32,

    #[structopt(long = "mismatch", default_value = "4", help = "DP mismatch penalty (with --dp).")]
    pub dp_mismatch: i32,

    #[structopt(long = "gap_op", default_value = "6", help = "DP gap open penalty (with --dp).")]
    pub dp_gap_open: i32,

    #[structopt(long = "gap_ex", default_value = "1", help = "DP gap extend penalty (with --dp).")]
    pub dp_gap_extend: i32,

    #[structopt(short = "V", long = "verbose", help = "Emit a per-read scoring trace to STDERR.")]
    pub verbose: bool,

    #[structopt(
        long = "hetbias",
        default_value = "0.5",
        help = "Prior weight split between heterozygous and homozygous-alt hypotheses."
    )]
    pub hetbias: f64,

    #[structopt(
        long = "omega",
        default_value = "1e-4",
        help = "Outside-paralog mixture weight."
    )]
    pub omega: f64,
}

/// Validate, load, partition, evaluate, and print — the full pipeline
/// described end to end in §5-6.
pub fn run(opt: Opt) -> Result<()> {
    if !(0.0..=1.0).contains(&opt.hetbias) {
        return Err(Error::InvalidHetbias { value: opt.hetbias }.into());
    }
    if !(opt.omega > 0.0 && opt.omega < 1.0) {
        return Err(Error::InvalidOmega { value: opt.omega }.into());
    }
    if opt.numproc == 0 {
        return Err(Error::InvalidThreadCount { value: opt.numproc }.into());
    }

    let variants = variant::load_variants(&opt.variants)
        .with_context(|| format!("loading variants from {}", opt.variants.display()))?;
    let sets = partition::partition(&variants, opt.distlim);

    let refcache = ReferenceCache::new(&opt.reference);

    let config = EvaluatorConfigBuilder::default()
        .hetbias(opt.hetbias)
        .mvh(opt.mvh)
        .pao(opt.pao)
        .omega(opt.omega)
        .maxh(opt.maxh)
        .verbose(opt.verbose)
        .build()
        .expect("all EvaluatorConfig fields carry defaults");

    let rows = workpool::run(sets, &opt.bam, &refcache, &config, opt.numproc)
        .with_context(|| "evaluating variant sets")?;

    let mut writer: Box<dyn std::io::Write> = match &opt.output {
        Some(path) => Box::new(std::fs::File::create(path).with_context(|| {
            format!("creating output file {}", path.display())
        })?),
        None => Box::new(std::io::stdout()),
    };

    use std::io::Write;
    writeln!(writer, "{}", output::HEADER)?;
    for row in rows {
        writeln!(writer, "{}", row)?;
    }

    Ok(())
}
