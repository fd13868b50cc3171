//! Concurrent dispatch across variant sets (§4.7, §9).
//!
//! Two independent mutexes, deliberately kept apart rather than folded
//! into one lock: the task queue (what work remains) and the results
//! buffer (what's been produced) are contended by different access
//! patterns — workers pop from one in a tight loop and push to the
//! other once per finished set — so a single combined lock would
//! serialize unrelated operations. The reference cache (`refcache.rs`)
//! carries its own third mutex, guarding the FASTA fault-in path.
//!
//! Worker threads are plain `crossbeam::thread::scope` threads rather
//! than a `rayon` pool: `numproc` is a user-chosen constant, not a
//! work-stealing degree of parallelism, and each worker owns a
//! dedicated `bam::IndexedReader` for its lifetime (htslib readers are
//! not `Sync`), which a scoped-thread-per-worker model expresses more
//! directly than a rayon task pool would.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rust_htslib::bam;
use rust_htslib::bam::Read as BamRead;

use crate::errors::Error;
use crate::evaluator::{self, EvaluatorConfig};
use crate::natural_sort::natural_cmp_str;
use crate::output;
use crate::partition::VariantSet;
use crate::read::Read;
use crate::refcache::ReferenceCache;

/// One row of output, tagged with its variant's sort key.
struct ResultRow {
    chr: String,
    pos: u32,
    line: String,
}

struct TaskQueue {
    sets: Mutex<VecDeque<VariantSet>>,
}

impl TaskQueue {
    fn pop(&self) -> Option<VariantSet> {
        self.sets.lock().unwrap().pop_front()
    }
}

/// Evaluate every variant set in `sets` across `numproc` worker threads
/// and return the fully formatted, naturally-sorted result lines
/// (header not included).
pub fn run(
    sets: Vec<VariantSet>,
    bam_path: &Path,
    refcache: &ReferenceCache,
    config: &EvaluatorConfig,
    numproc: usize,
) -> Result<Vec<String>, Error> {
    let queue = TaskQueue {
        sets: Mutex::new(sets.into_iter().collect()),
    };
    let results: Mutex<Vec<ResultRow>> = Mutex::new(Vec::new());
    let bam_path: PathBuf = bam_path.to_owned();

    crossbeam::thread::scope(|scope| {
        for _ in 0..numproc.max(1) {
            let queue = &queue;
            let results = &results;
            let refcache = refcache;
            let config = config;
            let bam_path = &bam_path;

            scope.spawn(move |_| {
                let mut reader = match bam::IndexedReader::from_path(bam_path) {
                    Ok(r) => r,
                    Err(_) => return,
                };

                while let Some(set) = queue.pop() {
                    match evaluate_set(&mut reader, &set, refcache, config) {
                        Ok(rows) => {
                            results.lock().unwrap().extend(rows);
                        }
                        Err(_) => continue,
                    }
                }
            });
        }
    })
    .unwrap();

    let mut rows = results.into_inner().unwrap();
    rows.sort_by(|a, b| natural_cmp_str(&a.chr, &b.chr).then_with(|| a.pos.cmp(&b.pos)));

    Ok(rows.into_iter().map(|r| r.line).collect())
}

fn evaluate_set(
    reader: &mut bam::IndexedReader,
    set: &VariantSet,
    refcache: &ReferenceCache,
    config: &EvaluatorConfig,
) -> Result<Vec<ResultRow>, Error> {
    let chrom = &set[0].chr;
    let fasta = refcache.fetch(chrom)?;

    let tid = reader
        .header()
        .tid(chrom.as_bytes())
        .ok_or_else(|| Error::InvalidRegion {
            chrom: chrom.clone(),
            start: 0,
            end: 0,
        })?;

    let lo = set.iter().map(|v| v.pos).min().unwrap_or(1);
    let hi = set.iter().map(|v| v.pos).max().unwrap_or(1);
    let start = lo.saturating_sub(1).saturating_sub(fasta.seq_length() as u32);
    let end = hi + fasta.seq_length() as u32;

    reader
        .fetch(tid, start, end)
        .map_err(|_| Error::InvalidRegion {
            chrom: chrom.clone(),
            start,
            end,
        })?;

    let mut reads = Vec::new();
    for res in reader.records() {
        let record = res.map_err(|_| Error::InvalidRegion {
            chrom: chrom.clone(),
            start,
            end,
        })?;
        reads.push(Read::from_record(&record, chrom));
    }

    let output = evaluator::evaluate(set, &reads, &fasta.seq, refcache, config);

    if config.verbose {
        for line in &output.trace {
            eprintln!("{}", line);
        }
    }

    Ok(set
        .iter()
        .zip(output.rows.iter())
        .map(|(variant, result)| ResultRow {
            chr: variant.chr.clone(),
            pos: variant.pos,
            line: output::format_row(variant, set, result),
        })
        .collect())
}
