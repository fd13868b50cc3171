//! Integration tests exercising the literal scenarios used to validate
//! the evaluator end to end: variant loading, partitioning, combination
//! enumeration, and scoring working together across module boundaries.

use std::str::FromStr;

use rust_htslib::bam::record::CigarString;

use eagle::combinations::enumerate_combinations;
use eagle::evaluator::{evaluate, EvaluatorConfigBuilder};
use eagle::partition::partition;
use eagle::read::Read;
use eagle::refcache::ReferenceCache;
use eagle::variant::Variant;

fn make_read(name: &str, chr: &str, pos: i32, qseq: &[u8], phred: u8) -> Read {
    let log10_err = -(phred as f64) / 10.0;
    let ln_err = log10_err * std::f64::consts::LN_10;
    Read {
        name: name.to_owned(),
        chr: chr.to_owned(),
        tid: 0,
        pos,
        length: qseq.len(),
        inferred_length: qseq.len() as u32,
        qseq: qseq.to_vec(),
        qual: vec![ln_err; qseq.len()],
        unmapped: false,
        reverse: false,
        secondary_or_supplementary: false,
        cigar: CigarString::from_str(&format!("{}M", qseq.len()))
            .unwrap()
            .into_view(pos),
        multimap: Vec::new(),
    }
}

fn write_reference(dir: &tempfile::TempDir, seq: &str) -> ReferenceCache {
    let path = dir.path().join("ref.fa");
    std::fs::write(&path, format!(">chr1\n{}\n", seq)).unwrap();
    std::fs::write(
        path.with_extension("fa.fai"),
        format!("chr1\t{}\t6\t{}\t{}\n", seq.len(), seq.len(), seq.len() + 1),
    )
    .unwrap();
    ReferenceCache::new(&path)
}

#[test]
fn scenario_snp_with_perfect_supporting_reads() {
    let refseq = b"ACGTACGT".to_vec();
    let dir = tempfile::tempdir().unwrap();
    let cache = write_reference(&dir, "ACGTACGT");
    let variant = Variant::new("chr1", 4, b"T", b"A");
    let reads: Vec<Read> = (0..20)
        .map(|i| make_read(&format!("r{}", i), "chr1", 0, b"ACGAACGT", 40))
        .collect();

    let config = EvaluatorConfigBuilder::default().build().unwrap();
    let out = evaluate(&[variant], &reads, &refseq, &cache, &config);

    assert_eq!(out.rows[0].read_count, 20);
    assert!(out.rows[0].has_alt_count > 0);
    assert!(out.rows[0].odds > 0.0);
}

#[test]
fn scenario_snp_with_no_support() {
    let refseq = b"ACGTACGT".to_vec();
    let dir = tempfile::tempdir().unwrap();
    let cache = write_reference(&dir, "ACGTACGT");
    let variant = Variant::new("chr1", 4, b"T", b"A");
    let reads: Vec<Read> = (0..20)
        .map(|i| make_read(&format!("r{}", i), "chr1", 0, b"ACGTACGT", 40))
        .collect();

    let config = EvaluatorConfigBuilder::default().build().unwrap();
    let out = evaluate(&[variant], &reads, &refseq, &cache, &config);

    assert_eq!(out.rows[0].has_alt_count, 0);
    assert!(out.rows[0].odds < 0.0);
}

#[test]
fn scenario_two_snps_within_distlim_yield_three_combinations() {
    let variants = vec![
        Variant::new("chr1", 4, b"T", b"A"),
        Variant::new("chr1", 6, b"A", b"G"),
    ];
    let sets = partition(&variants, 10);
    assert_eq!(sets.len(), 1, "both variants fall within distlim of each other");
    assert_eq!(sets[0].len(), 2);

    let combos = enumerate_combinations(sets[0].len(), 1024);
    assert_eq!(combos.len(), 3, "two singletons plus the full pair");
}

#[test]
fn scenario_multi_allelic_site_splits_into_parallel_sets() {
    let mut a = Variant::new("chr1", 4, b"T", b"A");
    a.alt = b"A".to_vec();
    let mut b = Variant::new("chr1", 4, b"T", b"G");
    b.alt = b"G".to_vec();
    let neighbor = Variant::new("chr1", 6, b"A", b"C");

    let variants = vec![a, b, neighbor];
    let sets = partition(&variants, 10);

    assert_eq!(sets.len(), 2, "same-position alleles must land in separate sets");
    for set in &sets {
        assert_eq!(set.len(), 2);
    }
}

#[test]
fn scenario_insertion_scores_higher_for_spanning_read() {
    let refseq = b"ACGTACGT".to_vec();
    let dir = tempfile::tempdir().unwrap();
    let cache = write_reference(&dir, "ACGTACGT");
    let variant = Variant::new("chr1", 4, b"-", b"AA");

    // ACGAATACGT is the altseq; a read spanning the insertion supports it
    // far better than it supports the unmodified reference.
    let spanning_reads: Vec<Read> = (0..10)
        .map(|i| make_read(&format!("alt{}", i), "chr1", 0, b"CGAATACG", 40))
        .collect();
    let config = EvaluatorConfigBuilder::default().build().unwrap();
    let out_alt = evaluate(&[variant.clone()], &spanning_reads, &refseq, &cache, &config);
    assert!(out_alt.rows[0].odds > 0.0);

    let ref_reads: Vec<Read> = (0..10)
        .map(|i| make_read(&format!("ref{}", i), "chr1", 0, b"ACGTACGT", 40))
        .collect();
    let out_ref = evaluate(&[variant], &ref_reads, &refseq, &cache, &config);
    assert!(out_ref.rows[0].odds < 0.0);
}

#[test]
fn scenario_unmapped_reads_yield_zero_support() {
    let refseq = b"ACGTACGT".to_vec();
    let dir = tempfile::tempdir().unwrap();
    let cache = write_reference(&dir, "ACGTACGT");
    let variant = Variant::new("chr1", 4, b"T", b"A");

    let mut reads: Vec<Read> = (0..5)
        .map(|i| make_read(&format!("u{}", i), "chr1", 0, b"ACGTACGT", 40))
        .collect();
    for r in &mut reads {
        r.unmapped = true;
    }

    let config = EvaluatorConfigBuilder::default().build().unwrap();
    let out = evaluate(&[variant], &reads, &refseq, &cache, &config);

    assert_eq!(out.rows[0].read_count, 0);
    assert_eq!(out.rows[0].has_alt_count, 0);
    assert_eq!(out.rows[0].odds, 0.0);
}
