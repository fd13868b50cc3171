//! Per-read evidence (§3 "Read"): a snapshot of the BAM record fields
//! the likelihood engine needs, built once per fetch and dropped once
//! the variant set it belongs to has been scored.

use std::str;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_htslib::bam;
use rust_htslib::bam::record::{Cigar, CigarString, CigarStringView};

/// One entry of the `XA` auxiliary tag: an alternative alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct XaEntry {
    pub chr: String,
    /// Signed, 1-based position; sign encodes strand (negative = reverse).
    pub signed_pos: i32,
    pub cigar: CigarString,
    pub edit_distance: i32,
}

impl XaEntry {
    pub fn pos(&self) -> u32 {
        (self.signed_pos.abs() - 1) as u32
    }

    pub fn is_reverse(&self) -> bool {
        self.signed_pos < 0
    }
}

lazy_static! {
    static ref XA_ENTRY: Regex = Regex::new(
        r"(?P<chrom>[^,]+),(?P<pos>[+-]?[0-9]+),(?P<cigar>([0-9]+[MIDNSHP=X])+),(?P<nm>[0-9]+);"
    )
    .unwrap();
}

fn parse_xa(xa: &[u8]) -> Vec<XaEntry> {
    let text = match str::from_utf8(xa) {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };
    XA_ENTRY
        .captures_iter(text)
        .filter_map(|cap| {
            let signed_pos: i32 = cap["pos"].parse().ok()?;
            let cigar = CigarString::from_str(&cap["cigar"]).ok()?;
            let edit_distance: i32 = cap["nm"].parse().ok()?;
            Some(XaEntry {
                chr: cap["chrom"].to_owned(),
                signed_pos,
                cigar,
                edit_distance,
            })
        })
        .collect()
}

/// Per-read evidence extracted from a `rust_htslib::bam::Record`.
#[derive(Clone, Debug)]
pub struct Read {
    pub name: String,
    pub chr: String,
    pub tid: i32,
    /// 0-based alignment start.
    pub pos: i32,
    pub length: usize,
    /// Length of query consumed according to the CIGAR string.
    pub inferred_length: u32,
    /// Uppercase bases, A/T/G/C/N.
    pub qseq: Vec<u8>,
    /// Per-base natural-log error rate, always `<= 0`.
    pub qual: Vec<f64>,
    pub unmapped: bool,
    pub reverse: bool,
    pub secondary_or_supplementary: bool,
    pub cigar: CigarStringView,
    pub multimap: Vec<XaEntry>,
}

impl Read {
    pub fn from_record(record: &bam::Record, chr: &str) -> Self {
        let seq = record.seq();
        let mut qseq = Vec::with_capacity(seq.len());
        for i in 0..seq.len() {
            qseq.push(seq[i].to_ascii_uppercase());
        }

        let qual: Vec<f64> = record
            .qual()
            .iter()
            .map(|&q| phred_to_ln_error(q))
            .collect();

        let cigar = record.cigar();
        let inferred_length = cigar_query_length(&cigar);

        let multimap = record
            .aux(b"XA")
            .map(|aux| parse_xa(aux.string()))
            .unwrap_or_default();

        Read {
            name: String::from_utf8_lossy(record.qname()).into_owned(),
            chr: chr.to_owned(),
            tid: record.tid(),
            pos: record.pos(),
            length: seq.len(),
            inferred_length,
            qseq,
            qual,
            unmapped: record.is_unmapped(),
            reverse: record.is_reverse(),
            secondary_or_supplementary: record.is_secondary() || record.is_supplementary(),
            cigar,
            multimap,
        }
    }
}

/// Convert a Phred-scaled base quality to a natural-log error rate.
/// The matrix step requires strictly negative values; a byte of 0
/// (a claimed-perfect base) is clamped to -0.01 ln-units as the spec
/// mandates, rather than `ln(1) = 0`.
fn phred_to_ln_error(qual_byte: u8) -> f64 {
    let log10_err = -(qual_byte as f64) / 10.0;
    let ln_err = log10_err * std::f64::consts::LN_10;
    if ln_err == 0.0 {
        -0.01
    } else {
        ln_err
    }
}

fn cigar_query_length(cigar: &CigarStringView) -> u32 {
    cigar
        .iter()
        .map(|op| match op {
            Cigar::Match(l)
            | Cigar::Ins(l)
            | Cigar::SoftClip(l)
            | Cigar::Equal(l)
            | Cigar::Diff(l) => *l,
            _ => 0,
        })
        .sum()
}

/// Map a nucleotide byte to its 5-way index: A=0, T=1, G=2, C=3, N=4
/// (anything else also maps to N, per §3's invariant).
pub fn base_index(base: u8) -> usize {
    match base.to_ascii_uppercase() {
        b'A' => 0,
        b'T' => 1,
        b'G' => 2,
        b'C' => 3,
        _ => 4,
    }
}

/// Complement table, indexed by `base_index`.
const COMPLEMENT: [u8; 5] = [b'T', b'A', b'C', b'G', b'N'];

pub fn complement_base(base: u8) -> u8 {
    COMPLEMENT[base_index(base)]
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement_base(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_index_table() {
        assert_eq!(base_index(b'A'), 0);
        assert_eq!(base_index(b'a'), 0);
        assert_eq!(base_index(b'T'), 1);
        assert_eq!(base_index(b'G'), 2);
        assert_eq!(base_index(b'C'), 3);
        assert_eq!(base_index(b'N'), 4);
        assert_eq!(base_index(b'X'), 4);
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT");
        assert_eq!(reverse_complement(b"AATT"), b"AATT");
        assert_eq!(reverse_complement(b"ATGC"), b"GCAT");
    }

    #[test]
    fn test_phred_zero_clamped() {
        assert_eq!(phred_to_ln_error(0), -0.01);
    }

    #[test]
    fn test_phred_positive_quality_is_negative_log() {
        let q = phred_to_ln_error(40);
        assert!(q < 0.0);
    }

    #[test]
    fn test_parse_xa_entries() {
        let xa = b"chr2,-100,5M,2;chr3,+200,3M2I,1;";
        let entries = parse_xa(xa);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].chr, "chr2");
        assert!(entries[0].is_reverse());
        assert_eq!(entries[0].pos(), 99);
        assert_eq!(entries[1].chr, "chr3");
        assert!(!entries[1].is_reverse());
    }
}
