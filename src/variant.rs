//! Variant store: loading candidate variants from a whitespace-tokenized
//! VCF-like file and keeping them in natural sorted order.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::Error;
use crate::natural_sort::natural_cmp_str;

/// A single candidate variant. `-` denotes an empty allele (pure
/// insertion when `r#ref` is empty, pure deletion when `alt` is empty).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub chr: String,
    /// 1-based position, as read from the VCF POS column.
    pub pos: u32,
    pub r#ref: Vec<u8>,
    pub alt: Vec<u8>,
}

impl Variant {
    pub fn new(chr: impl Into<String>, pos: u32, r#ref: &[u8], alt: &[u8]) -> Self {
        Variant {
            chr: chr.into(),
            pos,
            r#ref: normalize_allele(r#ref),
            alt: normalize_allele(alt),
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.r#ref.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.alt.is_empty()
    }
}

/// `-` means "empty allele"; anything else is taken verbatim.
fn normalize_allele(allele: &[u8]) -> Vec<u8> {
    if allele == b"-" {
        Vec::new()
    } else {
        allele.to_ascii_uppercase()
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variant {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp_str(&self.chr, &other.chr).then_with(|| self.pos.cmp(&other.pos))
    }
}

/// Load a variant store from a whitespace-tokenized VCF file: column 1
/// (chr), column 2 (pos), column 4 (ref), column 5 (alt). Lines
/// starting with `#` or blank lines are skipped. A comma-separated alt
/// column expands to one `Variant` per alt allele. The returned store is
/// sorted in natural order over `(chr, pos)`.
pub fn load_variants(path: impl AsRef<Path>) -> Result<Vec<Variant>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| Error::VcfOpen {
        path: path.to_owned(),
    })?;
    let reader = BufReader::new(file);

    let mut variants = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|_| Error::VcfOpen {
            path: path.to_owned(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(Error::VcfParse {
                line: lineno + 1,
                reason: format!("expected at least 5 columns, got {}", fields.len()),
            });
        }
        let chr = fields[0].to_owned();
        let pos: u32 = fields[1].parse().map_err(|_| Error::VcfParse {
            line: lineno + 1,
            reason: format!("non-numeric POS {:?}", fields[1]),
        })?;
        let r#ref = fields[3].as_bytes();
        for alt in fields[4].split(',') {
            variants.push(Variant::new(&chr, pos, r#ref, alt.as_bytes()));
        }
    }

    variants.sort();
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_vcf(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_allele_expansion() {
        let f = write_vcf("#comment\nchr1\t4\t.\tT\tA,G\t.\n");
        let variants = load_variants(f.path()).unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].alt, b"A");
        assert_eq!(variants[1].alt, b"G");
        assert_eq!(variants[0].r#ref, variants[1].r#ref);
    }

    #[test]
    fn test_empty_allele_markers() {
        let f = write_vcf("chr1\t4\t.\t-\tAA\t.\nchr1\t8\t.\tC\t-\t.\n");
        let variants = load_variants(f.path()).unwrap();
        assert!(variants[0].is_insertion());
        assert!(variants[1].is_deletion());
    }

    #[test]
    fn test_sort_stability_natural_order() {
        let f = write_vcf("chr10\t1\t.\tA\tT\t.\nchr2\t5\t.\tA\tT\t.\nchr2\t1\t.\tA\tT\t.\n");
        let variants = load_variants(f.path()).unwrap();
        assert_eq!(variants[0].chr, "chr2");
        assert_eq!(variants[0].pos, 1);
        assert_eq!(variants[1].chr, "chr2");
        assert_eq!(variants[1].pos, 5);
        assert_eq!(variants[2].chr, "chr10");
    }

    #[test]
    fn test_blank_and_comment_skipped() {
        let f = write_vcf("\n# header\n\nchr1\t1\t.\tA\tT\t.\n");
        let variants = load_variants(f.path()).unwrap();
        assert_eq!(variants.len(), 1);
    }
}
