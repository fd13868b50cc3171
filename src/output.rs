//! Tab-delimited result formatting (§6).

use crate::evaluator::VariantResult;
use crate::variant::Variant;

/// Header row, printed once before any result rows.
pub const HEADER: &str = "#SEQ\tPOS\tREF\tALT\tReads\tAltReads\tProb\tOdds\tSet";

/// Format one output row for `variant`, evaluated as part of `set`
/// (used to render the trailing `[pos,ref,alt;...]` field — the
/// brackets are always emitted, empty when the set has at most one
/// member since there is then no sharing to disclose).
pub fn format_row(variant: &Variant, set: &[Variant], result: &VariantResult) -> String {
    let set_field = if set.len() <= 1 {
        "[]".to_owned()
    } else {
        let members = set
            .iter()
            .map(|v| {
                format!(
                    "{},{},{}",
                    v.pos,
                    render_allele(&v.r#ref),
                    render_allele(&v.alt)
                )
            })
            .collect::<Vec<_>>()
            .join(";");
        format!("[{}]", members)
    };

    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{:e}\t{:.6}\t{}",
        variant.chr,
        variant.pos,
        render_allele(&variant.r#ref),
        render_allele(&variant.alt),
        result.read_count,
        result.has_alt_count,
        result.prob,
        result.odds,
        set_field,
    )
}

fn render_allele(allele: &[u8]) -> String {
    if allele.is_empty() {
        "-".to_owned()
    } else {
        String::from_utf8_lossy(allele).into_owned()
    }
}
