//! Variant set partitioner (§4.2): groups the sorted variant store into
//! hypothesis sets by positional proximity, then splits same-position
//! multi-allelic sites into parallel sets.

use crate::variant::Variant;

/// A hypothesis set: variants sharing a locus region, all on the same
/// chromosome, with strictly increasing positions.
pub type VariantSet = Vec<Variant>;

/// Partition a naturally-sorted variant store into hypothesis sets.
///
/// `distlim` of `0` disables grouping entirely: every variant becomes
/// its own singleton set (still subject to the same-position split,
/// which is a no-op for singletons).
pub fn partition(variants: &[Variant], distlim: u32) -> Vec<VariantSet> {
    let grouped = group_by_proximity(variants, distlim);
    grouped
        .into_iter()
        .flat_map(split_same_position)
        .collect()
}

fn group_by_proximity(variants: &[Variant], distlim: u32) -> Vec<VariantSet> {
    let mut sets: Vec<VariantSet> = Vec::new();
    let mut current: VariantSet = Vec::new();

    for v in variants {
        let joins_current = match current.last() {
            Some(last) if distlim > 0 => {
                last.chr == v.chr && v.pos.saturating_sub(last.pos) <= distlim
            }
            _ => false,
        };

        if joins_current {
            current.push(v.clone());
        } else {
            if !current.is_empty() {
                sets.push(std::mem::take(&mut current));
            }
            current.push(v.clone());
        }
    }
    if !current.is_empty() {
        sets.push(current);
    }
    sets
}

/// Repeatedly split a set containing two consecutive same-position
/// entries into two parallel sets: the duplicate drops the second of
/// the pair, the original drops the first. Recurse until no produced
/// set contains a same-position pair.
fn split_same_position(set: VariantSet) -> Vec<VariantSet> {
    if let Some(i) = set.windows(2).position(|w| w[0].pos == w[1].pos) {
        let mut without_second = set.clone();
        without_second.remove(i + 1);

        let mut without_first = set;
        without_first.remove(i);

        let mut result = split_same_position(without_second);
        result.extend(split_same_position(without_first));
        result
    } else {
        vec![set]
    }
}
