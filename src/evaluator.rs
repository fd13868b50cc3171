//! Hypothesis evaluator (§4.6) — the heart of EAGLE: combines per-read
//! likelihoods with priors and mixture weights across all combinations
//! of a variant set, then marginalizes per original variant.

use bio::stats::LogProb;
use derive_builder::Builder;

use crate::altseq::build_altseq;
use crate::combinations::enumerate_combinations;
use crate::likelihood::{self, ProbMatrix};
use crate::read::{reverse_complement, Read};
use crate::refcache::ReferenceCache;
use crate::variant::Variant;

const LN_2: f64 = 0.6931471805599453;

/// Tunable knobs gating the evaluator, sourced from the CLI (§6).
#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct EvaluatorConfig {
    #[builder(default = "0.5")]
    pub hetbias: f64,
    #[builder(default = "false")]
    pub mvh: bool,
    #[builder(default = "false")]
    pub pao: bool,
    /// Outside-paralog mixture prior. Documented default is `1e-5`; the
    /// CLI-exposed default (and the value actually used when `--omega`
    /// is not given) is `1e-4`, matching the upstream implementation's
    /// constant rather than its documentation (see DESIGN.md).
    #[builder(default = "1e-4")]
    pub omega: f64,
    #[builder(default = "1024")]
    pub maxh: usize,
    #[builder(default = "false")]
    pub verbose: bool,
}

/// Per-variant output row (§6).
#[derive(Clone, Debug)]
pub struct VariantResult {
    pub read_count: u32,
    pub has_alt_count: u32,
    pub prob: f64,
    pub odds: f64,
}

/// Result of evaluating one variant set: one row per member variant, in
/// the same order as the input set, plus an optional verbose trace and
/// (in `--mvh` mode) the index of the maximum-posterior combination.
pub struct EvaluationOutput {
    pub rows: Vec<VariantResult>,
    pub trace: Vec<String>,
    pub best_combination: Option<Vec<usize>>,
}

struct ReadState {
    pout: LogProb,
    prgu: LogProb,
    matrix: ProbMatrix,
}

/// Evaluate one variant set against its fetched reads.
///
/// `refseq` is the containing chromosome's reference sequence (already
/// uppercased, as supplied by the reference cache). `refcache` is
/// consulted again for cross-chromosome XA hits.
pub fn evaluate(
    variant_set: &[Variant],
    reads: &[Read],
    refseq: &[u8],
    refcache: &ReferenceCache,
    config: &EvaluatorConfig,
) -> EvaluationOutput {
    let n = variant_set.len();
    let mut trace = Vec::new();

    let eligible_reads: Vec<&Read> = reads
        .iter()
        .filter(|r| !r.unmapped && !(config.pao && r.secondary_or_supplementary))
        .collect();

    if eligible_reads.is_empty() {
        return EvaluationOutput {
            rows: variant_set
                .iter()
                .map(|_| VariantResult {
                    read_count: 0,
                    has_alt_count: 0,
                    prob: 0.0,
                    odds: 0.0,
                })
                .collect(),
            trace,
            best_combination: None,
        };
    }

    let combinations = enumerate_combinations(n, config.maxh);
    let k = combinations.len() as f64;

    let refprior = 0.5f64.ln();
    let (alt_prior, het_prior) = {
        let base_alt = (0.5 * (1.0 - config.hetbias)).ln();
        let base_het = (0.5 * config.hetbias).ln();
        if n == 1 || config.mvh {
            (base_alt, base_het)
        } else {
            (base_alt - k.ln(), base_het - k.ln())
        }
    };

    let lambda = config.omega.ln() - (1.0 - config.omega).ln();

    let mut read_states: Vec<Option<ReadState>> = (0..eligible_reads.len()).map(|_| None).collect();

    let mut ref_acc = LogProb::ln_zero();
    let mut alt_acc = vec![LogProb::ln_zero(); combinations.len()];
    let mut het_acc = vec![LogProb::ln_zero(); combinations.len()];
    let mut alt_count = vec![0u32; combinations.len()];
    let mut ref_count = vec![0u32; combinations.len()];

    for (s, combo) in combinations.iter().enumerate() {
        let combo_variants: Vec<&Variant> = combo.iter().map(|&i| &variant_set[i]).collect();
        let altseq = build_altseq(refseq, &combo_variants);
        let anchor_pos = variant_set[combo[0]].pos as i64;

        for (ri, read) in eligible_reads.iter().enumerate() {
            if s == 0 {
                let matrix = ProbMatrix::new(&read.qseq, &read.qual);
                let pout0 = likelihood::elsewhere(&matrix, read.inferred_length);
                let prgu0 = likelihood::score_windowed(&matrix, refseq, read.pos as i64);
                read_states[ri] = Some(ReadState {
                    pout: pout0,
                    prgu: prgu0,
                    matrix,
                });
            }

            let state = read_states[ri].as_mut().unwrap();
            let mut prgv = likelihood::score_windowed(&state.matrix, &altseq, read.pos as i64);

            if !config.pao {
                for xa in &read.multimap {
                    let xa_refseq = match refcache.fetch(&xa.chr) {
                        Ok(f) => f.seq,
                        Err(_) => continue,
                    };
                    let xa_pos = xa.pos() as i64;
                    let strand_differs = xa.is_reverse() != read.reverse;
                    let rc;
                    let reversed_matrix;
                    let matrix_prime: &ProbMatrix = if strand_differs {
                        rc = reverse_complement(&read.qseq);
                        reversed_matrix = state.matrix.reversed(&rc);
                        &reversed_matrix
                    } else {
                        &state.matrix
                    };

                    let mut readprob = likelihood::score_windowed(matrix_prime, &xa_refseq, xa_pos);

                    if s == 0 {
                        let xa_elsewhere = likelihood::elsewhere(matrix_prime, read.inferred_length);
                        state.pout = state.pout.ln_add_exp(xa_elsewhere);
                        state.prgu = state.prgu.ln_add_exp(readprob);
                    }

                    if xa.chr == read.chr && (xa_pos - anchor_pos).abs() < 50 {
                        readprob = likelihood::score_windowed(matrix_prime, &altseq, xa_pos);
                    }

                    prgv = prgv.ln_add_exp(readprob);
                }
            }

            if s == 0 {
                state.prgu = LogProb(lambda).ln_add_exp(state.pout).ln_add_exp(state.prgu);
            }
            prgv = LogProb(lambda).ln_add_exp(state.pout).ln_add_exp(prgv);

            let prgu = state.prgu;

            let phet = {
                let m1 = LogProb(0.5f64.ln() + *prgv).ln_add_exp(LogProb(0.5f64.ln() + *prgu));
                let m2 = LogProb(0.1f64.ln() + *prgv).ln_add_exp(LogProb(0.9f64.ln() + *prgu));
                let m3 = LogProb(0.9f64.ln() + *prgv).ln_add_exp(LogProb(0.1f64.ln() + *prgu));
                [m1, m2, m3]
                    .iter()
                    .cloned()
                    .fold(LogProb::ln_zero(), |acc, v| if *v > *acc { v } else { acc })
            };

            if *prgv - *prgu > LN_2 {
                alt_count[s] += 1;
            } else if *prgu - *prgv > LN_2 {
                ref_count[s] += 1;
            }

            if s == 0 {
                ref_acc = ref_acc.ln_add_exp(LogProb(*prgu + refprior));
            }
            alt_acc[s] = alt_acc[s].ln_add_exp(LogProb(*prgv + alt_prior));
            het_acc[s] = het_acc[s].ln_add_exp(LogProb(phet + het_prior));

            if config.verbose {
                trace.push(format!(
                    "prgu={:e}\tphet={:e}\tprgv={:e}\tpout={:e}\talt_count={}\tread={}\tset={}",
                    prgu.exp(),
                    phet.exp(),
                    prgv.exp(),
                    state.pout.exp(),
                    alt_count[s],
                    read.name,
                    format_combo(&combo_variants),
                ));
            }
        }

        if config.verbose {
            trace.push(format!(
                "#combination {} alt={:e} het={:e} alt_reads={} ref_reads={}",
                s,
                alt_acc[s].exp(),
                het_acc[s].exp(),
                alt_count[s],
                ref_count[s],
            ));
        }
    }

    // Marginalization step (§4.6.5): `total` intentionally keeps only
    // the last iterated combination's alt/het accumulator, reproducing
    // the upstream behavior rather than a true marginal across all
    // combinations. See DESIGN.md.
    let last = combinations.len() - 1;
    let total = ref_acc.ln_add_exp(alt_acc[last].ln_add_exp(het_acc[last]));

    let mut rows = Vec::with_capacity(n);
    for (vi, _variant) in variant_set.iter().enumerate() {
        let mut has_alt = LogProb(0.0);
        let mut has_alt_assigned = false;
        let mut not_alt_reduce = LogProb(0.0);
        let mut not_alt_assigned = false;
        let mut has_alt_count = 0u32;

        for (s, combo) in combinations.iter().enumerate() {
            let contains = combo.contains(&vi);
            let combined = alt_acc[s].ln_add_exp(het_acc[s]);

            if contains {
                if !has_alt_assigned && *has_alt == 0.0 {
                    has_alt = combined;
                    has_alt_assigned = true;
                } else {
                    has_alt = has_alt.ln_add_exp(combined);
                }
                if alt_count[s] > has_alt_count {
                    has_alt_count = alt_count[s];
                }
            } else if !not_alt_assigned && *not_alt_reduce == 0.0 {
                not_alt_reduce = combined;
                not_alt_assigned = true;
            } else {
                not_alt_reduce = not_alt_reduce.ln_add_exp(combined);
            }
        }

        let not_alt = LogProb(*ref_acc + *not_alt_reduce);

        let read_count = ref_count.iter().cloned().max().unwrap_or(0)
            + alt_count.iter().cloned().max().unwrap_or(0);

        let prob = (*has_alt - *total) / std::f64::consts::LN_10;
        let odds = (*has_alt - *not_alt) / std::f64::consts::LN_10;

        rows.push(VariantResult {
            read_count,
            has_alt_count,
            prob,
            odds,
        });
    }

    let best_combination = if config.mvh {
        combinations
            .iter()
            .enumerate()
            .max_by(|(a, _), (b, _)| {
                let va = *alt_acc[*a].ln_add_exp(het_acc[*a]);
                let vb = *alt_acc[*b].ln_add_exp(het_acc[*b]);
                va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(_, combo)| combo.clone())
    } else {
        None
    };

    EvaluationOutput {
        rows,
        trace,
        best_combination,
    }
}

fn format_combo(variants: &[&Variant]) -> String {
    variants
        .iter()
        .map(|v| format!("{}:{}", v.chr, v.pos))
        .collect::<Vec<_>>()
        .join(",")
}
