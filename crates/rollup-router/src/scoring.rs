//! Chain scoring.
//!
//! Every quote is reduced to three sub-scores in `[0, 100]`:
//! ```text
//! cost_score = clamp(100 − 100·cost/max_cost, 0, 100)
//! time_score = clamp(100 − 100·finalization/max_time, 0, 100)
//! load_score = 100 − load
//! ```
//! `max_cost` / `max_time` are taken over the quotes whose query succeeded
//! (over all quotes if none did), so one pessimistic quote cannot flatten
//! everybody else's score. A zero maximum yields a sub-score of 100.
//!
//! All arithmetic is integer until the final weighting, which uses
//! `Decimal`: rankings are reproducible bit-for-bit.

use rollup_types::{Amount, ScoringWeights, SettlementDecision, constants};
use rust_decimal::Decimal;

use crate::adapter::ChainQuote;

/// Parts-per-million resolution of a ratio before it becomes a score.
const PPM: u128 = 1_000_000;

/// Sub-scores of one quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubScores {
    pub cost: Decimal,
    pub time: Decimal,
    pub load: Decimal,
}

/// `clamp(100 − 100·value/max, 0, 100)` at four decimal places.
#[must_use]
pub fn normalized_inverse(value: u128, max: u128) -> Decimal {
    if max == 0 {
        return Decimal::from(constants::MAX_SCORE);
    }
    if value >= max {
        return Decimal::ZERO;
    }
    let remaining = max - value;
    let ppm = match remaining.checked_mul(PPM) {
        Some(scaled) => scaled / max,
        // max > u128::MAX / PPM here, so max / PPM is far from zero
        None => remaining / (max / PPM),
    }
    .min(PPM);
    // ppm / 1e6 · 100 == ppm / 1e4
    Decimal::new(i64::try_from(ppm).unwrap_or(0), 4)
}

/// `100 − load`, with load capped at 100.
#[must_use]
pub fn load_score(load: u8) -> Decimal {
    Decimal::from(100 - load.min(100))
}

/// Maximum cost over the quotes whose estimate succeeded, or over all quotes.
#[must_use]
pub fn max_cost(quotes: &[ChainQuote]) -> Amount {
    max_over(quotes, |q| !q.cost_degraded, |q| q.cost)
}

/// Maximum finalization time (ms) over the quotes whose metrics succeeded, or over all quotes.
#[must_use]
pub fn max_finalization_ms(quotes: &[ChainQuote]) -> u128 {
    max_over(
        quotes,
        |q| !q.metrics_degraded,
        |q| q.metrics.finalization_time.as_millis(),
    )
}

fn max_over(
    quotes: &[ChainQuote],
    healthy: impl Fn(&ChainQuote) -> bool,
    value: impl Fn(&ChainQuote) -> u128,
) -> u128 {
    let max_healthy = quotes.iter().filter(|&q| healthy(q)).map(&value).max();
    max_healthy
        .or_else(|| quotes.iter().map(&value).max())
        .unwrap_or(0)
}

/// Sub-scores of `quote` against the batch-wide maxima.
#[must_use]
pub fn sub_scores(quote: &ChainQuote, max_cost: Amount, max_time_ms: u128) -> SubScores {
    SubScores {
        cost: normalized_inverse(quote.cost, max_cost),
        time: normalized_inverse(quote.metrics.finalization_time.as_millis(), max_time_ms),
        load: load_score(quote.metrics.load),
    }
}

/// Human-readable reason: every sub-score strictly above `threshold`.
#[must_use]
pub fn reason_for(scores: &SubScores, threshold: Decimal) -> String {
    let parts: Vec<&str> = [
        (scores.cost, "low cost"),
        (scores.time, "fast finality"),
        (scores.load, "low congestion"),
    ]
    .into_iter()
    .filter(|(score, _)| *score > threshold)
    .map(|(_, label)| label)
    .collect();

    if parts.is_empty() {
        "balanced".to_string()
    } else {
        parts.join(", ")
    }
}

/// Score every quote with `weights` and rank the decisions by descending
/// score. The sort is stable: equal scores keep quote (registration) order.
#[must_use]
pub fn rank_quotes(
    quotes: &[ChainQuote],
    weights: &ScoringWeights,
    threshold: Decimal,
) -> Vec<SettlementDecision> {
    let cost_ceiling = max_cost(quotes);
    let time_ceiling = max_finalization_ms(quotes);

    let mut decisions: Vec<SettlementDecision> = quotes
        .iter()
        .map(|quote| {
            let scores = sub_scores(quote, cost_ceiling, time_ceiling);
            let score = weights.combine(scores.cost, scores.time, scores.load);
            tracing::debug!(
                chain = %quote.chain_id,
                cost_score = %scores.cost,
                time_score = %scores.time,
                load_score = %scores.load,
                score = %score,
                "Scored chain"
            );
            SettlementDecision {
                chain_id: quote.chain_id,
                estimated_cost: quote.cost,
                estimated_time: quote.metrics.finalization_time,
                score,
                reason: reason_for(&scores, threshold),
            }
        })
        .collect();

    decisions.sort_by(|a, b| b.score.cmp(&a.score));
    decisions
}
