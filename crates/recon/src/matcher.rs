use crate::detected::{DetectedError, Enrichment, ErrorKind};
use crate::error::ReconError;
use crate::hooks::{DifferenceHooks, RunContext, ValueMismatch};
use crate::index::KeyedRowIndex;
use crate::model::Side;
use crate::rule::{ComparisonRule, RuleOutcome};

/// Join two indices and evaluate `rules` on every matched pair.
///
/// Phase 1 walks `index_a` in key order: keys absent from B are reported,
/// matched pairs run every rule in order. Phase 2 walks `index_b` and
/// reports the keys absent from A. Results keep exactly that order.
pub fn compare(
    index_a: &KeyedRowIndex,
    index_b: &KeyedRowIndex,
    rules: &[ComparisonRule],
    hooks: &dyn DifferenceHooks,
    ctx: &RunContext,
) -> Result<Vec<DetectedError>, ReconError> {
    let mut errors = Vec::new();
    let mut matched = 0usize;

    for (key, row_a) in index_a.iter() {
        let Some(row_b) = index_b.get(key) else {
            errors.push(key_missing(Side::B, key, hooks, ctx)?);
            continue;
        };
        matched += 1;

        for rule in rules {
            match rule.evaluate(key, row_a, row_b) {
                RuleOutcome::Equal => {}
                RuleOutcome::Mismatch { value_a, value_b } => {
                    let mismatch = ValueMismatch {
                        key,
                        keys_a: rule.keys_a(),
                        keys_b: rule.keys_b(),
                        value_a: &value_a,
                        value_b: &value_b,
                    };
                    let mut error = DetectedError::new(ErrorKind::ValueMismatch);
                    hooks.on_value_mismatch(ctx, &mut Enrichment::new(&mut error), &mismatch)?;
                    errors.push(error);
                }
                RuleOutcome::ColumnMissing(failure) => {
                    let mut error = DetectedError::new(ErrorKind::ColumnMissing);
                    hooks.on_column_missing(ctx, &mut Enrichment::new(&mut error), &failure)?;
                    errors.push(error);
                }
            }
        }
    }
    log::debug!(
        "phase 1: {} key(s) in A, {matched} matched, {} finding(s)",
        index_a.len(),
        errors.len()
    );

    let before = errors.len();
    for key in index_b.keys() {
        if !index_a.contains_key(key) {
            errors.push(key_missing(Side::A, key, hooks, ctx)?);
        }
    }
    log::debug!(
        "phase 2: {} key(s) in B, {} only in B",
        index_b.len(),
        errors.len() - before
    );

    Ok(errors)
}

/// `missing_from` is the side that lacks `key`.
fn key_missing(
    missing_from: Side,
    key: &str,
    hooks: &dyn DifferenceHooks,
    ctx: &RunContext,
) -> Result<DetectedError, ReconError> {
    let mut error = DetectedError::new(ErrorKind::KeyMissingInOther { side: missing_from });
    let mut enrichment = Enrichment::new(&mut error);
    enrichment.set_primary_key(missing_from.other(), key);
    hooks.on_key_missing(ctx, &mut enrichment)?;
    Ok(error)
}
