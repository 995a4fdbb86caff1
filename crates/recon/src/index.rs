use std::collections::BTreeMap;

use crate::detected::{DetectedError, Enrichment, ErrorKind};
use crate::error::ReconError;
use crate::hooks::{DifferenceHooks, DuplicateKey, RunContext};
use crate::key::{KeyOrder, KeySpec, OrderedKey};
use crate::model::{Row, Side};

/// Composite key → row, deduplicated, iterated in key order.
///
/// Two rows whose keys compare equal evict each other: neither is kept, and
/// both are reported as duplicates. The evicted key is free again, so a
/// third row with that key is inserted normally.
#[derive(Debug)]
pub struct KeyedRowIndex {
    side: Side,
    order: KeyOrder,
    map: BTreeMap<OrderedKey, Row>,
}

impl KeyedRowIndex {
    /// Index `rows` in input order. Returns the index and the duplicate
    /// findings, two per collision (incoming row first).
    pub fn build<I>(
        rows: I,
        side: Side,
        key: &KeySpec,
        order: &KeyOrder,
        hooks: &dyn DifferenceHooks,
        ctx: &RunContext,
    ) -> Result<(Self, Vec<DetectedError>), ReconError>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut map: BTreeMap<OrderedKey, Row> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut rows_in = 0usize;

        for row in rows {
            rows_in += 1;
            let text = key.compose(&row).map_err(|column| ReconError::KeyColumnMissing {
                side,
                source: ctx.file(side).to_string(),
                column: column.to_string(),
            })?;

            let incoming = OrderedKey::new(text, order);
            match map.remove_entry(&incoming) {
                None => {
                    map.insert(incoming, row);
                }
                Some((stored_key, stored)) => {
                    log::warn!(
                        "file {side} ({}): duplicate key '{}' by columns [{}], both rows ignored",
                        ctx.file(side),
                        stored_key.text,
                        key.columns.join(", ")
                    );
                    errors.push(duplicate_error(side, key, &incoming.text, &row, hooks, ctx)?);
                    errors.push(duplicate_error(side, key, &stored_key.text, &stored, hooks, ctx)?);
                }
            }
        }

        log::debug!(
            "file {side} ({}): indexed {} key(s) from {rows_in} row(s), {} duplicate finding(s)",
            ctx.file(side),
            map.len(),
            errors.len()
        );

        Ok((
            Self {
                side,
                order: order.clone(),
                map,
            },
            errors,
        ))
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.map.get(&OrderedKey::new(key.to_string(), &self.order))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.map.iter().map(|(k, row)| (k.text.as_str(), row))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|k| k.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn duplicate_error(
    side: Side,
    key: &KeySpec,
    text: &str,
    row: &Row,
    hooks: &dyn DifferenceHooks,
    ctx: &RunContext,
) -> Result<DetectedError, ReconError> {
    let duplicate = DuplicateKey {
        side,
        key: text,
        key_columns: &key.columns,
        key_values: key.values(row),
        row,
    };
    let mut error = DetectedError::new(ErrorKind::DuplicateKeyIgnored);
    hooks.on_duplicate_key(ctx, &mut Enrichment::new(&mut error), &duplicate)?;
    Ok(error)
}
