use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::model::Row;
use crate::rule::Decimal;

// ---------------------------------------------------------------------------
// Composite key
// ---------------------------------------------------------------------------

/// Key columns of one side plus the separator used to join their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub columns: Vec<String>,
    pub separator: String,
}

impl KeySpec {
    pub fn new<I, S>(columns: I, separator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            separator: separator.into(),
        }
    }

    /// Single key column, empty separator.
    pub fn single(column: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            separator: String::new(),
        }
    }

    /// Join the key-column values of `row`. On failure returns the first
    /// absent column.
    pub fn compose(&self, row: &Row) -> Result<String, &str> {
        let mut key = String::new();
        for (i, column) in self.columns.iter().enumerate() {
            let value = row.get(column).ok_or(column.as_str())?;
            if i > 0 {
                key.push_str(&self.separator);
            }
            key.push_str(value);
        }
        Ok(key)
    }

    /// Key-column values of `row` in column order, empty for absent ones.
    pub fn values<'r>(&self, row: &'r Row) -> Vec<&'r str> {
        self.columns
            .iter()
            .map(|c| row.get(c).unwrap_or(""))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Key ordering
// ---------------------------------------------------------------------------

type CompareFn = dyn Fn(&str, &str) -> Ordering + Send + Sync;

enum OrderKind {
    Natural,
    Numeric,
    Prefix(String),
    Custom(Box<CompareFn>),
}

/// Total order over composite keys. Two keys collide when it reports
/// `Equal`, and the index iterates in this order.
#[derive(Clone)]
pub struct KeyOrder(Arc<OrderKind>);

impl KeyOrder {
    /// Lexicographic byte order.
    pub fn natural() -> Self {
        Self(Arc::new(OrderKind::Natural))
    }

    /// Numeric keys by value, ahead of non-numeric keys; the rest lexicographic.
    pub fn numeric() -> Self {
        Self(Arc::new(OrderKind::Numeric))
    }

    /// Compare only the part of each key before the first `delimiter`.
    pub fn prefix_before(delimiter: impl Into<String>) -> Self {
        Self(Arc::new(OrderKind::Prefix(delimiter.into())))
    }

    /// Caller-supplied total order.
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(OrderKind::Custom(Box::new(compare))))
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &*self.0 {
            OrderKind::Natural => a.cmp(b),
            OrderKind::Numeric => match (Decimal::parse(a), Decimal::parse(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.cmp(b),
            },
            OrderKind::Prefix(delimiter) => prefix(a, delimiter).cmp(prefix(b, delimiter)),
            OrderKind::Custom(compare) => compare(a, b),
        }
    }
}

fn prefix<'a>(key: &'a str, delimiter: &str) -> &'a str {
    key.split(delimiter).next().unwrap_or("")
}

impl Default for KeyOrder {
    fn default() -> Self {
        Self::natural()
    }
}

impl fmt::Debug for KeyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            OrderKind::Natural => write!(f, "KeyOrder::Natural"),
            OrderKind::Numeric => write!(f, "KeyOrder::Numeric"),
            OrderKind::Prefix(d) => write!(f, "KeyOrder::Prefix({d:?})"),
            OrderKind::Custom(_) => write!(f, "KeyOrder::Custom"),
        }
    }
}

/// Composite key carrying its ordering, so a `BTreeMap` can be ordered by
/// a runtime comparator. All keys of one map share the same `KeyOrder`.
#[derive(Clone)]
pub(crate) struct OrderedKey {
    pub(crate) text: String,
    order: KeyOrder,
}

impl OrderedKey {
    pub(crate) fn new(text: String, order: &KeyOrder) -> Self {
        Self {
            text,
            order: order.clone(),
        }
    }
}

impl fmt::Debug for OrderedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)
    }
}

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedKey {}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.compare(&self.text, &other.text)
    }
}
