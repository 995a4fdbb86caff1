use std::fmt;
use std::sync::Arc;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which of the two compared sources a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One input record: column name → raw string value, in header order.
///
/// Rows read from the same table share one header allocation. A record
/// shorter than its header simply lacks the trailing columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    /// Build a row over a shared header. Values beyond the header are dropped.
    pub fn new(columns: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.truncate(columns.len());
        Self { columns, values }
    }

    /// Value of `column`, or `None` when the row has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Present (column, value) pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }

    /// Number of present columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    /// A repeated column name keeps its first position and takes the last value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        for (k, v) in iter {
            let (k, v) = (k.into(), v.into());
            match columns.iter().position(|c| *c == k) {
                Some(idx) => values[idx] = v,
                None => {
                    columns.push(k);
                    values.push(v);
                }
            }
        }
        Self {
            columns: Arc::from(columns),
            values,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (column, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}={value}")?;
        }
        write!(f, "}}")
    }
}
