use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::model::{Row, Side};

/// Separator used by the default extractor.
pub const DEFAULT_VALUE_SEPARATOR: &str = " ";

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// An extractor asked for a column the row does not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumn {
    pub column: String,
}

impl MissingColumn {
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into() }
    }
}

/// A rule could not be evaluated for one matched pair of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMissing {
    /// Composite key of the matched pair.
    pub key: String,
    /// Side whose row lacks the column.
    pub side: Side,
    pub column: String,
    pub keys_a: Vec<String>,
    pub keys_b: Vec<String>,
    pub row: Row,
}

impl ColumnMissing {
    /// Columns the rule requested from the failing side.
    pub fn requested(&self) -> &[String] {
        match self.side {
            Side::A => &self.keys_a,
            Side::B => &self.keys_b,
        }
    }
}

impl fmt::Display for ColumnMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "in row {} of file {}, key [{}] is not found. All keys list: [{}]",
            self.row,
            self.side,
            self.column,
            self.requested().join(", ")
        )
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

type ExtractFn = dyn Fn(&Row, &[String]) -> Result<String, MissingColumn> + Send + Sync;

/// How one side's compared value is taken out of its row.
#[derive(Clone)]
pub enum ValueExtractor {
    /// Join the column values in order with a separator.
    Join { separator: String },
    Custom(Arc<ExtractFn>),
}

impl ValueExtractor {
    pub fn join(separator: impl Into<String>) -> Self {
        Self::Join {
            separator: separator.into(),
        }
    }

    pub fn custom<F>(extract: F) -> Self
    where
        F: Fn(&Row, &[String]) -> Result<String, MissingColumn> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(extract))
    }

    pub fn extract(&self, row: &Row, columns: &[String]) -> Result<String, MissingColumn> {
        match self {
            Self::Join { separator } => join_columns(row, columns, separator),
            Self::Custom(extract) => extract(row, columns),
        }
    }
}

impl Default for ValueExtractor {
    fn default() -> Self {
        Self::join(DEFAULT_VALUE_SEPARATOR)
    }
}

impl fmt::Debug for ValueExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join { separator } => write!(f, "Join({separator:?})"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Default extraction: look up every column and join the values with `separator`.
pub fn join_columns(row: &Row, columns: &[String], separator: &str) -> Result<String, MissingColumn> {
    let mut out = String::new();
    for (i, column) in columns.iter().enumerate() {
        let value = row.get(column).ok_or_else(|| MissingColumn::new(column.as_str()))?;
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(value);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

type PredicateFn = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Equality test over the two extracted strings.
#[derive(Clone, Default)]
pub enum ValuePredicate {
    #[default]
    Exact,
    IgnoreCase,
    /// Equal after trimming surrounding whitespace.
    Trimmed,
    /// Both numeric: equal within `tolerance`. Otherwise exact.
    Numeric { tolerance: f64 },
    Custom(Arc<PredicateFn>),
}

impl ValuePredicate {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, value_a: &str, value_b: &str) -> bool {
        match self {
            Self::Exact => value_a == value_b,
            Self::IgnoreCase => value_a.to_lowercase() == value_b.to_lowercase(),
            Self::Trimmed => value_a.trim() == value_b.trim(),
            Self::Numeric { tolerance } => match (Decimal::parse(value_a), Decimal::parse(value_b)) {
                (Some(a), Some(b)) if a == b => true,
                // Beyond 2^53 neighbouring integers share one f64.
                (Some(a), Some(b)) if a.is_large_integer() && b.is_large_integer() => false,
                _ => match (parse_number(value_a), parse_number(value_b)) {
                    (Some(a), Some(b)) => within_tolerance(a, b, *tolerance),
                    _ => value_a == value_b,
                },
            },
            Self::Custom(predicate) => predicate(value_a, value_b),
        }
    }
}

impl fmt::Debug for ValuePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "Exact"),
            Self::IgnoreCase => write!(f, "IgnoreCase"),
            Self::Trimmed => write!(f, "Trimmed"),
            Self::Numeric { tolerance } => write!(f, "Numeric({tolerance})"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Epsilon-inclusive so that decimal boundaries like 0.1 + 0.2 vs 0.3 hold.
fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    let delta = (a - b).abs();
    let scale = 1.0_f64.max(a.abs()).max(b.abs()).max(tolerance);
    delta <= tolerance + f64::EPSILON * 16.0 * scale
}

/// Parse a number the way spreadsheets export them:
/// `$` and thousands commas stripped, `(12.50)` read as `-12.50`.
/// Anything else non-numeric gives `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    let (negative, digits) = numeric_text(s)?;
    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Sign plus unsigned `digits[.digits]` text, under the same rules as
/// [`parse_number`].
fn numeric_text(s: &str) -> Option<(bool, String)> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (parens, inner) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    let (sign_negative, unsigned) = match cleaned.as_bytes().first() {
        Some(b'-') if !parens => (true, &cleaned[1..]),
        Some(b'+') if !parens => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };

    let mut dots = 0;
    let mut digits = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }
    Some((parens || sign_negative, unsigned.to_string()))
}

/// Exact value of a number accepted by [`parse_number`]. Ordering and
/// equality never go through `f64`, so long integer IDs stay distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decimal {
    negative: bool,
    /// No leading zeros.
    int: String,
    /// No trailing zeros.
    frac: String,
}

/// 2^53, the largest integer every `f64` neighbour represents exactly.
const F64_EXACT_INT_LIMIT: &str = "9007199254740992";

impl Decimal {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let (negative, text) = numeric_text(s)?;
        let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let int = int.trim_start_matches('0').to_string();
        let frac = frac.trim_end_matches('0').to_string();
        let negative = negative && !(int.is_empty() && frac.is_empty());
        Some(Self { negative, int, frac })
    }

    /// An integer whose magnitude exceeds 2^53.
    pub(crate) fn is_large_integer(&self) -> bool {
        self.frac.is_empty()
            && (self.int.len() > F64_EXACT_INT_LIMIT.len()
                || (self.int.len() == F64_EXACT_INT_LIMIT.len() && self.int.as_str() > F64_EXACT_INT_LIMIT))
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.int
            .len()
            .cmp(&other.int.len())
            .then_with(|| self.int.cmp(&other.int))
            .then_with(|| self.frac.cmp(&other.frac))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// One field-level equivalence check between a row of A and a row of B.
#[derive(Debug, Clone)]
pub struct ComparisonRule {
    keys_a: Vec<String>,
    keys_b: Vec<String>,
    extractor_a: ValueExtractor,
    extractor_b: ValueExtractor,
    predicate: ValuePredicate,
}

/// Result of evaluating one rule against one matched pair.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Equal,
    Mismatch { value_a: String, value_b: String },
    ColumnMissing(ColumnMissing),
}

impl ComparisonRule {
    pub fn new<IA, SA, IB, SB>(keys_a: IA, keys_b: IB) -> Self
    where
        IA: IntoIterator<Item = SA>,
        SA: Into<String>,
        IB: IntoIterator<Item = SB>,
        SB: Into<String>,
    {
        Self {
            keys_a: keys_a.into_iter().map(Into::into).collect(),
            keys_b: keys_b.into_iter().map(Into::into).collect(),
            extractor_a: ValueExtractor::default(),
            extractor_b: ValueExtractor::default(),
            predicate: ValuePredicate::default(),
        }
    }

    /// One column on each side.
    pub fn single(key_a: impl Into<String>, key_b: impl Into<String>) -> Self {
        Self::new([key_a.into()], [key_b.into()])
    }

    pub fn with_separator_a(mut self, separator: impl Into<String>) -> Self {
        self.extractor_a = ValueExtractor::join(separator);
        self
    }

    pub fn with_separator_b(mut self, separator: impl Into<String>) -> Self {
        self.extractor_b = ValueExtractor::join(separator);
        self
    }

    pub fn with_extractor_a(mut self, extractor: ValueExtractor) -> Self {
        self.extractor_a = extractor;
        self
    }

    pub fn with_extractor_b(mut self, extractor: ValueExtractor) -> Self {
        self.extractor_b = extractor;
        self
    }

    pub fn with_predicate(mut self, predicate: ValuePredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn keys_a(&self) -> &[String] {
        &self.keys_a
    }

    pub fn keys_b(&self) -> &[String] {
        &self.keys_b
    }

    pub fn predicate(&self) -> &ValuePredicate {
        &self.predicate
    }

    /// Extract both values and apply the predicate. A is extracted first;
    /// when it fails B is not looked at.
    pub fn evaluate(&self, key: &str, row_a: &Row, row_b: &Row) -> RuleOutcome {
        let value_a = match self.extractor_a.extract(row_a, &self.keys_a) {
            Ok(v) => v,
            Err(missing) => return self.column_missing(key, Side::A, missing, row_a),
        };
        let value_b = match self.extractor_b.extract(row_b, &self.keys_b) {
            Ok(v) => v,
            Err(missing) => return self.column_missing(key, Side::B, missing, row_b),
        };

        if self.predicate.matches(&value_a, &value_b) {
            RuleOutcome::Equal
        } else {
            RuleOutcome::Mismatch { value_a, value_b }
        }
    }

    fn column_missing(&self, key: &str, side: Side, missing: MissingColumn, row: &Row) -> RuleOutcome {
        RuleOutcome::ColumnMissing(ColumnMissing {
            key: key.to_string(),
            side,
            column: missing.column,
            keys_a: self.keys_a.clone(),
            keys_b: self.keys_b.clone(),
            row: row.clone(),
        })
    }
}
