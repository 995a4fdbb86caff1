use std::ops::Deref;

use serde::Serialize;

use crate::model::Side;

/// What kind of discrepancy was detected. Determines the reason string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The key exists on the other side of `side` only: `side` is where it is missing.
    KeyMissingInOther { side: Side },
    ValueMismatch,
    ColumnMissing,
    DuplicateKeyIgnored,
}

impl ErrorKind {
    pub fn reason(self) -> &'static str {
        match self {
            Self::KeyMissingInOther { side: Side::B } => "primary key is not found in file B",
            Self::KeyMissingInOther { side: Side::A } => "primary key is not found in file A",
            Self::ValueMismatch => "values are not the expected",
            Self::ColumnMissing => "column is not found",
            Self::DuplicateKeyIgnored => "Duplication is found: value is ignored",
        }
    }

    /// Stable snake_case name used in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::KeyMissingInOther { side: Side::B } => "missing_in_b",
            Self::KeyMissingInOther { side: Side::A } => "missing_in_a",
            Self::ValueMismatch => "value_mismatch",
            Self::ColumnMissing => "column_missing",
            Self::DuplicateKeyIgnored => "duplicate_key_ignored",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One discrepancy. Created with only its kind; the contextual fields are
/// filled once through an [`Enrichment`] and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedError {
    kind: ErrorKind,
    reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title_columns_a: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title_columns_b: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_key_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_key_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_b: Option<String>,
}

impl DetectedError {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            reason: kind.reason(),
            file_a: None,
            file_b: None,
            test_folder: None,
            title_columns_a: None,
            title_columns_b: None,
            primary_key_a: None,
            primary_key_b: None,
            value_a: None,
            value_b: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }

    pub fn file_a(&self) -> Option<&str> {
        self.file_a.as_deref()
    }

    pub fn file_b(&self) -> Option<&str> {
        self.file_b.as_deref()
    }

    pub fn test_folder(&self) -> Option<&str> {
        self.test_folder.as_deref()
    }

    pub fn title_columns_a(&self) -> Option<&[String]> {
        self.title_columns_a.as_deref()
    }

    pub fn title_columns_b(&self) -> Option<&[String]> {
        self.title_columns_b.as_deref()
    }

    pub fn primary_key_a(&self) -> Option<&str> {
        self.primary_key_a.as_deref()
    }

    pub fn primary_key_b(&self) -> Option<&str> {
        self.primary_key_b.as_deref()
    }

    pub fn value_a(&self) -> Option<&str> {
        self.value_a.as_deref()
    }

    pub fn value_b(&self) -> Option<&str> {
        self.value_b.as_deref()
    }
}

/// Write access to a fresh [`DetectedError`], handed to hooks before the
/// error is appended to the results. Only the engine creates these.
pub struct Enrichment<'a> {
    error: &'a mut DetectedError,
}

impl<'a> Enrichment<'a> {
    pub(crate) fn new(error: &'a mut DetectedError) -> Self {
        Self { error }
    }

    pub fn set_file_a(&mut self, file: impl Into<String>) -> &mut Self {
        self.error.file_a = Some(file.into());
        self
    }

    pub fn set_file_b(&mut self, file: impl Into<String>) -> &mut Self {
        self.error.file_b = Some(file.into());
        self
    }

    pub fn set_test_folder(&mut self, folder: impl Into<String>) -> &mut Self {
        self.error.test_folder = Some(folder.into());
        self
    }

    pub fn set_title_columns_a(&mut self, columns: &[String]) -> &mut Self {
        self.error.title_columns_a = Some(columns.to_vec());
        self
    }

    pub fn set_title_columns_b(&mut self, columns: &[String]) -> &mut Self {
        self.error.title_columns_b = Some(columns.to_vec());
        self
    }

    pub fn set_primary_key_a(&mut self, key: impl Into<String>) -> &mut Self {
        self.error.primary_key_a = Some(key.into());
        self
    }

    pub fn set_primary_key_b(&mut self, key: impl Into<String>) -> &mut Self {
        self.error.primary_key_b = Some(key.into());
        self
    }

    pub fn set_value_a(&mut self, value: impl Into<String>) -> &mut Self {
        self.error.value_a = Some(value.into());
        self
    }

    pub fn set_value_b(&mut self, value: impl Into<String>) -> &mut Self {
        self.error.value_b = Some(value.into());
        self
    }

    /// Side-addressed setters, for hooks that handle both sides alike.
    pub fn set_file(&mut self, side: Side, file: impl Into<String>) -> &mut Self {
        match side {
            Side::A => self.set_file_a(file),
            Side::B => self.set_file_b(file),
        }
    }

    pub fn set_title_columns(&mut self, side: Side, columns: &[String]) -> &mut Self {
        match side {
            Side::A => self.set_title_columns_a(columns),
            Side::B => self.set_title_columns_b(columns),
        }
    }

    pub fn set_primary_key(&mut self, side: Side, key: impl Into<String>) -> &mut Self {
        match side {
            Side::A => self.set_primary_key_a(key),
            Side::B => self.set_primary_key_b(key),
        }
    }

    pub fn set_value(&mut self, side: Side, value: impl Into<String>) -> &mut Self {
        match side {
            Side::A => self.set_value_a(value),
            Side::B => self.set_value_b(value),
        }
    }
}

impl Deref for Enrichment<'_> {
    type Target = DetectedError;

    fn deref(&self) -> &DetectedError {
        &*self.error
    }
}

/// Render a list as `[a, b]`.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from("[");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(item.as_ref());
    }
    out.push(']');
    out
}
