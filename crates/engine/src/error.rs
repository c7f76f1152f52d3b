use std::fmt;

use serde::Serialize;

use crate::grid::CellRef;

/// Why a tag occurrence yielded no usable value.
///
/// These are per-tag, non-fatal in the bulk flow: they land in the result's
/// error list and processing continues with the next tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "raw")]
pub enum ValueFailure {
    /// Tag sits in the leftmost column; there is no cell to its left.
    NoAdjacentValue,
    /// The adjacent cell is blank.
    EmptyCell,
    /// The adjacent cell text is not numeric after stripping formatting.
    NotNumeric(String),
}

impl fmt::Display for ValueFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdjacentValue => write!(f, "tag has no adjacent value"),
            Self::EmptyCell => write!(f, "adjacent cell is empty"),
            Self::NotNumeric(raw) => write!(f, "cannot extract numeric value from '{raw}'"),
        }
    }
}

#[derive(Debug)]
pub enum ExtractError {
    /// Generated tag collides with an existing one. Indicates an upstream
    /// account-numbering bug; detected, never silently overwritten.
    DuplicateTag(String),
    /// No occurrence of the expected tag in the document.
    TagNotFound(String),
    /// Adjacent cell missing or non-numeric for a tag occurrence.
    ValueExtraction {
        tag: String,
        failure: ValueFailure,
        location: Option<CellRef>,
    },
    /// Neither a manual override nor an extracted value is available.
    AmountRequired { account_number: String },
    /// Account number rejected by the tag grammar.
    InvalidAccountNumber(String),
    /// Tag matches the grammar but no account owns it.
    UnknownAccount(String),
    /// Explicitly supplied task id does not exist.
    UnknownTask(u64),
    /// TOML parse error in a match policy file.
    PolicyParse(String),
    /// Policy validation error (negative tolerance, etc.).
    PolicyValidation(String),
    /// Persistence-layer fault. The batch being committed is rolled back.
    Store(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTag(tag) => write!(f, "duplicate reconciliation tag: {tag}"),
            Self::TagNotFound(tag) => write!(f, "tag {tag} not found in document"),
            Self::ValueExtraction { tag, failure, location } => match location {
                Some(at) => write!(f, "tag {tag} at {at}: {failure}"),
                None => write!(f, "tag {tag}: {failure}"),
            },
            Self::AmountRequired { account_number } => write!(
                f,
                "account {account_number}: either a supporting amount or a document with the reconciliation tag is required"
            ),
            Self::InvalidAccountNumber(number) => {
                write!(f, "invalid account number: '{number}'")
            }
            Self::UnknownAccount(tag) => write!(f, "no account owns tag {tag}"),
            Self::UnknownTask(id) => write!(f, "task {id} not found"),
            Self::PolicyParse(msg) => write!(f, "policy parse error: {msg}"),
            Self::PolicyValidation(msg) => write!(f, "policy validation error: {msg}"),
            Self::Store(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for ExtractError {}
