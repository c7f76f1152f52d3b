//! Reconciliation tag grammar and generation.
//!
//! Tags are operator-embedded markers of the form `TB-{period_id}-{account_number}`,
//! generated once at account creation and immutable afterwards. `period_id` is
//! a positive integer; `account_number` is alphanumeric with optional hyphens
//! and dots.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ExtractError;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"TB-([1-9]\d*)-([A-Za-z0-9][A-Za-z0-9.\-]*)").expect("valid tag pattern")
    })
}

/// A parsed reconciliation tag. Ordering follows (period, account number) so
/// tag lists sort deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReconTag {
    period_id: u32,
    account_number: String,
}

impl ReconTag {
    /// Deterministic tag for an account. Pure function of its inputs; the
    /// caller is responsible for uniqueness against the persisted set.
    pub fn generate(period_id: u32, account_number: &str) -> Result<Self, ExtractError> {
        if period_id == 0 {
            return Err(ExtractError::InvalidAccountNumber(format!(
                "period id must be positive (account '{account_number}')"
            )));
        }
        let candidate = format!("TB-{period_id}-{account_number}");
        match Self::parse(&candidate) {
            Some(tag) if tag.account_number == account_number => Ok(tag),
            _ => Err(ExtractError::InvalidAccountNumber(account_number.to_string())),
        }
    }

    /// Parse a string that is exactly one tag (no surrounding text).
    pub fn parse(s: &str) -> Option<Self> {
        let caps = tag_pattern().captures(s)?;
        if caps.get(0)?.as_str() != s {
            return None;
        }
        Some(Self {
            period_id: caps[1].parse().ok()?,
            account_number: caps[2].to_string(),
        })
    }

    /// Find a tag embedded anywhere in cell text. Operators paste tags next
    /// to values in working papers, so surrounding text is tolerated.
    pub fn find_in(cell: &str) -> Option<Self> {
        let caps = tag_pattern().captures(cell)?;
        Some(Self {
            period_id: caps[1].parse().ok()?,
            account_number: caps[2].to_string(),
        })
    }

    pub fn period_id(&self) -> u32 {
        self.period_id
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }
}

impl fmt::Display for ReconTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TB-{}-{}", self.period_id, self.account_number)
    }
}

impl Serialize for ReconTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
