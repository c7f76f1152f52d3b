use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::tag::ReconTag;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ValidationId(pub u64);

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One ledger line within a period's trial balance.
///
/// `reconciliation_tag` is assigned at creation and never mutated or reused;
/// uniqueness is enforced by the store at registration time.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub period_id: u32,
    pub account_number: String,
    pub name: String,
    pub expected_balance: Decimal,
    pub reconciliation_tag: ReconTag,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Prep,
    Validation,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prep => write!(f, "prep"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// A close task. The four `validation_*` fields are a projection of the most
/// recent validation record linked to the task — not an independent source of
/// truth. They are only ever written through the task synchronizer.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub account_id: AccountId,
    pub name: String,
    pub task_type: TaskType,
    pub validation_amount: Option<Decimal>,
    pub validation_difference: Option<Decimal>,
    pub validation_matches: Option<bool>,
    pub validation_notes: Option<String>,
}

/// The slice of a validation record mirrored onto its linked task.
///
/// `notes: None` means "leave the task's existing notes untouched"; the other
/// three fields always overwrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationProjection {
    pub amount: Decimal,
    pub difference: Decimal,
    pub matches: bool,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation record
// ---------------------------------------------------------------------------

/// One reconciliation attempt for an account. Immutable audit record once
/// committed; an account accumulates one per attempt and the latest wins for
/// the task projection.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRecord {
    pub account_id: AccountId,
    pub task_id: Option<TaskId>,
    pub supporting_amount: Decimal,
    pub difference: Decimal,
    pub matches_balance: bool,
    /// True when the amount came out of a document scan rather than manual entry.
    pub auto_extracted: bool,
    pub notes: Option<String>,
    /// Opaque pointer into the file-storage collaborator; not interpreted here.
    pub evidence_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ValidationRecord {
    pub fn projection(&self) -> ValidationProjection {
        ValidationProjection {
            amount: self.supporting_amount,
            difference: self.difference,
            matches: self.matches_balance,
            // Empty notes degrade gracefully instead of wiping the task's.
            notes: self.notes.as_deref().filter(|n| !n.trim().is_empty()).map(str::to_string),
        }
    }
}
