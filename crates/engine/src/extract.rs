//! Single-account extraction: one document (or a manual amount), one account.
//!
//! Unlike the bulk flow, errors here surface directly to the caller — the
//! operator sees the structured reason and can retry with a manual override.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::MatchPolicy;
use crate::error::ExtractError;
use crate::grid::Grid;
use crate::model::{TaskId, ValidationId, ValidationRecord};
use crate::scan::scan_one;
use crate::store::{AccountStore, TaskStore, ValidationStore};
use crate::sync::{project_onto_task, resolve_task};
use crate::tag::ReconTag;
use crate::validation::{build, ValidationContext};

/// Per-request inputs besides the document itself.
#[derive(Debug, Default, Clone)]
pub struct SingleRequest {
    /// Manual override; wins over anything extracted from the document.
    pub manual_amount: Option<Decimal>,
    /// Explicit task to link; wins over auto-discovery.
    pub task_id: Option<TaskId>,
    pub notes: Option<String>,
    pub evidence_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SingleOutcome {
    pub id: ValidationId,
    pub tag: ReconTag,
    pub auto_extracted: bool,
    pub task_id: Option<TaskId>,
    pub validation: ValidationRecord,
}

/// Create one validation for the account identified by `(period_id, account_number)`.
///
/// With a manual amount the document is not scanned at all. Without one, the
/// account's tag is searched for in the grid and the adjacent value
/// extracted; scan and normalization errors propagate to the caller.
pub fn run_single<S>(
    store: &mut S,
    grid: Option<&Grid>,
    period_id: u32,
    account_number: &str,
    request: SingleRequest,
    policy: &MatchPolicy,
) -> Result<SingleOutcome, ExtractError>
where
    S: AccountStore + TaskStore + ValidationStore,
{
    let tag = ReconTag::generate(period_id, account_number)?;
    let account = store
        .account_by_tag(&tag)
        .ok_or_else(|| ExtractError::UnknownAccount(tag.to_string()))?
        .clone();

    let extracted = match (&request.manual_amount, grid) {
        // Explicit user input wins; skip the scan entirely.
        (Some(_), _) => None,
        (None, Some(grid)) => Some(scan_one(grid, &tag)?.value),
        (None, None) => None,
    };

    let context = ValidationContext {
        notes: request.notes,
        evidence_reference: request.evidence_reference,
    };
    let mut record = build(&account, extracted, request.manual_amount, context, policy)?;
    record.task_id = resolve_task(store, record.account_id, request.task_id)?;

    // Commit first, project after: a persistence fault must not leave the
    // task carrying fields from a record that was never persisted.
    let ids = store.commit_validations(vec![record.clone()])?;
    project_onto_task(store, &record)?;

    Ok(SingleOutcome {
        id: ids[0],
        tag,
        auto_extracted: record.auto_extracted,
        task_id: record.task_id,
        validation: record,
    })
}
