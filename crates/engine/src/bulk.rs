//! Bulk extraction: one uploaded document, every tag in a period.
//!
//! Discovery-based — tags are enumerated from the document itself, not from a
//! predetermined list. Per-tag failures are collected as data and never abort
//! the batch; the successful subset commits atomically at the end.

use serde::Serialize;

use crate::config::MatchPolicy;
use crate::error::{ExtractError, ValueFailure};
use crate::grid::{CellRef, Grid};
use crate::model::{TaskId, ValidationId, ValidationRecord};
use crate::scan::{scan_all, DuplicateHit};
use crate::store::{AccountStore, TaskStore, ValidationStore};
use crate::sync::{project_onto_task, resolve_task};
use crate::tag::ReconTag;
use crate::validation::{build, ValidationContext};

/// Why one tag produced no validation record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "error")]
pub enum BulkErrorKind {
    /// Adjacent cell missing or non-numeric.
    ValueExtraction { failure: ValueFailure },
    /// The tag matches the grammar and period but no registered account owns it.
    UnknownAccount,
}

impl std::fmt::Display for BulkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValueExtraction { failure } => write!(f, "{failure}"),
            Self::UnknownAccount => write!(f, "no account owns this tag"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkTagError {
    pub tag: ReconTag,
    #[serde(flatten)]
    pub kind: BulkErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<CellRef>,
}

/// A committed validation from a bulk run.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedValidation {
    pub id: ValidationId,
    pub tag: ReconTag,
    pub task_id: Option<TaskId>,
    pub validation: ValidationRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkMeta {
    pub period_id: u32,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub meta: BulkMeta,
    pub created: Vec<CreatedValidation>,
    /// Tags registered for the period but absent from the document.
    pub missing_tags: Vec<ReconTag>,
    pub errors: Vec<BulkTagError>,
    pub duplicates: Vec<DuplicateHit>,
}

impl BulkResult {
    /// One-line human summary, shown on stderr by the CLI.
    pub fn summary(&self) -> String {
        let matched = self.created.iter().filter(|c| c.validation.matches_balance).count();
        let mut parts = vec![format!(
            "created {} validation{} ({} matched)",
            self.created.len(),
            if self.created.len() == 1 { "" } else { "s" },
            matched,
        )];
        if !self.missing_tags.is_empty() {
            parts.push(format!("{} expected tag(s) not in document", self.missing_tags.len()));
        }
        if !self.errors.is_empty() {
            parts.push(format!("{} tag error(s)", self.errors.len()));
        }
        if !self.duplicates.is_empty() {
            parts.push(format!("{} duplicate tag warning(s)", self.duplicates.len()));
        }
        parts.join(", ")
    }
}

/// Run the full pipeline over every tag for `period_id` found in `grid`.
///
/// Each tag is processed independently: resolve its account, build the
/// validation, resolve its task link. Failures become entries in
/// [`BulkResult::errors`]. The successful subset is committed in one atomic
/// batch; task projections are applied only after the commit succeeds, so a
/// persistence fault leaves neither half-written records nor stale task
/// fields.
pub fn run_bulk<S>(
    store: &mut S,
    grid: &Grid,
    period_id: u32,
    policy: &MatchPolicy,
    evidence_reference: Option<&str>,
) -> Result<BulkResult, ExtractError>
where
    S: AccountStore + TaskStore + ValidationStore,
{
    let report = scan_all(grid, period_id);

    let mut errors: Vec<BulkTagError> = Vec::new();
    let mut pending: Vec<(ReconTag, ValidationRecord)> = Vec::new();

    for hit in &report.hits {
        let Some(account) = store.account_by_tag(&hit.tag) else {
            errors.push(BulkTagError {
                tag: hit.tag.clone(),
                kind: BulkErrorKind::UnknownAccount,
                location: Some(hit.location),
            });
            continue;
        };

        let context = ValidationContext {
            notes: None,
            evidence_reference: evidence_reference.map(str::to_string),
        };
        let mut record = build(account, Some(hit.value), None, context, policy)?;
        record.task_id = resolve_task(store, record.account_id, None)?;
        pending.push((hit.tag.clone(), record));
    }

    for failure in &report.failures {
        errors.push(BulkTagError {
            tag: failure.tag.clone(),
            kind: BulkErrorKind::ValueExtraction { failure: failure.failure.clone() },
            location: Some(failure.location),
        });
    }

    // Registry tags expected for this period but never seen in the document.
    let seen: Vec<&ReconTag> = report.tags_seen();
    let mut missing_tags: Vec<ReconTag> = store
        .accounts_in_period(period_id)
        .iter()
        .map(|a| a.reconciliation_tag.clone())
        .filter(|tag| !seen.contains(&tag))
        .collect();
    missing_tags.sort();

    // Atomic commit of the successful subset, then the task projections.
    let (tags, records): (Vec<ReconTag>, Vec<ValidationRecord>) = pending.into_iter().unzip();
    let ids = store.commit_validations(records.clone())?;

    let mut created = Vec::with_capacity(ids.len());
    for ((id, tag), record) in ids.into_iter().zip(tags).zip(records) {
        project_onto_task(store, &record)?;
        created.push(CreatedValidation { id, tag, task_id: record.task_id, validation: record });
    }

    Ok(BulkResult {
        meta: BulkMeta {
            period_id,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        created,
        missing_tags,
        errors,
        duplicates: report.duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, TaskRecord, TaskType};
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn grid(data: &[&[&str]]) -> Grid {
        Grid::single_sheet(
            "upload",
            data.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        )
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let cash = store.add_account(1, "1000", "Cash", dec("5000.00")).unwrap();
        let ar = store.add_account(1, "1200", "AR", dec("3500.50")).unwrap();
        store.add_account(1, "2100", "AP", dec("-2000.00")).unwrap();
        store.add_task(cash, "validate cash", TaskType::Validation);
        store.add_task(ar, "validate AR", TaskType::Validation);
        store
    }

    #[test]
    fn all_tags_found_and_matched() {
        let mut store = seeded_store();
        let g = grid(&[
            &["Account", "Balance", "Tag"],
            &["Cash", "5000.00", "TB-1-1000"],
            &["AR", "3500.50", "TB-1-1200"],
            &["AP", "(2,000.00)", "TB-1-2100"],
        ]);
        let result =
            run_bulk(&mut store, &g, 1, &MatchPolicy::default(), Some("upload.csv")).unwrap();

        assert_eq!(result.created.len(), 3);
        assert!(result.missing_tags.is_empty());
        assert!(result.errors.is_empty());
        assert!(result.created.iter().all(|c| c.validation.matches_balance));
        assert!(result.created.iter().all(|c| c.validation.auto_extracted));
        assert_eq!(
            result.created[0].validation.evidence_reference.as_deref(),
            Some("upload.csv")
        );
        assert_eq!(store.validation_count(), 3);
    }

    #[test]
    fn missing_registry_tags_are_reported() {
        let mut store = seeded_store();
        let g = grid(&[
            &["Cash", "5000.00", "TB-1-1000"],
            &["AR", "3500.50", "TB-1-1200"],
        ]);
        let result = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        assert_eq!(result.created.len(), 2);
        let missing: Vec<String> = result.missing_tags.iter().map(|t| t.to_string()).collect();
        assert_eq!(missing, ["TB-1-2100"]);
    }

    #[test]
    fn per_tag_failure_does_not_abort_the_batch() {
        let mut store = seeded_store();
        let g = grid(&[
            &["Cash", "5000.00", "TB-1-1000"],
            &["AR", "pending", "TB-1-1200"],
            &["AP", "(2000.00)", "TB-1-2100"],
        ]);
        let result = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        assert_eq!(result.created.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].tag.to_string(), "TB-1-1200");
        assert!(matches!(result.errors[0].kind, BulkErrorKind::ValueExtraction { .. }));
        // The failed tag was seen, so it is not "missing".
        assert!(result.missing_tags.is_empty());
        assert_eq!(store.validation_count(), 2);
    }

    #[test]
    fn unregistered_tag_is_an_error_not_a_crash() {
        let mut store = seeded_store();
        let g = grid(&[&["Mystery", "123.00", "TB-1-9999"]]);
        let result = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        assert!(result.created.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0].kind, BulkErrorKind::UnknownAccount));
    }

    #[test]
    fn other_period_tags_do_not_leak_in() {
        let mut store = seeded_store();
        store.add_account(2, "1000", "Cash P2", dec("6000.00")).unwrap();
        let g = grid(&[
            &["Cash P1", "5000.00", "TB-1-1000"],
            &["Cash P2", "6000.00", "TB-2-1000"],
        ]);
        let result = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        assert_eq!(result.created.len(), 1);
        assert_eq!(result.created[0].tag.to_string(), "TB-1-1000");
    }

    #[test]
    fn duplicate_tag_warns_and_first_value_wins() {
        let mut store = seeded_store();
        let g = grid(&[
            &["Cash", "5000.00", "TB-1-1000"],
            &["Cash again", "9999.00", "TB-1-1000"],
        ]);
        let result = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        assert_eq!(result.created.len(), 1);
        assert_eq!(result.created[0].validation.supporting_amount, dec("5000.00"));
        assert_eq!(result.duplicates.len(), 1);
    }

    #[test]
    fn task_projection_applied_per_created_validation() {
        let mut store = seeded_store();
        let g = grid(&[&["Cash", "4800.00", "TB-1-1000"]]);
        let result = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        let task_id = result.created[0].task_id.expect("cash task should link");
        let task = store.task(task_id).unwrap();
        assert_eq!(task.validation_amount, Some(dec("4800.00")));
        assert_eq!(task.validation_difference, Some(dec("200.00")));
        assert_eq!(task.validation_matches, Some(false));
    }

    #[test]
    fn rerun_is_value_stable_but_appends_records() {
        let mut store = seeded_store();
        let g = grid(&[&["Cash", "5000.00", "TB-1-1000"]]);
        let first = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();
        let second = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap();

        let a = &first.created[0].validation;
        let b = &second.created[0].validation;
        assert_eq!(a.supporting_amount, b.supporting_amount);
        assert_eq!(a.difference, b.difference);
        assert_eq!(a.matches_balance, b.matches_balance);
        // Each run creates a new record, by design.
        assert_eq!(store.validation_count(), 2);
    }

    // Store wrapper whose commit always faults, for the atomicity contract.
    struct FaultyCommit {
        inner: MemoryStore,
    }

    impl AccountStore for FaultyCommit {
        fn account_by_tag(&self, tag: &ReconTag) -> Option<&crate::model::Account> {
            self.inner.account_by_tag(tag)
        }
        fn accounts_in_period(&self, period_id: u32) -> Vec<&crate::model::Account> {
            self.inner.accounts_in_period(period_id)
        }
        fn tag_exists(&self, tag: &ReconTag) -> bool {
            self.inner.tag_exists(tag)
        }
    }

    impl TaskStore for FaultyCommit {
        fn task(&self, id: crate::model::TaskId) -> Option<&TaskRecord> {
            self.inner.task(id)
        }
        fn tasks_for_account(&self, account_id: AccountId) -> Vec<&TaskRecord> {
            self.inner.tasks_for_account(account_id)
        }
        fn apply_projection(
            &mut self,
            id: crate::model::TaskId,
            projection: &crate::model::ValidationProjection,
        ) -> Result<(), ExtractError> {
            self.inner.apply_projection(id, projection)
        }
    }

    impl ValidationStore for FaultyCommit {
        fn commit_validations(
            &mut self,
            _records: Vec<ValidationRecord>,
        ) -> Result<Vec<ValidationId>, ExtractError> {
            Err(ExtractError::Store("connection lost".into()))
        }
    }

    #[test]
    fn commit_fault_leaves_no_partial_state() {
        let mut store = FaultyCommit { inner: seeded_store() };
        let g = grid(&[&["Cash", "4800.00", "TB-1-1000"]]);
        let err = run_bulk(&mut store, &g, 1, &MatchPolicy::default(), None).unwrap_err();
        assert!(matches!(err, ExtractError::Store(_)));

        assert_eq!(store.inner.validation_count(), 0);
        // Projections are applied after commit, so the task is untouched too.
        let tasks = store.tasks_for_account(AccountId(1));
        assert_eq!(tasks[0].validation_amount, None);
    }
}
