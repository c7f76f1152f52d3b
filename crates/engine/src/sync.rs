//! Mirrors a validation record onto its linked task.
//!
//! The task's four `validation_*` fields are a one-directional projection of
//! the most recent validation record; this module is the only code path that
//! writes them. Callers never sync tasks themselves.
//!
//! Linking and projecting are separate steps: callers resolve the link before
//! committing the record and project only after the commit succeeds, so a
//! persistence fault never leaves a task carrying fields from a record that
//! was never persisted.

use crate::error::ExtractError;
use crate::model::{AccountId, TaskId, TaskType, ValidationRecord};
use crate::store::TaskStore;

/// Pick the task a new validation should attach to.
///
/// Precedence, first match wins:
/// 1. an explicitly supplied task id — honored even for prep-typed tasks,
///    but it must exist;
/// 2. the earliest-created validation-typed task associated with the account;
/// 3. none — the validation record stands alone.
pub fn resolve_task<S: TaskStore>(
    store: &S,
    account_id: AccountId,
    explicit_task_id: Option<TaskId>,
) -> Result<Option<TaskId>, ExtractError> {
    if let Some(id) = explicit_task_id {
        if store.task(id).is_none() {
            return Err(ExtractError::UnknownTask(id.0));
        }
        return Ok(Some(id));
    }

    Ok(store
        .tasks_for_account(account_id)
        .into_iter()
        .find(|t| t.task_type == TaskType::Validation)
        .map(|t| t.id))
}

/// Overwrite the linked task's projection fields from `record`.
///
/// The most recent validation always wins; there is no merge of historical
/// values. Blank notes leave the task's existing notes untouched. No-op when
/// the record is unlinked. Returns whether a task was written.
pub fn project_onto_task<S: TaskStore>(
    store: &mut S,
    record: &ValidationRecord,
) -> Result<bool, ExtractError> {
    match record.task_id {
        Some(task_id) => {
            store.apply_projection(task_id, &record.projection())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn record(account_id: AccountId, notes: Option<&str>) -> ValidationRecord {
        ValidationRecord {
            account_id,
            task_id: None,
            supporting_amount: dec("4800.00"),
            difference: dec("200.00"),
            matches_balance: false,
            auto_extracted: true,
            notes: notes.map(str::to_string),
            evidence_reference: None,
            created_at: Utc::now(),
        }
    }

    fn link_and_project(
        store: &mut MemoryStore,
        rec: &mut ValidationRecord,
        explicit: Option<TaskId>,
    ) -> Result<bool, ExtractError> {
        rec.task_id = resolve_task(store, rec.account_id, explicit)?;
        project_onto_task(store, rec)
    }

    fn store_with_tasks() -> (MemoryStore, AccountId, TaskId, TaskId, TaskId) {
        let mut store = MemoryStore::new();
        let acct = store.add_account(1, "1000", "Cash", dec("5000.00")).unwrap();
        let prep = store.add_task(acct, "prep cash", TaskType::Prep);
        let val1 = store.add_task(acct, "validate cash", TaskType::Validation);
        let val2 = store.add_task(acct, "re-validate cash", TaskType::Validation);
        (store, acct, prep, val1, val2)
    }

    #[test]
    fn auto_discovery_picks_earliest_validation_task() {
        let (mut store, acct, _prep, val1, _val2) = store_with_tasks();
        let mut rec = record(acct, None);
        let linked = link_and_project(&mut store, &mut rec, None).unwrap();
        assert!(linked);
        assert_eq!(rec.task_id, Some(val1));

        let task = store.task(val1).unwrap();
        assert_eq!(task.validation_amount, Some(dec("4800.00")));
        assert_eq!(task.validation_difference, Some(dec("200.00")));
        assert_eq!(task.validation_matches, Some(false));
    }

    #[test]
    fn explicit_task_id_wins_even_for_prep_tasks() {
        let (mut store, acct, prep, val1, _val2) = store_with_tasks();
        let mut rec = record(acct, None);
        link_and_project(&mut store, &mut rec, Some(prep)).unwrap();
        assert_eq!(rec.task_id, Some(prep));

        // The auto-discoverable validation task was not touched.
        assert_eq!(store.task(val1).unwrap().validation_amount, None);
        assert_eq!(store.task(prep).unwrap().validation_amount, Some(dec("4800.00")));
    }

    #[test]
    fn unknown_explicit_task_is_an_error() {
        let (store, acct, ..) = store_with_tasks();
        let err = resolve_task(&store, acct, Some(TaskId(999))).unwrap_err();
        assert!(matches!(err, ExtractError::UnknownTask(999)));
    }

    #[test]
    fn no_candidate_task_leaves_record_standalone() {
        let mut store = MemoryStore::new();
        let acct = store.add_account(1, "1000", "Cash", dec("5000.00")).unwrap();
        store.add_task(acct, "prep cash", TaskType::Prep);

        let mut rec = record(acct, None);
        let linked = link_and_project(&mut store, &mut rec, None).unwrap();
        assert!(!linked);
        assert_eq!(rec.task_id, None);
    }

    #[test]
    fn unlinked_record_projects_nothing() {
        let (mut store, acct, _prep, val1, _val2) = store_with_tasks();
        let rec = record(acct, None);
        assert!(!project_onto_task(&mut store, &rec).unwrap());
        assert_eq!(store.task(val1).unwrap().validation_amount, None);
    }

    #[test]
    fn latest_validation_wins_on_the_task() {
        let (mut store, acct, _prep, val1, _val2) = store_with_tasks();

        let mut first = record(acct, Some("short by 200"));
        link_and_project(&mut store, &mut first, None).unwrap();

        let mut second = record(acct, None);
        second.supporting_amount = dec("5000.00");
        second.difference = dec("0.00");
        second.matches_balance = true;
        link_and_project(&mut store, &mut second, None).unwrap();

        let task = store.task(val1).unwrap();
        assert_eq!(task.validation_amount, Some(dec("5000.00")));
        assert_eq!(task.validation_matches, Some(true));
        // Blank notes on the newer validation preserved the older note.
        assert_eq!(task.validation_notes.as_deref(), Some("short by 200"));
    }

    #[test]
    fn fresh_notes_replace_old_ones() {
        let (mut store, acct, _prep, val1, _val2) = store_with_tasks();

        let mut first = record(acct, Some("short by 200"));
        link_and_project(&mut store, &mut first, None).unwrap();
        let mut second = record(acct, Some("resolved: deposit in transit"));
        link_and_project(&mut store, &mut second, None).unwrap();

        assert_eq!(
            store.task(val1).unwrap().validation_notes.as_deref(),
            Some("resolved: deposit in transit")
        );
    }
}
