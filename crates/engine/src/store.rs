//! Collaborator interfaces consumed by the extraction pipeline, plus the
//! in-memory implementation used by the CLI and tests.
//!
//! The engine never talks to a database directly; it sees accounts, tasks,
//! and a commit primitive through these traits. Tag uniqueness is the store's
//! job at registration time — there is no in-process locking, and concurrent
//! validations for the same account are resolved last-write-wins on the task
//! projection.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::ExtractError;
use crate::model::{
    Account, AccountId, TaskId, TaskRecord, TaskType, ValidationId, ValidationProjection,
    ValidationRecord,
};
use crate::tag::ReconTag;

/// Account lookup by tag and by period.
pub trait AccountStore {
    fn account_by_tag(&self, tag: &ReconTag) -> Option<&Account>;
    fn accounts_in_period(&self, period_id: u32) -> Vec<&Account>;
    fn tag_exists(&self, tag: &ReconTag) -> bool;
}

/// Task lookup and the single write path for validation projections.
pub trait TaskStore {
    fn task(&self, id: TaskId) -> Option<&TaskRecord>;
    /// Tasks associated with an account, in insertion (creation) order.
    fn tasks_for_account(&self, account_id: AccountId) -> Vec<&TaskRecord>;
    /// Overwrite the task's projection fields. `projection.notes == None`
    /// leaves the task's existing notes in place.
    fn apply_projection(
        &mut self,
        id: TaskId,
        projection: &ValidationProjection,
    ) -> Result<(), ExtractError>;
}

/// Persistence commit primitive for validation records.
pub trait ValidationStore {
    /// Persist a batch atomically: on any error, none of the records are
    /// written. Returns the assigned ids in input order.
    fn commit_validations(
        &mut self,
        records: Vec<ValidationRecord>,
    ) -> Result<Vec<ValidationId>, ExtractError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Vec<Account>,
    tags: HashMap<ReconTag, AccountId>,
    tasks: Vec<TaskRecord>,
    validations: Vec<(ValidationId, ValidationRecord)>,
    next_account: u64,
    next_task: u64,
    next_validation: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account, generating its reconciliation tag. Fails with
    /// `DuplicateTag` if the generated tag already exists — a collision means
    /// the caller violated account-number uniqueness, and must never be
    /// papered over by overwriting the existing owner.
    pub fn add_account(
        &mut self,
        period_id: u32,
        account_number: &str,
        name: &str,
        expected_balance: Decimal,
    ) -> Result<AccountId, ExtractError> {
        let tag = ReconTag::generate(period_id, account_number)?;
        if self.tag_exists(&tag) {
            return Err(ExtractError::DuplicateTag(tag.to_string()));
        }

        self.next_account += 1;
        let id = AccountId(self.next_account);
        self.tags.insert(tag.clone(), id);
        self.accounts.push(Account {
            id,
            period_id,
            account_number: account_number.to_string(),
            name: name.to_string(),
            expected_balance,
            reconciliation_tag: tag,
        });
        Ok(id)
    }

    pub fn add_task(&mut self, account_id: AccountId, name: &str, task_type: TaskType) -> TaskId {
        self.next_task += 1;
        let id = TaskId(self.next_task);
        self.tasks.push(TaskRecord {
            id,
            account_id,
            name: name.to_string(),
            task_type,
            validation_amount: None,
            validation_difference: None,
            validation_matches: None,
            validation_notes: None,
        });
        id
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn validation(&self, id: ValidationId) -> Option<&ValidationRecord> {
        self.validations.iter().find(|(vid, _)| *vid == id).map(|(_, r)| r)
    }

    pub fn validations_for_account(&self, account_id: AccountId) -> Vec<&ValidationRecord> {
        self.validations
            .iter()
            .filter(|(_, r)| r.account_id == account_id)
            .map(|(_, r)| r)
            .collect()
    }

    pub fn validation_count(&self) -> usize {
        self.validations.len()
    }
}

impl AccountStore for MemoryStore {
    fn account_by_tag(&self, tag: &ReconTag) -> Option<&Account> {
        let id = self.tags.get(tag)?;
        self.accounts.iter().find(|a| a.id == *id)
    }

    fn accounts_in_period(&self, period_id: u32) -> Vec<&Account> {
        self.accounts.iter().filter(|a| a.period_id == period_id).collect()
    }

    fn tag_exists(&self, tag: &ReconTag) -> bool {
        self.tags.contains_key(tag)
    }
}

impl TaskStore for MemoryStore {
    fn task(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn tasks_for_account(&self, account_id: AccountId) -> Vec<&TaskRecord> {
        self.tasks.iter().filter(|t| t.account_id == account_id).collect()
    }

    fn apply_projection(
        &mut self,
        id: TaskId,
        projection: &ValidationProjection,
    ) -> Result<(), ExtractError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ExtractError::UnknownTask(id.0))?;

        task.validation_amount = Some(projection.amount);
        task.validation_difference = Some(projection.difference);
        task.validation_matches = Some(projection.matches);
        if let Some(ref notes) = projection.notes {
            task.validation_notes = Some(notes.clone());
        }
        Ok(())
    }
}

impl ValidationStore for MemoryStore {
    fn commit_validations(
        &mut self,
        records: Vec<ValidationRecord>,
    ) -> Result<Vec<ValidationId>, ExtractError> {
        // Validate the whole batch before writing any of it.
        for record in &records {
            if self.account(record.account_id).is_none() {
                return Err(ExtractError::Store(format!(
                    "unknown account id {} in validation batch",
                    record.account_id.0
                )));
            }
        }

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            self.next_validation += 1;
            let id = ValidationId(self.next_validation);
            self.validations.push((id, record));
            ids.push(id);
        }
        Ok(ids)
    }
}
