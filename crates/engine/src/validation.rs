//! Builds validation records from extracted or manually entered amounts.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::config::MatchPolicy;
use crate::error::ExtractError;
use crate::model::{Account, ValidationRecord};

/// Inputs that aren't the amount itself.
#[derive(Debug, Default, Clone)]
pub struct ValidationContext {
    pub notes: Option<String>,
    pub evidence_reference: Option<String>,
}

/// Turn a candidate amount into a validation record for `account`.
///
/// A manual override always wins over an extracted value — explicit user
/// input beats whatever the scanner found. With neither available this fails;
/// a validation requires *some* amount and is never defaulted to zero.
pub fn build(
    account: &Account,
    extracted: Option<Decimal>,
    manual_override: Option<Decimal>,
    context: ValidationContext,
    policy: &MatchPolicy,
) -> Result<ValidationRecord, ExtractError> {
    let auto_extracted = manual_override.is_none() && extracted.is_some();
    let supporting_amount = manual_override.or(extracted).ok_or_else(|| {
        ExtractError::AmountRequired { account_number: account.account_number.clone() }
    })?;

    let difference = account.expected_balance - supporting_amount;

    Ok(ValidationRecord {
        account_id: account.id,
        task_id: None,
        supporting_amount,
        difference,
        matches_balance: policy.matches(difference),
        auto_extracted,
        notes: context.notes,
        evidence_reference: context.evidence_reference,
        created_at: Utc::now(),
    })
}
