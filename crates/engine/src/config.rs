use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ExtractError;

/// Match policy for validation records.
///
/// The default is zero tolerance: `matches_balance` is true only on exact
/// equality. A relaxed tolerance treats the boundary inclusively — a
/// difference exactly at the tolerance still counts as matching.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchPolicy {
    #[serde(default)]
    pub tolerance: Decimal,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self { tolerance: Decimal::ZERO }
    }
}

impl MatchPolicy {
    pub fn from_toml(input: &str) -> Result<Self, ExtractError> {
        let policy: MatchPolicy =
            toml::from_str(input).map_err(|e| ExtractError::PolicyParse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.tolerance.is_sign_negative() {
            return Err(ExtractError::PolicyValidation(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Inclusive boundary: |difference| == tolerance matches.
    pub fn matches(&self, difference: Decimal) -> bool {
        difference.abs() <= self.tolerance
    }
}
