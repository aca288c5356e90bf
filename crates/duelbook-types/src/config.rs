//! Configuration for a Duelbook engine instance.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AdminSet, DuelbookError, Result, constants};

/// Engine-wide settings. The fee percentage and collector remain
/// administrator-adjustable at runtime; this is their starting value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fee taken from cross-pool winnings, in percent (0..=10).
    #[serde(default = "default_fee")]
    pub platform_fee_percentage: u8,
    /// Account that receives platform fees.
    pub fee_collector: AccountId,
    /// The engine's own account: bettors approve it as spender so stakes
    /// can be pulled into vault custody.
    pub operator: AccountId,
    /// Accounts allowed to create events, declare outcomes and adjust fees.
    #[serde(default)]
    pub admins: Vec<AccountId>,
}

fn default_fee() -> u8 {
    constants::DEFAULT_PLATFORM_FEE_PERCENTAGE
}

impl EngineConfig {
    /// Config with the default platform fee.
    #[must_use]
    pub fn new(fee_collector: AccountId, operator: AccountId, admins: Vec<AccountId>) -> Self {
        Self {
            platform_fee_percentage: constants::DEFAULT_PLATFORM_FEE_PERCENTAGE,
            fee_collector,
            operator,
            admins,
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|err| DuelbookError::Configuration(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// - `InvalidFeePercentage` if the fee exceeds the maximum
    /// - `Configuration` if no administrator is configured
    pub fn validate(&self) -> Result<()> {
        validate_fee_percentage(self.platform_fee_percentage)?;
        if self.admins.is_empty() {
            return Err(DuelbookError::Configuration(
                "at least one administrator is required".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured administrators as an authority predicate.
    #[must_use]
    pub fn authority(&self) -> AdminSet {
        AdminSet::new(self.admins.iter().copied())
    }
}

/// Fees are capped at [`constants::MAX_PLATFORM_FEE_PERCENTAGE`].
pub fn validate_fee_percentage(pct: u8) -> Result<()> {
    if pct > constants::MAX_PLATFORM_FEE_PERCENTAGE {
        return Err(DuelbookError::InvalidFeePercentage {
            pct,
            max: constants::MAX_PLATFORM_FEE_PERCENTAGE,
        });
    }
    Ok(())
}
