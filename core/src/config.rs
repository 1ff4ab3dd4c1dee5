use crate::{
    error::{SimError, SimResult},
    types::Millis,
    zone::ResourceKind,
};
use serde::{Deserialize, Serialize};

// ── Resource schedule ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Wall-clock period between payouts.
    pub distribution_interval_ms: Millis,
    /// Payout before the per-zone doubling is applied.
    pub base_distribution_amount: u64,
    /// One-off credit to every member of a team that captures a zone of this kind.
    pub capture_bonus_amount: u64,
    /// Credited to every actor when a session starts.
    #[serde(default)]
    pub starting_grant: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceTable {
    pub money:   ResourceConfig,
    pub upgrade: ResourceConfig,
}

impl ResourceTable {
    pub fn get(&self, kind: ResourceKind) -> &ResourceConfig {
        match kind {
            ResourceKind::Money   => &self.money,
            ResourceKind::Upgrade => &self.upgrade,
        }
    }
}

// ── Checkpoint timing ──────────────────────────────────────────────

/// The slice of configuration a single checkpoint needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointTiming {
    pub claim_duration:            Millis,
    pub abandon_timeout:           Millis,
    pub contested_notice_cooldown: Millis,
}

impl Default for CheckpointTiming {
    fn default() -> Self {
        StormConfig::default().timing()
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StormConfig {
    /// Uncontested occupation needed to claim (or clear) a zone.
    pub claim_duration_ms: Millis,
    /// Absence tolerated before an in-progress claim/clear resets.
    pub abandon_timeout_ms: Millis,
    /// Minimum gap between two contested notices for the same zone.
    pub contested_notice_cooldown_ms: Millis,
    /// Session length; 0 = unlimited.
    #[serde(default)]
    pub game_duration_ms: Millis,
    /// Logical time added per engine tick.
    pub tick_interval_ms: Millis,
    pub resources: ResourceTable,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            claim_duration_ms:            10_000,
            abandon_timeout_ms:           3_000,
            contested_notice_cooldown_ms: 3_000,
            game_duration_ms:             0,
            tick_interval_ms:             50,
            resources: ResourceTable {
                money: ResourceConfig {
                    distribution_interval_ms: 60_000,
                    base_distribution_amount: 1,
                    capture_bonus_amount:     2,
                    starting_grant:           1,
                },
                upgrade: ResourceConfig {
                    distribution_interval_ms: 300_000,
                    base_distribution_amount: 1,
                    capture_bonus_amount:     1,
                    starting_grant:           1,
                },
            },
        }
    }
}

impl StormConfig {
    /// Load from a JSON file and validate it.
    /// In tests, use StormConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: StormConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with short intervals for unit tests.
    /// Claim/abandon timings match the production defaults so the
    /// gameplay scenarios read the same in tests.
    pub fn default_test() -> Self {
        Self {
            claim_duration_ms:            10_000,
            abandon_timeout_ms:           3_000,
            contested_notice_cooldown_ms: 3_000,
            game_duration_ms:             0,
            tick_interval_ms:             100,
            resources: ResourceTable {
                money: ResourceConfig {
                    distribution_interval_ms: 1_000,
                    base_distribution_amount: 1,
                    capture_bonus_amount:     2,
                    starting_grant:           0,
                },
                upgrade: ResourceConfig {
                    distribution_interval_ms: 5_000,
                    base_distribution_amount: 1,
                    capture_bonus_amount:     1,
                    starting_grant:           0,
                },
            },
        }
    }

    /// Reject settings that would make the simulation meaningless.
    /// Called once, before any tick runs.
    pub fn validate(&self) -> SimResult<()> {
        if self.claim_duration_ms == 0 {
            return Err(SimError::invalid_config("claim_duration_ms must be positive"));
        }
        if self.abandon_timeout_ms == 0 {
            return Err(SimError::invalid_config("abandon_timeout_ms must be positive"));
        }
        if self.tick_interval_ms == 0 {
            return Err(SimError::invalid_config("tick_interval_ms must be positive"));
        }
        for kind in ResourceKind::ALL {
            let resource = self.resources.get(kind);
            if resource.distribution_interval_ms == 0 {
                return Err(SimError::invalid_config(format!(
                    "{kind} distribution_interval_ms must be positive"
                )));
            }
            if resource.base_distribution_amount == 0 {
                return Err(SimError::invalid_config(format!(
                    "{kind} base_distribution_amount must be positive"
                )));
            }
        }
        Ok(())
    }

    pub fn timing(&self) -> CheckpointTiming {
        CheckpointTiming {
            claim_duration:            self.claim_duration_ms,
            abandon_timeout:           self.abandon_timeout_ms,
            contested_notice_cooldown: self.contested_notice_cooldown_ms,
        }
    }

    pub fn resource(&self, kind: ResourceKind) -> &ResourceConfig {
        self.resources.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        StormConfig::default().validate().unwrap();
        StormConfig::default_test().validate().unwrap();
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = StormConfig::default();
        config.resources.upgrade.distribution_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration { .. }), "got {err:?}");
    }

    #[test]
    fn zero_claim_duration_is_rejected() {
        let mut config = StormConfig::default();
        config.claim_duration_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_json_without_optional_fields() {
        let json = r#"{
            "claim_duration_ms": 8000,
            "abandon_timeout_ms": 2000,
            "contested_notice_cooldown_ms": 1000,
            "tick_interval_ms": 50,
            "resources": {
                "money":   { "distribution_interval_ms": 30000, "base_distribution_amount": 2, "capture_bonus_amount": 3 },
                "upgrade": { "distribution_interval_ms": 90000, "base_distribution_amount": 1, "capture_bonus_amount": 1 }
            }
        }"#;
        let config: StormConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.game_duration_ms, 0);
        assert_eq!(config.resource(ResourceKind::Money).base_distribution_amount, 2);
        assert_eq!(config.resource(ResourceKind::Upgrade).starting_grant, 0);
        assert_eq!(config.timing().claim_duration, 8000);
    }
}
