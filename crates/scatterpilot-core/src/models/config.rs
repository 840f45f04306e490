//! Configuration structures for the dialogue service.

use serde::{Deserialize, Serialize};

use crate::dialogue::DelayPolicy;

/// Main configuration for scatterpilot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// Dialogue engine configuration.
    pub dialogue: DialogueConfig,

    /// Conversation store configuration.
    pub sessions: SessionConfig,

    /// Request validation configuration.
    pub input: InputConfig,
}

/// Dialogue engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Emulate backend latency before each reply.
    pub simulate_latency: bool,

    /// Lower bound of the simulated latency in milliseconds.
    pub delay_min_ms: u64,

    /// Upper bound of the simulated latency in milliseconds.
    pub delay_max_ms: u64,

    /// Days between invoice date and the default due date.
    pub default_due_days: u32,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            simulate_latency: false,
            delay_min_ms: 800,
            delay_max_ms: 1500,
            default_due_days: 30,
        }
    }
}

impl DialogueConfig {
    /// Delay policy derived from the latency settings.
    pub fn delay_policy(&self) -> DelayPolicy {
        if self.simulate_latency {
            DelayPolicy::uniform(self.delay_min_ms, self.delay_max_ms)
        } else {
            DelayPolicy::None
        }
    }
}

/// Conversation store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a conversation is evicted.
    pub ttl_secs: u64,

    /// Maximum number of live conversations (0 = unlimited).
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_sessions: 1000,
        }
    }
}

/// Request validation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
        }
    }
}

impl ScatterConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engine cannot honor.
    pub fn check(&self) -> crate::Result<()> {
        if self.dialogue.delay_min_ms > self.dialogue.delay_max_ms {
            return Err(crate::ScatterError::Config(format!(
                "dialogue.delay_min_ms ({}) is greater than dialogue.delay_max_ms ({})",
                self.dialogue.delay_min_ms, self.dialogue.delay_max_ms
            )));
        }
        if self.input.max_message_length == 0 {
            return Err(crate::ScatterError::Config(
                "input.max_message_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ScatterConfig::default();
        config.dialogue.default_due_days = 14;
        config.save(&path).unwrap();

        let loaded = ScatterConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sessions": {"ttl_secs": 60}}"#).unwrap();

        let loaded = ScatterConfig::from_file(&path).unwrap();
        assert_eq!(loaded.sessions.ttl_secs, 60);
        assert_eq!(loaded.sessions.max_sessions, 1000);
        assert_eq!(loaded.dialogue.delay_min_ms, 800);
        assert_eq!(loaded.input.max_message_length, 2000);
    }

    #[test]
    fn test_inverted_delay_bounds_rejected() {
        let mut config = ScatterConfig::default();
        config.dialogue.delay_min_ms = 2000;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_delay_policy_disabled_by_default() {
        assert_eq!(ScatterConfig::default().dialogue.delay_policy(), DelayPolicy::None);
    }
}
