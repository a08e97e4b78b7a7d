//! Session timing and behavior configuration.
//!
//! Durations are serialized as whole milliseconds:
//!
//! ```yaml
//! ack_timeout_ms: 750
//! settle_delay_ms: 500
//! write_delay_ms: 50
//! draw_pacing_ms: 5
//! strict_acks: false
//! draw_acks: false
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result};

/// Timing for a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Longest wait for a chunk acknowledgment.
    #[serde(rename = "ack_timeout_ms", with = "duration_ms")]
    pub ack_timeout: Duration,

    /// Pause after Reset, Ready and game-mode packets.
    #[serde(rename = "settle_delay_ms", with = "duration_ms")]
    pub settle_delay: Duration,

    /// Pause after a write that does not wait for an acknowledgment.
    #[serde(rename = "write_delay_ms", with = "duration_ms")]
    pub write_delay: Duration,

    /// Pause between real-time draw packets.
    #[serde(rename = "draw_pacing_ms", with = "duration_ms")]
    pub draw_pacing: Duration,

    /// Fail the upload when a chunk is not acknowledged.
    pub strict_acks: bool,

    /// Wait for an acknowledgment after each draw packet.
    pub draw_acks: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(750),
            settle_delay: Duration::from_millis(500),
            write_delay: Duration::from_millis(50),
            draw_pacing: Duration::from_millis(5),
            strict_acks: false,
            draw_acks: false,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ack_timeout.is_zero() {
            return Err(ProtocolError::config_error(
                "ack_timeout_ms",
                "acknowledgment timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Zero delays everywhere except the acknowledgment timeout. Useful for
    /// in-memory transports.
    pub fn immediate() -> Self {
        Self {
            ack_timeout: Duration::from_millis(1),
            settle_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
            draw_pacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timing() {
        let config = SessionConfig::default();
        assert_eq!(config.ack_timeout, Duration::from_millis(750));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.write_delay, Duration::from_millis(50));
        assert_eq!(config.draw_pacing, Duration::from_millis(5));
        assert!(!config.strict_acks);
        assert!(!config.draw_acks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = SessionConfig::from_yaml_str("ack_timeout_ms: 1200\nstrict_acks: true\n")
            .unwrap();
        assert_eq!(config.ack_timeout, Duration::from_millis(1200));
        assert!(config.strict_acks);
        assert_eq!(config.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SessionConfig::from_yaml_str("ack_timeout: 750\n").unwrap_err();
        assert!(matches!(err, ProtocolError::Config { .. }), "{err:?}");
    }

    #[test]
    fn zero_ack_timeout_is_rejected() {
        let err = SessionConfig::from_yaml_str("ack_timeout_ms: 0\n").unwrap_err();
        match err {
            ProtocolError::Config { context, .. } => assert_eq!(context, "ack_timeout_ms"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn yaml_round_trip_preserves_values() {
        let config = SessionConfig { draw_acks: true, ..SessionConfig::immediate() };
        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.contains("draw_pacing_ms: 0"));
        assert_eq!(SessionConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
