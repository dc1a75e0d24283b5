//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder
//! library. The decoder is intentionally simple - batch orchestration,
//! output formatting and the like are handled by the application layer.

use crate::cantp::MidMessagePolicy;
use crate::types::CanIdFormat;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Arbitration ID format of the incoming frames
    #[serde(default = "default_id_format")]
    pub id_format: CanIdFormat,

    /// What to do when a First/Single frame arrives mid-collection
    #[serde(default)]
    pub mid_message_policy: MidMessagePolicy,

    /// Optional: only decode responses on these arbitration IDs
    #[serde(default)]
    pub response_filter: Option<Vec<u32>>,
}

fn default_id_format() -> CanIdFormat {
    CanIdFormat::ElevenBit
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            id_format: default_id_format(),
            mid_message_policy: MidMessagePolicy::default(),
            response_filter: None,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the arbitration ID format
    pub fn with_id_format(mut self, id_format: CanIdFormat) -> Self {
        self.id_format = id_format;
        self
    }

    /// Builder method: set the mid-message policy
    pub fn with_mid_message_policy(mut self, policy: MidMessagePolicy) -> Self {
        self.mid_message_policy = policy;
        self
    }

    /// Builder method: set the response ID filter
    pub fn with_response_filter(mut self, response_ids: Vec<u32>) -> Self {
        self.response_filter = Some(response_ids);
        self
    }

    /// Check if a response arbitration ID should be decoded
    pub fn should_process_response(&self, can_id: u32) -> bool {
        match &self.response_filter {
            Some(ids) => ids.contains(&can_id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_id_format(CanIdFormat::TwentyNineBit)
            .with_mid_message_policy(MidMessagePolicy::Restart)
            .with_response_filter(vec![0x7A8, 0x7EC]);

        assert_eq!(config.id_format, CanIdFormat::TwentyNineBit);
        assert_eq!(config.mid_message_policy, MidMessagePolicy::Restart);
        assert_eq!(config.response_filter, Some(vec![0x7A8, 0x7EC]));
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new().with_response_filter(vec![0x7A8]);
        assert!(config.should_process_response(0x7A8));
        assert!(!config.should_process_response(0x7EC));

        // Without a filter, everything should pass
        let config = DecoderConfig::new();
        assert!(config.should_process_response(0x7EC));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DecoderConfig::new().with_mid_message_policy(MidMessagePolicy::Restart);
        let json = serde_json::to_string(&config).unwrap();
        let restored: DecoderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.mid_message_policy, MidMessagePolicy::Restart);
        assert_eq!(restored.id_format, CanIdFormat::ElevenBit);
    }
}
