//! Core types for the OBD response decoder library
//!
//! This module defines all the fundamental types that the decoder produces when
//! processing diagnostic responses. The decoder is stateless and only outputs
//! decoded responses - it does not track signal history or build reports.

use std::collections::HashMap;
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Arbitration ID format of a CAN frame
///
/// Governs both the hex width of the ID in a transcript line (3 vs 8 digits)
/// and the valid ID range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanIdFormat {
    /// Standard 11-bit identifier (0..=0x7FF)
    ElevenBit,
    /// Extended 29-bit identifier (0..=0x1FFFFFFF)
    TwentyNineBit,
}

impl CanIdFormat {
    /// Number of hex digits the arbitration ID occupies in a transcript line
    pub fn hex_digits(&self) -> usize {
        match self {
            CanIdFormat::ElevenBit => 3,
            CanIdFormat::TwentyNineBit => 8,
        }
    }

    /// Largest arbitration ID representable in this format
    pub fn max_id(&self) -> u32 {
        match self {
            CanIdFormat::ElevenBit => 0x7FF,
            CanIdFormat::TwentyNineBit => 0x1FFF_FFFF,
        }
    }
}

impl fmt::Display for CanIdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanIdFormat::ElevenBit => write!(f, "11-bit"),
            CanIdFormat::TwentyNineBit => write!(f, "29-bit"),
        }
    }
}

/// A single raw CAN frame parsed from a response transcript
///
/// This represents one classic CAN frame (up to 8 data bytes) before any
/// ISO-TP reassembly or signal decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN arbitration ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame data bytes (1-8 bytes for classic CAN)
    pub data: Vec<u8>,
    /// Declared arbitration ID format
    pub id_format: CanIdFormat,
}

impl CanFrame {
    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed frame: {0}")]
    FrameFormat(String),

    #[error("ISO-TP protocol violation on CAN ID 0x{can_id:X}: {reason}")]
    ReassemblyProtocol { can_id: u32, reason: String },

    #[error("No signal set matches model year {0}")]
    UnresolvedSignalSet(u32),

    #[error("Failed to parse signal set: {0}")]
    SignalsetParse(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded signal with its physical value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal id from the signal set catalog
    pub name: String,
    /// Decoded physical value
    pub value: SignalValue,
    /// Engineering unit (e.g., "psi", "°C", "V")
    pub unit: Option<String>,
    /// Raw value before scaling (useful for debugging)
    pub raw_value: i64,
}

/// Signal value types produced by the decoder
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    /// Signed integer value
    Integer(i64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Boolean value (single-bit unscaled signals)
    Boolean(bool),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "1" } else { "0" }),
        }
    }
}

impl SignalValue {
    /// Convert signal value to f64 for uniform comparison
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Integer(v) => *v as f64,
            SignalValue::Float(v) => *v,
            SignalValue::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Convert signal value to i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SignalValue::Integer(v) => Some(*v),
            SignalValue::Float(v) => Some(*v as i64),
            SignalValue::Boolean(v) => Some(if *v { 1 } else { 0 }),
        }
    }
}

/// Recoverable problems encountered while decoding a single response
///
/// A warning aborts only the signal it names; the rest of the response
/// still decodes.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeWarning {
    /// A signal's bit range extends past the end of the assembled payload
    SignalOutOfBounds {
        signal: String,
        required_bytes: usize,
        payload_len: usize,
    },
    /// A table-formula signal's raw value has no entry in its lookup table
    UnmappedTableValue { signal: String, raw: i64 },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::SignalOutOfBounds {
                signal,
                required_bytes,
                payload_len,
            } => write!(
                f,
                "signal '{}' needs {} bytes but payload has {}",
                signal, required_bytes, payload_len
            ),
            DecodeWarning::UnmappedTableValue { signal, raw } => {
                write!(f, "signal '{}' has no table entry for raw value {}", signal, raw)
            }
        }
    }
}

/// One fully decoded diagnostic response
///
/// Produced from a single assembled ISO-TP payload and the signal
/// definitions resolved for its arbitration ID. Contains exactly the
/// signals that were both applicable and not sentinel-suppressed.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResponse {
    /// Arbitration ID the response arrived on
    pub can_id: u32,
    /// Length of the assembled payload in bytes
    pub payload_len: usize,
    /// Decoded signals, in signal set order
    pub signals: Vec<DecodedSignal>,
    /// Per-signal problems that did not abort the response
    pub warnings: Vec<DecodeWarning>,
}

impl DecodedResponse {
    /// Look up a decoded signal by name
    pub fn signal(&self, name: &str) -> Option<&DecodedSignal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Collapse the response into a name → value mapping
    pub fn values(&self) -> HashMap<&str, f64> {
        self.signals
            .iter()
            .map(|s| (s.name.as_str(), s.value.as_f64()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_value_conversions() {
        let int_val = SignalValue::Integer(42);
        assert_eq!(int_val.as_f64(), 42.0);
        assert_eq!(int_val.as_i64(), Some(42));

        let float_val = SignalValue::Float(542.1);
        assert_eq!(float_val.as_f64(), 542.1);
        assert_eq!(float_val.as_i64(), Some(542));

        let bool_val = SignalValue::Boolean(true);
        assert_eq!(bool_val.as_f64(), 1.0);
        assert_eq!(bool_val.as_i64(), Some(1));
    }

    #[test]
    fn test_id_format_limits() {
        assert_eq!(CanIdFormat::ElevenBit.hex_digits(), 3);
        assert_eq!(CanIdFormat::ElevenBit.max_id(), 0x7FF);
        assert_eq!(CanIdFormat::TwentyNineBit.hex_digits(), 8);
        assert_eq!(CanIdFormat::TwentyNineBit.max_id(), 0x1FFF_FFFF);
    }

    #[test]
    fn test_response_lookup() {
        let response = DecodedResponse {
            can_id: 0x7A8,
            payload_len: 36,
            signals: vec![DecodedSignal {
                name: "TP_FL".to_string(),
                value: SignalValue::Float(38.6),
                unit: Some("psi".to_string()),
                raw_value: 193,
            }],
            warnings: Vec::new(),
        };

        assert_eq!(response.signal("TP_FL").unwrap().value.as_f64(), 38.6);
        assert!(response.signal("TP_RR").is_none());
        assert_eq!(response.values()["TP_FL"], 38.6);
    }
}
