//! OBD Response Decoder Library
//!
//! A stateless, reusable library for decoding captured vehicle diagnostic
//! responses into named, physically-scaled signals using model-year-specific
//! signal set catalogs.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on decoding:
//! - Parses hex transcripts of captured CAN frames
//! - Reconstructs ISO-TP (ISO 15765-2) multi-frame messages per arbitration ID
//! - Resolves the signal set applicable to a model year
//! - Extracts signals bit-precisely (sub-byte offsets, arbitrary widths,
//!   signedness, endianness) and applies exact rational scaling
//!
//! The library does NOT:
//! - Talk to a live bus or any adapter hardware
//! - Construct requests or choose parameter IDs
//! - Track signal history or persist decoded values
//! - Generate reports
//!
//! All higher-level functionality is in the application layer (obd-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use obd_decoder::{Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! // Create decoder and load signal set catalogs
//! let mut decoder = Decoder::new();
//! decoder.add_signalset(Path::new("kia-ev9.json")).unwrap();
//!
//! // Decode one captured exchange
//! let transcript = "\
//! 7CE101462B002D00000
//! 7CE2100FF9A00000000
//! 7CE2218510000000000";
//!
//! let responses = decoder
//!     .decode_exchange(2024, transcript, DecoderConfig::new())
//!     .unwrap();
//!
//! for response in responses {
//!     for signal in &response.signals {
//!         println!("{} = {}", signal.name, signal.value);
//!     }
//! }
//! ```

// Public modules
pub mod cantp;
pub mod config;
pub mod decoder;
pub mod formats;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use cantp::{AssembledPayload, MidMessagePolicy, Reassembler, TpFrame};
pub use config::DecoderConfig;
pub use decoder::{DatabaseStats, DecodeSession, Decoder};
pub use signal_decoder::SignalDecoder;
pub use types::{
    CanFrame, CanIdFormat, DecodeWarning, DecodedResponse, DecodedSignal, DecoderError, Result,
    SignalValue,
};

// Internal modules (not exposed in public API)
mod signal_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
