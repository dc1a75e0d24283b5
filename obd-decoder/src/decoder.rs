//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for loading signal set catalogs
//! and decoding captured diagnostic exchanges.

use crate::cantp::Reassembler;
use crate::config::DecoderConfig;
use crate::signal_decoder::SignalDecoder;
use crate::signals::database::{SignalDatabase, SignalSet};
use crate::types::{CanFrame, DecodedResponse, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Internal signal database (loaded from signal set catalogs)
    signal_db: SignalDatabase,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new() -> Self {
        Self {
            signal_db: SignalDatabase::new(),
        }
    }

    /// Load a signal set catalog file and add it to the database
    ///
    /// # Example
    /// ```no_run
    /// use obd_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_signalset(Path::new("kia-ev9.json")).unwrap();
    /// ```
    pub fn add_signalset(&mut self, path: &Path) -> Result<()> {
        let set = crate::signals::signalset::parse_signalset_file(path)?;
        self.signal_db.add_set(set);
        Ok(())
    }

    /// Load a signal set catalog from a JSON string
    ///
    /// `source` names the catalog in logs and statistics.
    pub fn add_signalset_str(&mut self, json: &str, source: &str) -> Result<()> {
        let set = crate::signals::signalset::parse_signalset_str(json, source)?;
        self.signal_db.add_set(set);
        Ok(())
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }

    /// Start a streaming decode session for one model year
    ///
    /// Resolves the applicable signal set up front; an unknown model year
    /// fails here with `DecoderError::UnresolvedSignalSet` rather than
    /// frame by frame.
    pub fn session(&self, model_year: u32, config: DecoderConfig) -> Result<DecodeSession<'_>> {
        let signal_set = self.signal_db.resolve(model_year)?;
        log::info!(
            "Decoding model year {} with signal set '{}'",
            model_year,
            signal_set.source
        );
        for request in &signal_set.requests {
            log::debug!(
                "  request 0x{:X} service {:02X} pid {} → response 0x{:X}",
                request.header_id,
                request.service,
                request.pid,
                request.response_id
            );
        }
        Ok(DecodeSession::new(signal_set, config))
    }

    /// Decode one captured exchange given as a hex transcript
    ///
    /// Parses the transcript, reassembles ISO-TP messages in arrival order,
    /// and decodes every completed payload against the signal set resolved
    /// for the model year. Frame and reassembly protocol errors abort the
    /// whole exchange; per-signal problems surface as warnings on the
    /// affected response.
    ///
    /// # Example
    /// ```no_run
    /// use obd_decoder::{Decoder, DecoderConfig};
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_signalset_str("{ \"commands\": [] }", "empty.json").unwrap();
    ///
    /// let responses = decoder
    ///     .decode_exchange(2024, "7E80462C00B55", DecoderConfig::new())
    ///     .unwrap();
    /// for response in responses {
    ///     for signal in &response.signals {
    ///         println!("{} = {}", signal.name, signal.value);
    ///     }
    /// }
    /// ```
    pub fn decode_exchange(
        &self,
        model_year: u32,
        transcript: &str,
        config: DecoderConfig,
    ) -> Result<Vec<DecodedResponse>> {
        let frames = crate::formats::parse_transcript(transcript, config.id_format)?;
        self.decode_frames(model_year, &frames, config)
    }

    /// Decode already-parsed frames in arrival order
    pub fn decode_frames(
        &self,
        model_year: u32,
        frames: &[CanFrame],
        config: DecoderConfig,
    ) -> Result<Vec<DecodedResponse>> {
        let mut session = self.session(model_year, config)?;
        let mut responses = Vec::new();

        for frame in frames {
            if let Some(response) = session.push_frame(frame)? {
                responses.push(response);
            }
        }

        if session.in_flight() > 0 {
            log::warn!(
                "Exchange ended with {} incomplete multi-frame message(s)",
                session.in_flight()
            );
        }

        Ok(responses)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A streaming decode session: one signal set, one reassembler
///
/// Frames are pushed in arrival order; a completed ISO-TP payload whose
/// arbitration ID appears in the signal set comes back as a decoded
/// response. Payloads on IDs the set does not describe are skipped.
/// Sessions hold the only mutable state in the library (the reassembly
/// buffers) and assume a single writer.
pub struct DecodeSession<'a> {
    signal_set: &'a SignalSet,
    reassembler: Reassembler,
    config: DecoderConfig,
}

impl<'a> DecodeSession<'a> {
    fn new(signal_set: &'a SignalSet, config: DecoderConfig) -> Self {
        Self {
            signal_set,
            reassembler: Reassembler::with_policy(config.mid_message_policy),
            config,
        }
    }

    /// Process one frame; returns a decoded response when the frame
    /// completes a payload this session's signal set describes
    pub fn push_frame(&mut self, frame: &CanFrame) -> Result<Option<DecodedResponse>> {
        let payload = match self.reassembler.push_frame(frame)? {
            Some(payload) => payload,
            None => return Ok(None),
        };

        if !self.config.should_process_response(payload.can_id) {
            log::debug!("Response on 0x{:X} filtered out", payload.can_id);
            return Ok(None);
        }

        match self.signal_set.signals_for(payload.can_id) {
            Some(definitions) => {
                let response = SignalDecoder::decode_payload(&payload, definitions);
                log::debug!(
                    "Decoded {} signal(s) from 0x{:X} ({} bytes)",
                    response.signals.len(),
                    response.can_id,
                    response.payload_len
                );
                Ok(Some(response))
            }
            None => {
                log::debug!(
                    "No signal definitions for response on 0x{:X}, skipping",
                    payload.can_id
                );
                Ok(None)
            }
        }
    }

    /// Number of arbitration IDs with a multi-frame message still collecting
    pub fn in_flight(&self) -> usize {
        self.reassembler.in_flight()
    }

    /// The signal set this session decodes against
    pub fn signal_set(&self) -> &SignalSet {
        self.signal_set
    }
}

// Re-export DatabaseStats for public API
pub use crate::signals::database::DatabaseStats;
