//! Unified signal database
//!
//! Combines signal set catalogs for multiple model-year ranges into a
//! single queryable database, and resolves the applicable set for a
//! given model year.

use std::collections::{BTreeMap, HashMap};

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Big-endian (Motorola format)
    BigEndian,
    /// Little-endian (Intel format)
    LittleEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Signed integer (two's complement)
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// Exact rational scale factor
///
/// Scaling is `raw * mul / div`, computed so that one- and two-decimal
/// quantities come out equal to their decimal literals instead of drifting
/// (542.1, not 542.099999...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    /// Numerator
    pub mul: i64,
    /// Denominator, always positive
    pub div: i64,
}

impl Rational {
    /// The identity scale (raw value passes through unchanged)
    pub const IDENTITY: Rational = Rational { mul: 1, div: 1 };

    /// True if scaling leaves integers as integers
    pub fn is_integral(&self) -> bool {
        self.div == 1
    }

    /// Apply the scale to a raw value
    pub fn apply(&self, raw: i64) -> f64 {
        (raw as f64 * self.mul as f64) / self.div as f64
    }

    /// Number of decimal places this scale can produce (0 when the scale
    /// is not a finite decimal within 9 places)
    pub fn decimal_places(&self) -> u32 {
        // A scale of mul/div yields d decimals when mul * 10^d is divisible
        // by div; the smallest such d is the declared precision.
        let mut scaled: i128 = self.mul as i128;
        for d in 0..=9 {
            if scaled % self.div as i128 == 0 {
                return d;
            }
            scaled *= 10;
        }
        0
    }
}

/// Formula overriding the plain scale/bias conversion
///
/// A closed set of formula kinds keeps the decode engine auditable and
/// total; there is deliberately no expression interpreter here.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// Linear transform: `raw * scale + bias`
    Linear { scale: Rational, bias: f64 },
    /// Enumeration lookup: raw value → mapped value (fan status,
    /// charging flags). A raw value missing from the table suppresses
    /// the signal with a warning.
    Table(BTreeMap<i64, f64>),
}

/// A signal definition: where a signal lives in an assembled payload and
/// how its raw bits become a physical value
///
/// Offsets are relative to the start of the assembled payload, service
/// byte and parameter ID included.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// Stable signal id from the catalog
    pub id: String,
    /// Human-readable description (optional catalog metadata)
    pub name: Option<String>,
    /// Byte offset into the assembled payload
    pub byte_offset: usize,
    /// Bit offset within the byte, 0-7; 0 is the most significant bit
    pub bit_offset: u8,
    /// Field width in bits; may cross byte boundaries
    pub bit_length: u16,
    /// Byte order for multi-byte extraction
    pub byte_order: ByteOrder,
    /// Signed/unsigned interpretation of the raw bits
    pub value_type: ValueType,
    /// Scale factor applied to the raw value
    pub scale: Rational,
    /// Additive offset applied after scaling
    pub bias: f64,
    /// Optional formula that fully replaces the scale/bias step
    pub formula: Option<Formula>,
    /// Raw bit pattern meaning "signal not available"; matching payloads
    /// omit the signal instead of decoding it
    pub sentinel: Option<u64>,
    /// Engineering unit (informational)
    pub unit: Option<String>,
    /// Minimum plausible physical value (informational)
    pub min: Option<f64>,
    /// Maximum plausible physical value (informational)
    pub max: Option<f64>,
}

/// The request that produces a response, as recorded in the catalog
///
/// Kept for display and diagnostics; this library never constructs or
/// transmits requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Request header (arbitration ID the request is sent on)
    pub header_id: u32,
    /// Response arbitration ID
    pub response_id: u32,
    /// Diagnostic service (e.g. 0x22 ReadDataByIdentifier)
    pub service: u8,
    /// Parameter ID the request asks for, as catalog hex
    pub pid: String,
}

/// One signal set catalog: the signals applicable to a model-year range
#[derive(Debug, Clone)]
pub struct SignalSet {
    /// Source name (catalog filename or caller-supplied label)
    pub source: String,
    /// First model year this set applies to (open-ended if absent)
    pub year_from: Option<u32>,
    /// Last model year this set applies to (open-ended if absent)
    pub year_to: Option<u32>,
    /// Requests recorded in the catalog, in file order
    pub requests: Vec<RequestDescriptor>,
    /// Signal definitions keyed by response arbitration ID, in file order
    responses: HashMap<u32, Vec<SignalDefinition>>,
}

impl SignalSet {
    /// Create an empty signal set
    pub fn new(source: impl Into<String>, year_from: Option<u32>, year_to: Option<u32>) -> Self {
        SignalSet {
            source: source.into(),
            year_from,
            year_to,
            requests: Vec::new(),
            responses: HashMap::new(),
        }
    }

    /// Record a request and its signals under the response arbitration ID
    pub fn add_request(&mut self, request: RequestDescriptor, signals: Vec<SignalDefinition>) {
        self.responses
            .entry(request.response_id)
            .or_default()
            .extend(signals);
        self.requests.push(request);
    }

    /// True if this set covers the given model year
    ///
    /// Open range ends match everything on that side; a set with no range
    /// at all is a fallback default.
    pub fn covers(&self, model_year: u32) -> bool {
        self.year_from.map_or(true, |from| model_year >= from)
            && self.year_to.map_or(true, |to| model_year <= to)
    }

    /// True if this set declares no model-year range
    pub fn is_default(&self) -> bool {
        self.year_from.is_none() && self.year_to.is_none()
    }

    /// The ordered signal definitions for a response arbitration ID
    pub fn signals_for(&self, can_id: u32) -> Option<&[SignalDefinition]> {
        self.responses.get(&can_id).map(Vec::as_slice)
    }

    /// All response arbitration IDs this set decodes
    pub fn response_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.responses.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Total number of signal definitions in this set
    pub fn num_signals(&self) -> usize {
        self.responses.values().map(Vec::len).sum()
    }
}

/// The unified signal database
///
/// Holds every loaded signal set and resolves which one applies to a
/// model year.
pub struct SignalDatabase {
    sets: Vec<SignalSet>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        SignalDatabase { sets: Vec::new() }
    }

    /// Add a signal set to the database
    pub fn add_set(&mut self, set: SignalSet) {
        self.sets.push(set);
    }

    /// Resolve the signal set applicable to a model year
    ///
    /// Year-ranged sets win over fallback defaults; among equals the first
    /// loaded wins. No match is a configuration error
    /// (`DecoderError::UnresolvedSignalSet`), reported to the caller.
    pub fn resolve(&self, model_year: u32) -> crate::types::Result<&SignalSet> {
        self.sets
            .iter()
            .filter(|set| !set.is_default())
            .find(|set| set.covers(model_year))
            .or_else(|| self.sets.iter().find(|set| set.is_default()))
            .ok_or(crate::types::DecoderError::UnresolvedSignalSet(model_year))
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_sets: self.sets.len(),
            num_requests: self.sets.iter().map(|s| s.requests.len()).sum(),
            num_signals: self.sets.iter().map(SignalSet::num_signals).sum(),
        }
    }
}

impl Default for SignalDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of loaded signal sets
    pub num_sets: usize,
    /// Total number of recorded requests
    pub num_requests: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}
