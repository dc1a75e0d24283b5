//! Signal set catalog parser
//!
//! Parses JSON signal set catalogs and converts them into our internal
//! signal database format. A catalog describes, for one model-year range,
//! the diagnostic requests a vehicle answers and the signals packed into
//! each response:
//!
//! ```json
//! {
//!   "model_years": [2024, 2026],
//!   "commands": [
//!     {
//!       "hdr": "7A0",
//!       "rax": "7A8",
//!       "cmd": { "22": "C00B" },
//!       "signals": [
//!         { "id": "EV9_TP_FL", "fmt": { "byte": 7, "len": 8, "div": 5, "unit": "psi" } }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Canonical formatting/pretty-printing of catalogs is the authoring
//! pipeline's job; this parser only reads them.

use crate::signals::database::{
    ByteOrder, Formula, Rational, RequestDescriptor, SignalDefinition, SignalSet, ValueType,
};
use crate::types::{DecoderError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct JsonSignalset {
    #[serde(default)]
    model_years: Option<(u32, u32)>,
    commands: Vec<JsonCommand>,
}

#[derive(Debug, Deserialize)]
struct JsonCommand {
    /// Request arbitration ID, hex
    hdr: String,
    /// Response arbitration ID, hex
    rax: String,
    /// Service → parameter ID, e.g. {"22": "C00B"}
    cmd: BTreeMap<String, String>,
    signals: Vec<JsonSignal>,
}

#[derive(Debug, Deserialize)]
struct JsonSignal {
    id: String,
    #[serde(default)]
    name: Option<String>,
    fmt: JsonFmt,
}

#[derive(Debug, Deserialize)]
struct JsonFmt {
    /// Byte offset into the assembled payload
    byte: usize,
    /// Bit offset within the byte (0 = MSB)
    #[serde(default)]
    bit: u8,
    /// Field width in bits
    #[serde(default = "default_len")]
    len: u16,
    /// Two's-complement interpretation
    #[serde(default)]
    sign: bool,
    /// "be" or "le"
    #[serde(default = "default_order")]
    order: String,
    #[serde(default = "default_scale_term")]
    mul: i64,
    #[serde(default = "default_scale_term")]
    div: i64,
    #[serde(default)]
    add: f64,
    /// Raw pattern meaning "not available"
    #[serde(default)]
    nullval: Option<u64>,
    /// Enumeration table: raw value (decimal string key) → mapped value
    #[serde(default)]
    map: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
}

fn default_len() -> u16 {
    8
}

fn default_order() -> String {
    "be".to_string()
}

fn default_scale_term() -> i64 {
    1
}

/// Parse a signal set catalog file
pub fn parse_signalset_file(path: &Path) -> Result<SignalSet> {
    log::info!("Parsing signal set catalog: {:?}", path);

    let content = std::fs::read_to_string(path)?;
    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("signalset.json");

    parse_signalset_str(&content, source)
}

/// Parse a signal set catalog from a JSON string
pub fn parse_signalset_str(json: &str, source: &str) -> Result<SignalSet> {
    let catalog: JsonSignalset = serde_json::from_str(json)
        .map_err(|e| DecoderError::SignalsetParse(format!("{}: {}", source, e)))?;

    let (year_from, year_to) = match catalog.model_years {
        Some((from, to)) => (Some(from), Some(to)),
        None => (None, None),
    };

    let mut set = SignalSet::new(source, year_from, year_to);
    for command in &catalog.commands {
        let (request, signals) = convert_command(command, source)?;
        set.add_request(request, signals);
    }

    log::info!(
        "Parsed {} signals across {} requests from {}",
        set.num_signals(),
        set.requests.len(),
        source
    );
    Ok(set)
}

/// Convert a catalog command into a request descriptor and its signals
fn convert_command(
    command: &JsonCommand,
    source: &str,
) -> Result<(RequestDescriptor, Vec<SignalDefinition>)> {
    let header_id = parse_hex_id(&command.hdr, source)?;
    let response_id = parse_hex_id(&command.rax, source)?;

    let (service_hex, pid) = command.cmd.iter().next().ok_or_else(|| {
        DecoderError::InvalidSignalDefinition(format!("{}: command has an empty cmd map", source))
    })?;
    let service = u8::from_str_radix(service_hex, 16).map_err(|_| {
        DecoderError::InvalidSignalDefinition(format!(
            "{}: bad service id '{}' in cmd map",
            source, service_hex
        ))
    })?;

    let signals = command
        .signals
        .iter()
        .map(|signal| convert_signal(signal, source))
        .collect::<Result<Vec<SignalDefinition>>>()?;

    Ok((
        RequestDescriptor {
            header_id,
            response_id,
            service,
            pid: pid.clone(),
        },
        signals,
    ))
}

/// Convert a catalog signal entry to our SignalDefinition
fn convert_signal(signal: &JsonSignal, source: &str) -> Result<SignalDefinition> {
    let fmt = &signal.fmt;

    if fmt.len == 0 {
        return Err(DecoderError::InvalidSignalDefinition(format!(
            "{}: signal '{}' has zero bit length",
            source, signal.id
        )));
    }
    if fmt.bit > 7 {
        return Err(DecoderError::InvalidSignalDefinition(format!(
            "{}: signal '{}' has bit offset {} (must be 0-7)",
            source, signal.id, fmt.bit
        )));
    }
    if fmt.div <= 0 {
        return Err(DecoderError::InvalidSignalDefinition(format!(
            "{}: signal '{}' has non-positive scale divisor {}",
            source, signal.id, fmt.div
        )));
    }

    let byte_order = match fmt.order.as_str() {
        "be" => ByteOrder::BigEndian,
        "le" => ByteOrder::LittleEndian,
        other => {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: signal '{}' has unknown byte order '{}'",
                source, signal.id, other
            )));
        }
    };

    let formula = match &fmt.map {
        Some(entries) => {
            let mut table = BTreeMap::new();
            for (raw, value) in entries {
                let raw: i64 = raw.parse().map_err(|_| {
                    DecoderError::InvalidSignalDefinition(format!(
                        "{}: signal '{}' has non-numeric table key '{}'",
                        source, signal.id, raw
                    ))
                })?;
                table.insert(raw, *value);
            }
            Some(Formula::Table(table))
        }
        None => None,
    };

    Ok(SignalDefinition {
        id: signal.id.clone(),
        name: signal.name.clone(),
        byte_offset: fmt.byte,
        bit_offset: fmt.bit,
        bit_length: fmt.len,
        byte_order,
        value_type: if fmt.sign {
            ValueType::Signed
        } else {
            ValueType::Unsigned
        },
        scale: Rational {
            mul: fmt.mul,
            div: fmt.div,
        },
        bias: fmt.add,
        formula,
        sentinel: fmt.nullval,
        unit: fmt.unit.clone(),
        min: fmt.min,
        max: fmt.max,
    })
}

fn parse_hex_id(hex: &str, source: &str) -> Result<u32> {
    u32::from_str_radix(hex, 16).map_err(|_| {
        DecoderError::InvalidSignalDefinition(format!(
            "{}: bad arbitration ID '{}' in catalog",
            source, hex
        ))
    })
}
