//! Signal decoding engine
//!
//! Extracts signal values from assembled response payloads based on signal
//! definitions from the signal database. Handles bit extraction across byte
//! boundaries, endianness, sign extension, sentinel suppression, and
//! physical value conversion.
//!
//! Decoding is a pure function of (payload, definitions): the engine holds
//! no state and decoding the same payload twice yields identical results.

use crate::cantp::AssembledPayload;
use crate::signals::database::{ByteOrder, Formula, Rational, SignalDefinition, ValueType};
use crate::types::{DecodeWarning, DecodedResponse, DecodedSignal, SignalValue};

/// Outcome of decoding one signal
enum SignalOutcome {
    Decoded(DecodedSignal),
    /// Sentinel pattern matched; the signal is intentionally absent
    Suppressed,
    Warning(DecodeWarning),
}

/// Signal decoder - extracts signals from assembled payloads
pub struct SignalDecoder;

impl SignalDecoder {
    /// Decode every applicable signal from one assembled payload
    ///
    /// Signals are decoded in definition order. A signal whose bits fall
    /// outside the payload, or whose raw value misses its lookup table,
    /// becomes a warning; a signal whose raw bits equal its sentinel is
    /// omitted silently. Neither aborts the rest of the response.
    pub fn decode_payload(
        payload: &AssembledPayload,
        definitions: &[SignalDefinition],
    ) -> DecodedResponse {
        let mut signals = Vec::new();
        let mut warnings = Vec::new();

        for definition in definitions {
            match Self::decode_signal(&payload.data, definition) {
                SignalOutcome::Decoded(signal) => signals.push(signal),
                SignalOutcome::Suppressed => {
                    log::debug!("Signal '{}' suppressed by sentinel value", definition.id);
                }
                SignalOutcome::Warning(warning) => {
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        DecodedResponse {
            can_id: payload.can_id,
            payload_len: payload.data.len(),
            signals,
            warnings,
        }
    }

    /// Decode a single signal from payload data
    fn decode_signal(data: &[u8], definition: &SignalDefinition) -> SignalOutcome {
        let start_bit = definition.byte_offset * 8 + definition.bit_offset as usize;
        let length = definition.bit_length as usize;

        // Validate the signal fits within the assembled payload
        let required_bytes = (start_bit + length + 7) / 8;
        if required_bytes > data.len() {
            return SignalOutcome::Warning(DecodeWarning::SignalOutOfBounds {
                signal: definition.id.clone(),
                required_bytes,
                payload_len: data.len(),
            });
        }

        // Extract raw bits based on byte order
        let raw_bits = match definition.byte_order {
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
        };

        // A sentinel pattern means "signal not available": absent, not zero
        if definition.sentinel == Some(raw_bits) {
            return SignalOutcome::Suppressed;
        }

        // Apply sign extension if needed
        let raw_value = match definition.value_type {
            ValueType::Unsigned => raw_bits as i64,
            ValueType::Signed => Self::sign_extend(raw_bits, length),
        };

        let value = match &definition.formula {
            Some(Formula::Table(table)) => match table.get(&raw_value) {
                Some(mapped) => Self::numeric(*mapped),
                None => {
                    return SignalOutcome::Warning(DecodeWarning::UnmappedTableValue {
                        signal: definition.id.clone(),
                        raw: raw_value,
                    });
                }
            },
            Some(Formula::Linear { scale, bias }) => {
                Self::apply_linear(raw_value, *scale, *bias, length)
            }
            None => Self::apply_linear(raw_value, definition.scale, definition.bias, length),
        };

        SignalOutcome::Decoded(DecodedSignal {
            name: definition.id.clone(),
            value,
            unit: definition.unit.clone(),
            raw_value,
        })
    }

    /// Convert a raw value to a physical value via scale and bias
    fn apply_linear(raw: i64, scale: Rational, bias: f64, bit_length: usize) -> SignalValue {
        if scale == Rational::IDENTITY && bias == 0.0 && bit_length == 1 {
            // Unscaled single-bit signal
            return SignalValue::Boolean(raw != 0);
        }

        if scale.is_integral() && bias.fract() == 0.0 {
            // Integer in, integer out
            return SignalValue::Integer(raw * scale.mul + bias as i64);
        }

        // Rational scaling with rounding to the scale's own decimal
        // precision keeps one/two-decimal signals exact (542.1, not
        // 542.099999...).
        let mut value = scale.apply(raw) + bias;
        let decimals = scale.decimal_places();
        if decimals > 0 {
            let factor = 10f64.powi(decimals as i32);
            value = (value * factor).round() / factor;
        }
        SignalValue::Float(value)
    }

    /// Wrap a table-mapped value, preserving integer-ness
    fn numeric(value: f64) -> SignalValue {
        if value.fract() == 0.0 {
            SignalValue::Integer(value as i64)
        } else {
            SignalValue::Float(value)
        }
    }

    /// Extract signal bits with big-endian (Motorola) byte order
    ///
    /// Big-endian format:
    /// - The start bit points to the MSB of the signal
    /// - Bit numbering: bit 0 = MSB of byte 0, bit 7 = LSB of byte 0
    /// - The signal grows towards higher bit numbers
    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = 7 - (bit_pos % 8); // Bit 0 = MSB, bit 7 = LSB

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << (length - 1 - i);
            }
        }

        result
    }

    /// Extract signal bits with little-endian (Intel) byte order
    ///
    /// Little-endian format:
    /// - The start bit points to the LSB of the signal
    /// - Bits are numbered from LSB to MSB within each byte
    /// - Byte 0 is the first byte of the payload
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = bit_pos % 8;

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << i;
            }
        }

        result
    }

    /// Sign-extend a value from N bits to 64 bits
    ///
    /// If the value's MSB is 1, fill the upper bits with 1s. This converts
    /// the unsigned representation to the proper two's-complement value.
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}
