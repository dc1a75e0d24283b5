//! Hex transcript parser
//!
//! Parses captured diagnostic exchanges written as fixed-width hex lines
//! into CanFrame sequences. Each line is one physical CAN frame: the
//! arbitration ID (3 hex digits for 11-bit IDs, 8 for 29-bit) concatenated
//! with up to 16 hex digits of data (8 bytes). Line order is arrival order.

use crate::types::{CanFrame, CanIdFormat, DecoderError, Result};
use std::path::Path;

/// Parse a single transcript line into a CanFrame
///
/// The line must contain the arbitration ID digits for the declared format
/// followed by an even number of data digits (1-8 bytes). Anything else is
/// a `DecoderError::FrameFormat`.
pub fn parse_frame_line(line: &str, id_format: CanIdFormat) -> Result<CanFrame> {
    let line = line.trim();
    let id_digits = id_format.hex_digits();

    if line.len() < id_digits + 2 {
        return Err(DecoderError::FrameFormat(format!(
            "line '{}' is too short for a {} frame",
            line, id_format
        )));
    }
    if !line.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecoderError::FrameFormat(format!(
            "line '{}' contains non-hex characters",
            line
        )));
    }

    let (id_part, data_part) = line.split_at(id_digits);

    if data_part.len() % 2 != 0 {
        return Err(DecoderError::FrameFormat(format!(
            "line '{}' has an odd number of data digits",
            line
        )));
    }
    if data_part.len() > 16 {
        return Err(DecoderError::FrameFormat(format!(
            "line '{}' carries more than 8 data bytes",
            line
        )));
    }

    // Hex digits validated above, so these parses cannot fail
    let can_id = u32::from_str_radix(id_part, 16)
        .map_err(|e| DecoderError::FrameFormat(format!("bad arbitration ID '{}': {}", id_part, e)))?;

    if can_id > id_format.max_id() {
        return Err(DecoderError::FrameFormat(format!(
            "arbitration ID 0x{:X} does not fit the {} format",
            can_id, id_format
        )));
    }

    let data = (0..data_part.len())
        .step_by(2)
        .map(|i| {
            let pair = &data_part[i..i + 2];
            u8::from_str_radix(pair, 16)
                .map_err(|e| DecoderError::FrameFormat(format!("bad data byte '{}': {}", pair, e)))
        })
        .collect::<Result<Vec<u8>>>()?;

    Ok(CanFrame {
        can_id,
        data,
        id_format,
    })
}

/// Parse a multi-line transcript into CanFrames, preserving arrival order
///
/// Blank lines are skipped; every non-blank line must be a valid frame.
pub fn parse_transcript(text: &str, id_format: CanIdFormat) -> Result<Vec<CanFrame>> {
    let frames = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_frame_line(line, id_format))
        .collect::<Result<Vec<CanFrame>>>()?;

    log::trace!("Parsed {} frames from transcript", frames.len());
    Ok(frames)
}

/// Read a transcript file and parse it into CanFrames
pub fn parse_transcript_file(path: &Path, id_format: CanIdFormat) -> Result<Vec<CanFrame>> {
    log::info!("Parsing transcript file: {:?}", path);
    let text = std::fs::read_to_string(path)?;
    parse_transcript(&text, id_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_eleven_bit_frame() {
        let frame = parse_frame_line("7A8102462C00BFFFFFF", CanIdFormat::ElevenBit).unwrap();
        assert_eq!(frame.can_id, 0x7A8);
        assert_eq!(
            frame.data,
            vec![0x10, 0x24, 0x62, 0xC0, 0x0B, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(frame.dlc(), 8);
    }

    #[test]
    fn test_parse_twenty_nine_bit_frame() {
        let frame = parse_frame_line("18DAF110062EC00B1122", CanIdFormat::TwentyNineBit).unwrap();
        assert_eq!(frame.can_id, 0x18DA_F110);
        assert_eq!(frame.data, vec![0x06, 0x2E, 0xC0, 0x0B, 0x11, 0x22]);
    }

    #[test]
    fn test_reject_non_hex() {
        let err = parse_frame_line("7A8102462C00BFFFFZZ", CanIdFormat::ElevenBit).unwrap_err();
        assert!(matches!(err, DecoderError::FrameFormat(_)));
    }

    #[test]
    fn test_reject_odd_data_digits() {
        let err = parse_frame_line("7A8102462C00BFFFFF", CanIdFormat::ElevenBit).unwrap_err();
        assert!(matches!(err, DecoderError::FrameFormat(_)));
    }

    #[test]
    fn test_reject_out_of_range_id() {
        // 0xFA8 encodes in 3 hex digits but exceeds the 11-bit range
        let err = parse_frame_line("FA80211223344", CanIdFormat::ElevenBit).unwrap_err();
        assert!(matches!(err, DecoderError::FrameFormat(_)));
    }

    #[test]
    fn test_reject_too_short() {
        let err = parse_frame_line("7A8", CanIdFormat::ElevenBit).unwrap_err();
        assert!(matches!(err, DecoderError::FrameFormat(_)));
    }

    #[test]
    fn test_parse_transcript_skips_blank_lines() {
        let text = "\n7CE101462B002D00000\n\n7CE2100FF9A00000000\n7CE2218510000000000\n";
        let frames = parse_transcript(text, CanIdFormat::ElevenBit).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.can_id == 0x7CE));
    }

    #[test]
    fn test_parse_transcript_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "7E80462C00B55").unwrap();
        file.flush().unwrap();

        let frames = parse_transcript_file(file.path(), CanIdFormat::ElevenBit).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].can_id, 0x7E8);
        assert_eq!(frames[0].data, vec![0x04, 0x62, 0xC0, 0x0B, 0x55]);
    }
}
