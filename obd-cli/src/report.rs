//! Report generation
//!
//! Renders decoded responses as a text report or a JSON document.
//! The library emits values; everything about presentation lives here.

use chrono::{DateTime, Utc};
use obd_decoder::{DecodedResponse, SignalValue};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The decoded results for one transcript file
pub struct FileResult {
    pub file: PathBuf,
    pub responses: Vec<DecodedResponse>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    model_year: u32,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    file: &'a Path,
    responses: Vec<JsonResponse>,
}

#[derive(Serialize)]
struct JsonResponse {
    can_id: String,
    payload_len: usize,
    signals: Vec<JsonSignal>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct JsonSignal {
    name: String,
    value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    raw: i64,
}

fn json_value(value: &SignalValue) -> serde_json::Value {
    match value {
        SignalValue::Integer(v) => serde_json::json!(v),
        SignalValue::Float(v) => serde_json::json!(v),
        SignalValue::Boolean(v) => serde_json::json!(v),
    }
}

/// Render results as a JSON document
pub fn render_json(model_year: u32, results: &[FileResult]) -> serde_json::Result<String> {
    let report = JsonReport {
        generated_at: Utc::now(),
        model_year,
        files: results
            .iter()
            .map(|result| JsonFile {
                file: &result.file,
                responses: result
                    .responses
                    .iter()
                    .map(|response| JsonResponse {
                        can_id: format!("{:X}", response.can_id),
                        payload_len: response.payload_len,
                        signals: response
                            .signals
                            .iter()
                            .map(|signal| JsonSignal {
                                name: signal.name.clone(),
                                value: json_value(&signal.value),
                                unit: signal.unit.clone(),
                                raw: signal.raw_value,
                            })
                            .collect(),
                        warnings: response.warnings.iter().map(|w| w.to_string()).collect(),
                    })
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&report)
}

/// Render results as a human-readable text report
pub fn render_text(model_year: u32, results: &[FileResult]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Decoded at {} (model year {})\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        model_year
    ));

    for result in results {
        out.push_str(&format!("\n{}\n", result.file.display()));

        if result.responses.is_empty() {
            out.push_str("  (no decodable responses)\n");
            continue;
        }

        for response in &result.responses {
            out.push_str(&format!(
                "  Response 0x{:X} ({} bytes)\n",
                response.can_id, response.payload_len
            ));

            let name_width = response
                .signals
                .iter()
                .map(|s| s.name.len())
                .max()
                .unwrap_or(0);

            for signal in &response.signals {
                match &signal.unit {
                    Some(unit) => out.push_str(&format!(
                        "    {:width$} = {} {}\n",
                        signal.name,
                        signal.value,
                        unit,
                        width = name_width
                    )),
                    None => out.push_str(&format!(
                        "    {:width$} = {}\n",
                        signal.name,
                        signal.value,
                        width = name_width
                    )),
                }
            }

            for warning in &response.warnings {
                out.push_str(&format!("    ! {}\n", warning));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_decoder::{DecodeWarning, DecodedSignal};

    fn sample_results() -> Vec<FileResult> {
        vec![FileResult {
            file: PathBuf::from("odometer.txt"),
            responses: vec![DecodedResponse {
                can_id: 0x7CE,
                payload_len: 20,
                signals: vec![
                    DecodedSignal {
                        name: "ODO_MI".to_string(),
                        value: SignalValue::Integer(6225),
                        unit: Some("mi".to_string()),
                        raw_value: 6225,
                    },
                    DecodedSignal {
                        name: "SOC".to_string(),
                        value: SignalValue::Float(94.5),
                        unit: None,
                        raw_value: 189,
                    },
                ],
                warnings: vec![DecodeWarning::SignalOutOfBounds {
                    signal: "FAR".to_string(),
                    required_bytes: 30,
                    payload_len: 20,
                }],
            }],
        }]
    }

    #[test]
    fn test_text_report() {
        let text = render_text(2024, &sample_results());
        assert!(text.contains("odometer.txt"));
        assert!(text.contains("Response 0x7CE (20 bytes)"));
        assert!(text.contains("ODO_MI = 6225 mi"));
        assert!(text.contains("SOC    = 94.5"));
        assert!(text.contains("! signal 'FAR' needs 30 bytes but payload has 20"));
    }

    #[test]
    fn test_json_report() {
        let json = render_json(2024, &sample_results()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["model_year"], 2024);
        let response = &value["files"][0]["responses"][0];
        assert_eq!(response["can_id"], "7CE");
        assert_eq!(response["signals"][0]["name"], "ODO_MI");
        assert_eq!(response["signals"][0]["value"], 6225);
        assert_eq!(response["signals"][1]["value"], 94.5);
        assert_eq!(response["warnings"].as_array().unwrap().len(), 1);
    }
}
