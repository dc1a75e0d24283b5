//! Decode a captured diagnostic exchange with an inline signal set
//!
//! Run with: cargo run --example decode_response

use obd_decoder::{Decoder, DecoderConfig};

const CATALOG: &str = r#"
{
    "model_years": [2024, 2026],
    "commands": [
        {
            "hdr": "7C6",
            "rax": "7CE",
            "cmd": { "22": "B002" },
            "signals": [
                { "id": "ODO_KM", "name": "Odometer (km)", "fmt": { "byte": 9, "len": 32, "unit": "km" } },
                { "id": "ODO_MI", "name": "Odometer (mi)", "fmt": { "byte": 13, "len": 16, "unit": "mi" } }
            ]
        }
    ]
}
"#;

const TRANSCRIPT: &str = "\
7CE101462B002D00000
7CE2100FFB600000000
7CE2218510000000000";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut decoder = Decoder::new();
    decoder.add_signalset_str(CATALOG, "example.json")?;

    let responses = decoder.decode_exchange(2024, TRANSCRIPT, DecoderConfig::new())?;

    for response in responses {
        println!(
            "Response on 0x{:X} ({} bytes):",
            response.can_id, response.payload_len
        );
        for signal in &response.signals {
            match &signal.unit {
                Some(unit) => println!("  {} = {} {}", signal.name, signal.value, unit),
                None => println!("  {} = {}", signal.name, signal.value),
            }
        }
    }

    Ok(())
}
