//! Vehicle fixture tests
//!
//! Decodes captured diagnostic exchanges from a real vehicle (Kia EV9)
//! against its signal set catalog and checks every decoded value against
//! the known-good readings.

use obd_decoder::{Decoder, DecoderConfig, DecoderError, SignalValue};
use std::path::Path;

const KIA_EV9: &str = include_str!("data/kia-ev9.json");

fn ev9_decoder() -> Decoder {
    let mut decoder = Decoder::new();
    decoder.add_signalset_str(KIA_EV9, "kia-ev9.json").unwrap();
    decoder
}

/// Decode one exchange and check the full expected value map: every listed
/// signal must decode to exactly the given value, and nothing else may
/// appear in the response.
fn assert_exchange(decoder: &Decoder, transcript: &str, expected: &[(&str, f64)]) {
    let responses = decoder
        .decode_exchange(2024, transcript, DecoderConfig::new())
        .unwrap();
    assert_eq!(responses.len(), 1, "expected exactly one decoded response");

    let response = &responses[0];
    assert!(response.warnings.is_empty(), "unexpected warnings: {:?}", response.warnings);
    assert_eq!(
        response.signals.len(),
        expected.len(),
        "decoded signals: {:?}",
        response.signals.iter().map(|s| &s.name).collect::<Vec<_>>()
    );

    for (name, value) in expected {
        let signal = response
            .signal(name)
            .unwrap_or_else(|| panic!("signal '{}' missing from response", name));
        assert_eq!(
            signal.value.as_f64(),
            *value,
            "signal '{}' decoded as {:?}",
            name,
            signal.value
        );
    }
}

#[test]
fn tire_pressure_all_sensors_cold() {
    // All four corners reporting zero pressure and the -50 temperature floor
    assert_exchange(
        &ev9_decoder(),
        "7A8102462C00BFFFFFF
         7A821F8000000000200
         7A82200000002000000
         7A82300020000000002
         7A8243BFFFFFFFFFFFF
         7A825FFFFAAAAAAAAAA",
        &[
            ("EV9_TP_FL", 0.0),
            ("EV9_TT_FL", -50.0),
            ("EV9_TP_FR", 0.0),
            ("EV9_TT_FR", -50.0),
            ("EV9_TP_RL", 0.0),
            ("EV9_TT_RL", -50.0),
            ("EV9_TP_RR", 0.0),
            ("EV9_TT_RR", -50.0),
        ],
    );
}

#[test]
fn tire_pressure_normal_readings() {
    assert_exchange(
        &ev9_decoder(),
        "7A8102462C00BFFFFFF
         7A821F8BE3C000400BD
         7A8223C000400C13C00
         7A8230400C13E000400
         7A8243BA4B7A4B7A4B7
         7A825A6B7AAAAAAAAAA",
        &[
            ("EV9_TP_FL", 38.0),
            ("EV9_TT_FL", 10.0),
            ("EV9_TP_FR", 37.8),
            ("EV9_TT_FR", 10.0),
            ("EV9_TP_RL", 38.6),
            ("EV9_TT_RL", 10.0),
            ("EV9_TP_RR", 38.6),
            ("EV9_TT_RR", 12.0),
        ],
    );
}

#[test]
fn tire_pressure_warm_readings() {
    assert_exchange(
        &ev9_decoder(),
        "7A8102462C00BFFFFFF
         7A821F8D44F000600D2
         7A8224F000600D65100
         7A8230600D250000600
         7A8243E93B893B893B8
         7A82593B8AAAAAAAAAA",
        &[
            ("EV9_TP_FL", 42.4),
            ("EV9_TT_FL", 29.0),
            ("EV9_TP_FR", 42.0),
            ("EV9_TT_FR", 29.0),
            ("EV9_TP_RL", 42.8),
            ("EV9_TT_RL", 31.0),
            ("EV9_TP_RR", 42.0),
            ("EV9_TT_RR", 30.0),
        ],
    );
}

#[test]
fn odometer_zero_miles() {
    // Unused/zero fields decode to exact zero, not a sentinel
    assert_exchange(
        &ev9_decoder(),
        "7CE101462B002400000
         7CE210000B400000000
         7CE2200000000000000",
        &[("EV9_ODO_KM", 0.0), ("EV9_ODO_MI", 0.0)],
    );
}

#[test]
fn odometer_six_thousand_miles() {
    assert_exchange(
        &ev9_decoder(),
        "7CE101462B002D00000
         7CE2100FF9A00000000
         7CE22184A0000000000",
        &[("EV9_ODO_KM", 0.0), ("EV9_ODO_MI", 6218.0)],
    );

    assert_exchange(
        &ev9_decoder(),
        "7CE101462B002D00000
         7CE2100FFB600000000
         7CE2218510000000000",
        &[("EV9_ODO_KM", 0.0), ("EV9_ODO_MI", 6225.0)],
    );
}

const BATTERY_RESTING: &str = "7EC103E620101EFFBE7
                               7EC21EF380000000000
                               7EC220000152D100E0F
                               7EC230D0E0F0D003BB2
                               7EC2470B27C00007D00
                               7EC250106540000FE99
                               7EC260000983700008E
                               7EC27C4005820590019
                               7EC2899000000000BB8";

#[test]
fn battery_state_resting() {
    // Nine-frame payload with mixed bit widths and one-decimal scaling
    assert_exchange(
        &ev9_decoder(),
        BATTERY_RESTING,
        &[
            ("EV9_HVBAT_SOC", 28.0),
            ("EV9_HVBAT_CHARGING", 0.0),
            ("EV9_HVBAT_PLUG_RAPD", 0.0),
            ("EV9_HVBAT_PLUG_NORM", 0.0),
            ("EV9_HVBAT_CURR", 0.0),
            ("EV9_HVBAT_VDC", 542.1),
            ("EV9_HVBAT_T_MAX", 16.0),
            ("EV9_HVBAT_T_MIN", 14.0),
            ("EV9_HVBAT_MOD1_T", 15.0),
            ("EV9_HVBAT_MOD2_T", 13.0),
            ("EV9_HVBAT_MOD3_T", 14.0),
            ("EV9_HVBAT_MOD4_T", 15.0),
            ("EV9_HVBAT_INLET_T", 59.0),
            ("EV9_C_V_MAX", 3.56),
            ("EV9_C_V_MAX_ID", 112.0),
            ("EV9_C_V_MIN", 3.56),
            ("EV9_C_V_MIN_ID", 124.0),
            ("EV9_HVBAT_FAN_STATUS", 0.0),
            ("EV9_HVBAT_FAN", 0.0),
            ("EV9_VPWR", 12.5),
            ("EV9_HVBAT_CHRG_TOT_C", 6715.6),
            ("EV9_HVBAT_DSCH_TOT_C", 6517.7),
            ("EV9_HVBAT_CHRG_TOT_E", 3896.7),
            ("EV9_HVBAT_DSCH_TOT_E", 3654.8),
        ],
    );
}

#[test]
fn battery_state_nearly_full() {
    assert_exchange(
        &ev9_decoder(),
        "7EC103E620101EFFBE7
         7EC21EFBD0000000000
         7EC2200CE18430D0A0A
         7EC230C0B0A0D0031CC
         7EC2427CC4E00008000
         7EC25010A8B0000FE9E
         7EC2600009AB800008E
         7EC27C70058A3860002
         7EC286C109600000BB8",
        &[
            ("EV9_HVBAT_SOC", 94.5),
            ("EV9_HVBAT_CHARGING", 0.0),
            ("EV9_HVBAT_PLUG_RAPD", 0.0),
            ("EV9_HVBAT_PLUG_NORM", 0.0),
            ("EV9_HVBAT_CURR", 20.6),
            ("EV9_HVBAT_VDC", 621.1),
            ("EV9_HVBAT_T_MAX", 13.0),
            ("EV9_HVBAT_T_MIN", 10.0),
            ("EV9_HVBAT_MOD1_T", 10.0),
            ("EV9_HVBAT_MOD2_T", 12.0),
            ("EV9_HVBAT_MOD3_T", 11.0),
            ("EV9_HVBAT_MOD4_T", 10.0),
            ("EV9_HVBAT_INLET_T", 49.0),
            ("EV9_C_V_MAX", 4.08),
            ("EV9_C_V_MAX_ID", 39.0),
            ("EV9_C_V_MIN", 4.08),
            ("EV9_C_V_MIN_ID", 78.0),
            ("EV9_HVBAT_FAN_STATUS", 0.0),
            ("EV9_HVBAT_FAN", 0.0),
            ("EV9_VPWR", 12.8),
            ("EV9_HVBAT_CHRG_TOT_C", 6823.5),
            ("EV9_HVBAT_DSCH_TOT_C", 6518.2),
            ("EV9_HVBAT_CHRG_TOT_E", 3960.8),
            ("EV9_HVBAT_DSCH_TOT_E", 3655.1),
        ],
    );
}

#[test]
fn catalog_loads_from_file() {
    let mut decoder = Decoder::new();
    decoder
        .add_signalset(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/kia-ev9.json"))
        .unwrap();

    let stats = decoder.database_stats();
    assert_eq!(stats.num_sets, 1);
    assert_eq!(stats.num_requests, 3);
    assert_eq!(stats.num_signals, 34);
}

#[test]
fn shuffled_consecutive_frames_are_a_protocol_error() {
    let decoder = ev9_decoder();
    // Same odometer exchange with the two consecutive frames swapped
    let result = decoder.decode_exchange(
        2024,
        "7CE101462B002D00000
         7CE2218510000000000
         7CE2100FFB600000000",
        DecoderConfig::new(),
    );
    assert!(matches!(
        result,
        Err(DecoderError::ReassemblyProtocol { can_id: 0x7CE, .. })
    ));
}

#[test]
fn decoding_the_same_exchange_twice_is_identical() {
    let decoder = ev9_decoder();
    let first = decoder
        .decode_exchange(2024, BATTERY_RESTING, DecoderConfig::new())
        .unwrap();
    let second = decoder
        .decode_exchange(2024, BATTERY_RESTING, DecoderConfig::new())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_model_year_is_a_configuration_error() {
    let decoder = ev9_decoder();
    let result = decoder.decode_exchange(2019, BATTERY_RESTING, DecoderConfig::new());
    assert!(matches!(result, Err(DecoderError::UnresolvedSignalSet(2019))));
}

#[test]
fn sentinel_raw_pattern_omits_the_signal() {
    let catalog = r#"
    {
        "model_years": [2024, 2024],
        "commands": [{
            "hdr": "7A0",
            "rax": "7A8",
            "cmd": { "22": "C00B" },
            "signals": [
                { "id": "PRESSURE", "fmt": { "byte": 3, "len": 8, "div": 5, "nullval": 255 } },
                { "id": "STATUS", "fmt": { "byte": 4, "len": 8 } }
            ]
        }]
    }
    "#;
    let mut decoder = Decoder::new();
    decoder.add_signalset_str(catalog, "sentinel.json").unwrap();

    // Payload 62 C0 0B FF 01: PRESSURE is the all-ones sentinel
    let responses = decoder
        .decode_exchange(2024, "7A80562C00BFF01", DecoderConfig::new())
        .unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].signal("PRESSURE").is_none());
    assert_eq!(
        responses[0].signal("STATUS").unwrap().value,
        SignalValue::Integer(1)
    );
    assert!(responses[0].warnings.is_empty());
}
