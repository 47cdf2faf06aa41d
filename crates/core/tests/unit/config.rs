//! Configuration deserialization tests.

use jagrisc_core::config::{Config, CoreMode};

#[test]
fn defaults_are_gpu_with_warnings() {
    let config = Config::default();
    assert_eq!(config.mode, CoreMode::Gpu);
    assert!(config.memory_warnings);
}

#[test]
fn deserializes_from_json() {
    let config: Config =
        serde_json::from_str(r#"{"mode": "dsp", "memory_warnings": false}"#).expect("parse");
    assert_eq!(config.mode, CoreMode::Dsp);
    assert!(!config.memory_warnings);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let config: Config = serde_json::from_str(r#"{"mode": "dsp"}"#).expect("parse");
    assert_eq!(config.mode, CoreMode::Dsp);
    assert!(config.memory_warnings);

    let config: Config = serde_json::from_str("{}").expect("parse");
    assert_eq!(config.mode, CoreMode::Gpu);
}

#[test]
fn mode_addresses_differ_per_personality() {
    assert_ne!(CoreMode::Gpu.flags_addr(), CoreMode::Dsp.flags_addr());
    assert_ne!(CoreMode::Gpu.ctrl_addr(), CoreMode::Dsp.ctrl_addr());
    let (g_start, g_end) = CoreMode::Gpu.ram_window();
    let (d_start, d_end) = CoreMode::Dsp.ram_window();
    assert_eq!(g_end - g_start, 4 * 1024);
    assert_eq!(d_end - d_start, 8 * 1024);
}
