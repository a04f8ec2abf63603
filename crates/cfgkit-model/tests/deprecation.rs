//! Deprecated-field forwarding
//!
//! Run with: cargo test --package cfgkit-model --test deprecation

mod common;

use cfgkit_model::{ConfigError, ConfigModel, DeprecationWarning, ValidationError};
use common::{object, CapturedLogs, NoFallbackConfig, OffloadConfig, ZeroConfig};
use pretty_assertions::assert_eq;
use serde_json::json;

fn zero(value: serde_json::Value) -> Result<ConfigModel<ZeroConfig>, ConfigError> {
    ConfigModel::construct(object(value), false)
}

#[test]
fn deprecated_value_moves_to_replacement() {
    let model = zero(json!({"legacy_stage": 2})).unwrap();

    assert_eq!(model.stage, 2);
    assert_eq!(model.legacy_stage, None);
    assert!(model.is_set("stage"));
    assert!(!model.is_set("legacy_stage"));
    assert_eq!(
        model.warnings(),
        &[DeprecationWarning {
            field: "legacy_stage".into(),
            replacement: Some("stage".into()),
            message: None,
        }]
    );
}

#[test]
fn conversion_builds_sub_config() {
    let model = zero(json!({"cpu_offload": true})).unwrap();

    let offload = model.offload_optimizer.clone().unwrap();
    assert_eq!(
        offload,
        OffloadConfig {
            device: "cpu".into(),
            pin_memory: false,
            buffer_count: 4,
            pin: None,
        }
    );
    assert_eq!(model.cpu_offload, None);
    assert!(model.is_set("offload_optimizer"));
    assert!(model.is_set("offload_optimizer.device"));
    assert!(!model.is_set("offload_optimizer.buffer_count"));
    assert!(!model.is_set("cpu_offload"));
}

#[test]
fn conversion_to_null_keeps_default() {
    let model = zero(json!({"cpu_offload": false})).unwrap();
    assert_eq!(model.offload_optimizer, None);
    assert_eq!(model.warnings().len(), 1);
}

#[test]
fn forwarding_into_nested_field() {
    let model = zero(json!({"cpu_offload": true, "cpu_offload_use_pin_memory": true})).unwrap();

    let offload = model.offload_optimizer.clone().unwrap();
    assert_eq!(offload.device, "cpu");
    assert!(offload.pin_memory);
    assert!(model.is_set("offload_optimizer.pin_memory"));
    assert_eq!(model.cpu_offload_use_pin_memory, None);
    assert_eq!(model.warnings().len(), 2);
}

#[test]
fn deprecated_field_inside_sub_config() {
    let model = zero(json!({"offload_optimizer": {"device": "nvme", "pin": true}})).unwrap();

    let offload = model.offload_optimizer.clone().unwrap();
    assert!(offload.pin_memory);
    assert_eq!(offload.pin, None);
    assert!(model.is_set("offload_optimizer.pin_memory"));
    assert!(!model.is_set("offload_optimizer.pin"));
    assert_eq!(model.warnings()[0].field, "offload_optimizer.pin");
}

#[test]
fn both_names_supplied_is_a_conflict() {
    let err = zero(json!({"legacy_stage": 2, "stage": 1})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot provide deprecated parameter 'legacy_stage' and replacing parameter 'stage' together"
    );

    let err = zero(json!({"cpu_offload": true, "offload_optimizer": {"device": "nvme"}})).unwrap_err();
    assert!(matches!(err, ConfigError::Conflict { .. }));
}

#[test]
fn conflict_inside_sub_config() {
    let err = zero(json!({"offload_optimizer": {"pin": true, "pin_memory": false}})).unwrap_err();
    match err {
        ConfigError::Conflict {
            deprecated,
            replacement,
        } => {
            assert_eq!(deprecated, "offload_optimizer.pin");
            assert_eq!(replacement, "pin_memory");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn defaulted_replacement_is_not_a_conflict() {
    // Replacement present in the input only as "auto", so it was never set
    let model = zero(json!({"legacy_stage": 3, "stage": "auto"})).unwrap();
    assert_eq!(model.stage, 3);
}

#[test]
fn warning_only_when_forwarding_disabled() {
    let model = zero(json!({"overlap_comm_legacy": true})).unwrap();

    assert!(!model.overlap_comm);
    assert_eq!(model.overlap_comm_legacy, Some(true));
    assert!(model.is_set("overlap_comm_legacy"));
    assert_eq!(
        model.warnings()[0].to_string(),
        "Config parameter overlap_comm_legacy is deprecated use overlap_comm instead"
    );
}

#[test]
fn warning_without_replacement() {
    let model = zero(json!({"legacy_fusion": true})).unwrap();

    assert_eq!(model.legacy_fusion, Some(true));
    assert_eq!(
        model.warnings()[0].to_string(),
        "Config parameter legacy_fusion is deprecated. Fusion is always enabled"
    );
}

#[test]
fn untouched_deprecated_fields_do_not_warn() {
    let model = zero(json!({"stage": 1})).unwrap();
    assert!(model.warnings().is_empty());
}

#[test]
fn conversion_failure_is_reported() {
    let logs = CapturedLogs::default();
    let err = logs.capture(|| zero(json!({"legacy_stage": 9}))).unwrap_err();

    match err {
        ConfigError::Forward {
            field,
            replacement,
            message,
        } => {
            assert_eq!(field, "legacy_stage");
            assert_eq!(replacement, "stage");
            assert_eq!(message, "stage must be between 0 and 3, got 9");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(logs.contents().contains("ERROR"));
}

#[test]
fn assignment_failure_is_logged_then_raised() {
    let logs = CapturedLogs::default();
    let err = logs
        .capture(|| zero(json!({"cpu_offload_use_pin_memory": true})))
        .unwrap_err();

    match err {
        ConfigError::Assignment {
            field,
            replacement,
            source,
        } => {
            assert_eq!(field, "cpu_offload_use_pin_memory");
            assert_eq!(replacement, "offload_optimizer.pin_memory");
            assert!(matches!(source, ValidationError::ExpectedObject { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(logs.contents().contains(
        "Tried setting value for 'offload_optimizer.pin_memory' with value from deprecated 'cpu_offload_use_pin_memory'"
    ));
}

#[test]
fn removal_failure_is_logged_then_raised() {
    let logs = CapturedLogs::default();
    let err = logs
        .capture(|| ConfigModel::<NoFallbackConfig>::construct(object(json!({"old": 3})), false))
        .unwrap_err();

    match err {
        ConfigError::Removal { field, source } => {
            assert_eq!(field, "old");
            assert!(matches!(source, ValidationError::MissingField { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(logs
        .contents()
        .contains("Tried removing deprecated 'old' from config"));
}

#[test]
fn deprecation_warning_is_logged() {
    let logs = CapturedLogs::default();
    logs.capture(|| zero(json!({"cpu_offload": true}))).unwrap();

    let contents = logs.contents();
    assert!(contents.contains("WARN"));
    assert!(contents.contains(
        "Config parameter cpu_offload is deprecated use offload_optimizer instead. Use offload_optimizer.device instead"
    ));
}

#[test]
fn assigned_sub_config_is_migrated() {
    let mut model = zero(json!({})).unwrap();
    model.set("offload_optimizer", json!({"pin": true})).unwrap();

    let offload = model.offload_optimizer.clone().unwrap();
    assert!(offload.pin_memory);
    assert_eq!(offload.pin, None);
    assert!(model.is_set("offload_optimizer.pin_memory"));
    assert!(!model.is_set("offload_optimizer.pin"));
    assert_eq!(model.warnings().len(), 1);
    assert_eq!(model.warnings()[0].field, "offload_optimizer.pin");
}

#[test]
fn assigned_sub_config_conflict_keeps_state() {
    let mut model = zero(json!({})).unwrap();
    let before = model.data().clone();

    let err = model
        .set("offload_optimizer", json!({"pin": true, "pin_memory": false}))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Conflict { .. }));
    assert_eq!(model.data(), &before);
    assert!(model.warnings().is_empty());
}
