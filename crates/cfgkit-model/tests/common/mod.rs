//! Shared config fixtures for integration tests

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use cfgkit_model::{ConfigSchema, DType, Deprecation, FieldSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Optimizer state offload settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OffloadConfig {
    pub device: String,
    pub pin_memory: bool,
    pub buffer_count: u32,
    pub pin: Option<bool>,
}

impl ConfigSchema for OffloadConfig {
    const MODEL: &'static str = "OffloadConfig";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::optional("device", json!("none")),
            FieldSpec::optional("pin_memory", json!(false)),
            FieldSpec::optional("buffer_count", json!(4)),
            FieldSpec::optional("pin", Value::Null)
                .deprecated(Deprecation::new().replaced_by("pin_memory")),
        ]
    }
}

/// Partitioning settings with several generations of renamed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZeroConfig {
    pub stage: u8,
    pub legacy_stage: Option<i64>,
    pub offload_optimizer: Option<OffloadConfig>,
    pub cpu_offload: Option<bool>,
    pub cpu_offload_use_pin_memory: Option<bool>,
    pub overlap_comm: bool,
    pub overlap_comm_legacy: Option<bool>,
    pub legacy_fusion: Option<bool>,
    pub allgather_bucket_size: u64,
    pub train_batch_size: Option<u64>,
    pub dtype: DType,
    pub replace_method: String,
}

fn offload_from_flag(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(true) => Ok(json!({"device": "cpu"})),
        Value::Bool(false) | Value::Null => Ok(Value::Null),
        other => Err(format!("expected a boolean, got {other}")),
    }
}

fn stage_from_legacy(value: &Value) -> Result<Value, String> {
    match value.as_i64() {
        Some(stage @ 0..=3) => Ok(json!(stage)),
        _ => Err(format!("stage must be between 0 and 3, got {value}")),
    }
}

impl ConfigSchema for ZeroConfig {
    const MODEL: &'static str = "ZeroConfig";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::optional("stage", json!(0)),
            FieldSpec::optional("legacy_stage", Value::Null).deprecated(
                Deprecation::new()
                    .replaced_by("stage")
                    .convert_with(stage_from_legacy),
            ),
            FieldSpec::nested::<OffloadConfig>("offload_optimizer").with_default(Value::Null),
            FieldSpec::optional("cpu_offload", Value::Null).deprecated(
                Deprecation::new()
                    .replaced_by("offload_optimizer")
                    .message("Use offload_optimizer.device instead")
                    .convert_with(offload_from_flag),
            ),
            FieldSpec::optional("cpu_offload_use_pin_memory", Value::Null)
                .deprecated(Deprecation::new().replaced_by("offload_optimizer.pin_memory")),
            FieldSpec::optional("overlap_comm", json!(false)),
            FieldSpec::optional("overlap_comm_legacy", Value::Null).deprecated(
                Deprecation::new()
                    .replaced_by("overlap_comm")
                    .set_new_param(false),
            ),
            FieldSpec::optional("legacy_fusion", Value::Null)
                .deprecated(Deprecation::new().message("Fusion is always enabled")),
            FieldSpec::optional("allgather_bucket_size", json!(500_000_000))
                .with_alias("allgather_size"),
            FieldSpec::optional("train_batch_size", Value::Null),
            FieldSpec::optional("dtype", json!("torch.float16")),
            FieldSpec::optional("replace_method", json!("auto")),
        ]
    }
}

/// Optimizer block with one required field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    pub name: String,
    pub warmup: u32,
}

impl ConfigSchema for OptimizerConfig {
    const MODEL: &'static str = "OptimizerConfig";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("name"),
            FieldSpec::optional("warmup", json!(7)),
        ]
    }
}

/// Deprecated field with no default to fall back on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoFallbackConfig {
    pub old: Option<u32>,
    pub new: u32,
}

impl ConfigSchema for NoFallbackConfig {
    const MODEL: &'static str = "NoFallbackConfig";

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("old").deprecated(Deprecation::new().replaced_by("new")),
            FieldSpec::optional("new", json!(0)),
        ]
    }
}

/// Unwrap a `json!` object literal
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Log sink shared between a test and its subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Run `f` with every event at `debug` and above written to this sink
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
