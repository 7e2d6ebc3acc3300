//! スタックファイルのロードと静的検証
//!
//! 問題は最初の一件で止めずにすべて集め、まとめて `Validation` として返す。

use crate::error::{Result, StackFileError};
use crate::model::{DEFAULT_SERVICE_TYPE, ServiceSpec, StackSpec};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

static SERVICE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("service name pattern is valid"));

/// YAML上のサービス定義（未検証）
#[derive(Debug, Default, Deserialize)]
struct RawService {
    #[serde(rename = "type")]
    service_type: Option<String>,
    image: Option<Value>,
    port: Option<Value>,
    env: Option<Value>,
    file: Option<String>,
}

/// スタックファイルを読み込んで検証する
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_stack(path: &Path) -> Result<StackSpec> {
    let content = std::fs::read_to_string(path).map_err(|e| StackFileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let stack = parse_stack(&content, base_dir)?;
    info!(services = stack.len(), "Stack file loaded");
    Ok(stack)
}

/// YAML文字列からスタックを生成する
///
/// `base_dir` は mock の `file` など相対パスの解決に使う。
pub fn parse_stack(content: &str, base_dir: &Path) -> Result<StackSpec> {
    let root: Value = serde_yaml::from_str(content)?;
    let services = match root.get("services") {
        Some(Value::Mapping(services)) => services,
        _ => return Err(StackFileError::MissingServices),
    };

    if services.is_empty() {
        warn!("No services defined in stack file");
    }

    let mut errors = Vec::new();
    let mut stack = StackSpec::new();

    for (key, value) in services {
        let Some(name) = key.as_str() else {
            errors.push(format!(
                "Service key {} must be a string.",
                describe(key)
            ));
            continue;
        };

        let raw: RawService = match value {
            Value::Null => RawService::default(),
            other => match serde_yaml::from_value(other.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    errors.push(format!("Service '{}' is malformed: {}", name, e));
                    continue;
                }
            },
        };

        if let Some(spec) = validate_service(name, raw, base_dir, &mut errors) {
            stack.insert(spec);
        }
    }

    check_port_conflicts(&stack, &mut errors);

    if errors.is_empty() {
        Ok(stack)
    } else {
        Err(StackFileError::Validation { errors })
    }
}

fn validate_service(
    name: &str,
    raw: RawService,
    base_dir: &Path,
    errors: &mut Vec<String>,
) -> Option<ServiceSpec> {
    let before = errors.len();

    if !SERVICE_NAME_PATTERN.is_match(name) {
        errors.push(format!(
            "Service '{}' has invalid name. Use only alphanumeric, underscore, and dash characters.",
            name
        ));
    }

    let service_type = raw
        .service_type
        .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string());
    let mut spec = ServiceSpec::new(name, service_type.clone());

    spec.port = raw.port.as_ref().and_then(|v| parse_port(name, v, errors));
    spec.env = raw
        .env
        .as_ref()
        .map(|v| parse_env(name, v, errors))
        .unwrap_or_default();

    match raw.image {
        Some(Value::String(image)) => spec.image = Some(image),
        Some(_) => errors.push(format!("Service '{}' field 'image' must be a string.", name)),
        None if service_type == DEFAULT_SERVICE_TYPE => {
            errors.push(format!("Service '{}' missing required field 'image'.", name))
        }
        None => {}
    }

    match raw.file {
        Some(file) => {
            let resolved = base_dir.join(&file);
            if service_type == "mock" && !resolved.is_file() {
                errors.push(format!("Service '{}' mock file not found: {}", name, file));
            }
            spec.file = Some(resolved);
        }
        None if service_type == "mock" => errors.push(format!(
            "Service '{}' (type=mock) missing required field 'file'.",
            name
        )),
        None => {}
    }

    (errors.len() == before).then_some(spec)
}

fn parse_port(name: &str, value: &Value, errors: &mut Vec<String>) -> Option<u16> {
    let number = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match number {
        Some(port @ 1..=65535) => Some(port as u16),
        _ => {
            errors.push(format!(
                "Service '{}' has invalid port '{}'. Must be between 1-65535.",
                name,
                describe(value)
            ));
            None
        }
    }
}

fn parse_env(name: &str, value: &Value, errors: &mut Vec<String>) -> BTreeMap<String, String> {
    let Value::Mapping(mapping) = value else {
        errors.push(format!("Service '{}' field 'env' must be an object.", name));
        return BTreeMap::new();
    };

    let mut env = BTreeMap::new();
    for (key, val) in mapping {
        match (scalar_to_string(key), scalar_to_string(val)) {
            (Some(k), Some(v)) => {
                env.insert(k, v);
            }
            _ => errors.push(format!(
                "Service '{}' env entry {} must be a scalar KEY: VALUE pair.",
                name,
                describe(key)
            )),
        }
    }
    env
}

/// ポートの重複を検出する（一件の重複につき一つのエラー）
fn check_port_conflicts(stack: &StackSpec, errors: &mut Vec<String>) {
    let mut used = HashSet::new();
    for port in stack.services().filter_map(|s| s.port) {
        if !used.insert(port) {
            errors.push(format!("Port {} is used by multiple services.", port));
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    scalar_to_string(value).unwrap_or_else(|| format!("{:?}", value))
}
