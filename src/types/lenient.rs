//! 面向LLM输出的宽松反序列化辅助函数
//!
//! 模型返回的JSON经常把字符串写成数字、把缺省值写成null，
//! 这里统一把这些“形状基本正确”的输入收敛成目标类型。

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::comparison::Level;

/// null -> 空串，数字/布尔 -> 其文本形式
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}

/// 相关性评分，统一到 [0.0, 1.0]
///
/// 0-10 分制的评分会被除以10。
pub fn score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches("/10").trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(normalize_score(raw))
}

pub fn normalize_score(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let scaled = if raw > 1.0 { raw / 10.0 } else { raw };
    scaled.clamp(0.0, 1.0)
}

pub fn level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Level::from_loose(&s),
        _ => Level::default(),
    })
}

/// 竞品支持度映射，值统一转成字符串
pub fn support_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let map = match value {
        Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect(),
        _ => BTreeMap::new(),
    };
    Ok(map)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
