use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::lenient;

/// 复杂度 / 战略价值等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    /// 宽松解析，"Medium-High" 之类的组合按更高的一档处理
    pub fn from_loose(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("high") {
            Level::High
        } else if lowered.contains("low") {
            Level::Low
        } else {
            Level::Medium
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "Low"),
            Level::Medium => write!(f, "Medium"),
            Level::High => write!(f, "High"),
        }
    }
}

/// 特性对比矩阵中的一行
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureEntry {
    /// 特性名称
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,

    /// 我方在该特性上的机会
    #[serde(
        default,
        alias = "your_opportunity",
        alias = "opportunity",
        deserialize_with = "lenient::string"
    )]
    pub your_opportunity: String,

    /// 实现复杂度
    #[serde(
        default,
        alias = "implementation_complexity",
        alias = "complexity",
        deserialize_with = "lenient::level"
    )]
    pub implementation_complexity: Level,

    /// 战略价值
    #[serde(default, alias = "strategic_value", deserialize_with = "lenient::level")]
    pub strategic_value: Level,

    /// 各竞品对该特性的支持情况（Yes / No / Partial / Premium）
    #[serde(default, deserialize_with = "lenient::support_map")]
    pub competitors: BTreeMap<String, String>,
}

impl FeatureEntry {
    pub fn is_well_shaped(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// 特性对比结构
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, JsonSchema)]
pub struct FeatureComparison {
    #[serde(default)]
    pub features: Vec<FeatureEntry>,
}

impl FeatureComparison {
    pub const MAX_FEATURES: usize = 12;

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 对比矩阵无法解析时使用的通用特性集合
    pub fn fallback() -> Self {
        let feature = |name: &str, opportunity: &str, complexity, value| FeatureEntry {
            name: name.to_string(),
            your_opportunity: opportunity.to_string(),
            implementation_complexity: complexity,
            strategic_value: value,
            competitors: BTreeMap::new(),
        };

        Self {
            features: vec![
                feature(
                    "AI Features",
                    "Build AI-assisted workflows as a differentiator",
                    Level::Medium,
                    Level::High,
                ),
                feature(
                    "Integrations",
                    "Offer native integrations with the tools customers already use",
                    Level::Medium,
                    Level::Medium,
                ),
                feature(
                    "Transparent Pricing",
                    "Simplify pricing compared to tiered competitor plans",
                    Level::Low,
                    Level::Medium,
                ),
            ],
        }
    }
}
