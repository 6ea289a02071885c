use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::lenient;

/// 竞品条目
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    /// 公司或产品名称
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,

    /// 官网地址
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: String,

    /// 一句话描述
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,

    /// 所属市场类别
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,

    /// 市场地位（leader / challenger / emerging）
    #[serde(
        default,
        alias = "market_position",
        deserialize_with = "lenient::string"
    )]
    pub market_position: String,

    /// 相关性评分，范围 0.0 - 1.0
    #[serde(default, alias = "relevance_score", deserialize_with = "lenient::score")]
    pub relevance_score: f64,

    /// 被认定为直接竞品的理由
    #[serde(
        default,
        alias = "relevance_reason",
        deserialize_with = "lenient::string"
    )]
    pub relevance_reason: String,
}

impl Competitor {
    pub fn is_well_shaped(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// 排名结果无法解析时使用的占位竞品
    pub fn fallback_list() -> Vec<Competitor> {
        vec![
            Self::placeholder(
                "Competitor A",
                "competitor-a.com",
                "Leading market player",
                "leader",
                0.8,
            ),
            Self::placeholder(
                "Competitor B",
                "competitor-b.com",
                "Established challenger with a broad feature set",
                "challenger",
                0.6,
            ),
            Self::placeholder(
                "Competitor C",
                "competitor-c.com",
                "Emerging player targeting a niche segment",
                "emerging",
                0.4,
            ),
        ]
    }

    fn placeholder(
        name: &str,
        url: &str,
        description: &str,
        market_position: &str,
        relevance_score: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            description: description.to_string(),
            category: "SaaS".to_string(),
            market_position: market_position.to_string(),
            relevance_score,
            relevance_reason: "Direct competitor".to_string(),
        }
    }
}
