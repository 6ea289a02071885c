use serde::{Deserialize, Serialize};

use crate::utils::text::truncate_chars;

/// 搜索服务返回的单条结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// 写入黑板的搜索摘要，正文已截断
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchSnippet {
    pub title: String,
    pub url: String,
    pub content: String,
    pub source: String,
}

impl SearchSnippet {
    /// 每条搜索结果正文保留的最大字符数
    pub const CONTENT_LIMIT: usize = 200;

    pub fn from_hit(hit: SearchHit) -> Self {
        let title = if hit.title.trim().is_empty() {
            "Unknown".to_string()
        } else {
            hit.title
        };
        Self {
            title,
            url: hit.url,
            content: truncate_chars(&hit.content, Self::CONTENT_LIMIT).to_string(),
            source: "web_search".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates_content_to_limit() {
        let hit = SearchHit {
            title: "Asana".to_string(),
            url: "https://asana.com".to_string(),
            content: "é".repeat(500),
            score: Some(0.9),
        };
        let snippet = SearchSnippet::from_hit(hit);

        assert_eq!(snippet.content.chars().count(), SearchSnippet::CONTENT_LIMIT);
        assert_eq!(snippet.source, "web_search");
    }

    #[test]
    fn test_snippet_defaults_missing_title() {
        let hit = SearchHit {
            title: String::new(),
            url: String::new(),
            content: "short".to_string(),
            score: None,
        };
        let snippet = SearchSnippet::from_hit(hit);

        assert_eq!(snippet.title, "Unknown");
        assert_eq!(snippet.content, "short");
    }
}
