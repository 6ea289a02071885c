//! 从LLM自由文本中提取JSON片段
//!
//! 优先尝试 ``` 代码块，然后按出现顺序尝试每一个起始括号，做字符串感知的括号配平，
//! 第一个能被解析且通过调用方校验的片段胜出。

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Array,
    Object,
}

impl JsonKind {
    fn delimiters(self) -> (u8, u8) {
        match self {
            JsonKind::Array => (b'[', b']'),
            JsonKind::Object => (b'{', b'}'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonKind::Array => value.is_array(),
            JsonKind::Object => value.is_object(),
        }
    }
}

/// 提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedJson {
    pub value: Value,
    /// 片段在原文中的字节区间；若片段位于 ``` 代码块内，则覆盖整个代码块
    pub span: Range<usize>,
}

impl ExtractedJson {
    pub fn parse<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.value.clone()).ok()
    }

    /// 原文去掉该片段后的剩余文本
    pub fn strip_from(&self, text: &str) -> String {
        let mut remaining = String::with_capacity(text.len());
        remaining.push_str(text[..self.span.start].trim_end());
        let tail = text[self.span.end..].trim_start();
        if !remaining.is_empty() && !tail.is_empty() {
            remaining.push_str("\n\n");
        }
        remaining.push_str(tail);
        remaining.trim().to_string()
    }
}

/// 提取第一个可解析的JSON数组
pub fn extract_array(text: &str) -> Option<ExtractedJson> {
    extract_first(text, JsonKind::Array, |_| true)
}

/// 提取第一个可解析的JSON对象
pub fn extract_object(text: &str) -> Option<ExtractedJson> {
    extract_first(text, JsonKind::Object, |_| true)
}

/// 提取第一个类型匹配、可解析且满足 `accept` 的片段
pub fn extract_first<F>(text: &str, kind: JsonKind, accept: F) -> Option<ExtractedJson>
where
    F: Fn(&Value) -> bool,
{
    let (open, close) = kind.delimiters();
    let bytes = text.as_bytes();

    // 先尝试 ``` 代码块内的起始位置，再按原文顺序尝试其余位置
    let fenced = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|body| body.range());
    let mut queued = vec![false; bytes.len()];
    let mut starts: Vec<usize> = Vec::new();
    for i in fenced.chain(0..bytes.len()) {
        if bytes[i] == open && !queued[i] {
            queued[i] = true;
            starts.push(i);
        }
    }

    for start in starts {
        let Some(end) = balanced_end(bytes, start, open, close) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&text[start..end]) else {
            continue;
        };
        if kind.matches(&value) && accept(&value) {
            return Some(ExtractedJson {
                value,
                span: enclosing_fence(text, start..end),
            });
        }
    }
    None
}

/// 返回与 `start` 处括号配平的结束位置（不含）
fn balanced_end(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn enclosing_fence(text: &str, span: Range<usize>) -> Range<usize> {
    FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let block = caps.get(0)?;
            let body = caps.get(1)?;
            (body.start() <= span.start && span.end <= body.end()).then(|| block.range())
        })
        .next()
        .unwrap_or(span)
}
