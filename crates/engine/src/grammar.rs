//! Decoders for the two oracle response grammars
//!
//! Both decoders are total: malformed input degrades to "not relevant" or
//! "no edits", never to an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").expect("valid regex"));

static RELEVANT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[\s*_#>-]*RELEVANT[\s*_]*:[\s*_]*(YES|NO)\b").expect("valid regex"));

static SCORE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[\s*_#>-]*SCORE[\s*_]*:[\s*_]*(\d{1,3})\b").expect("valid regex"));

static REASON_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[\s*_#>-]*REASON[\s*_]*:[\s*_]*(.*)$").expect("valid regex"));

static TARGETS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[\s*_#>-]*TARGETS[\s*_]*:(.*)$").expect("valid regex"));

static NODE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnode_\d+\b").expect("valid regex"));

/// Decoded `relevance/v1` answer, before target ids are checked against the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceAnswer {
    pub is_relevant: bool,
    pub score: u8,
    pub reasoning: String,
    pub targets: Vec<String>,
}

/// Decode a `relevance/v1` response
///
/// A missing or malformed `RELEVANT` or `SCORE` line yields `is_relevant = false, score = 0`.
pub fn decode_relevance(raw: &str) -> RelevanceAnswer {
    let body = FENCED_BLOCK
        .captures_iter(raw)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .find(|block| RELEVANT_LINE.is_match(block))
        .unwrap_or(raw);

    let reasoning = REASON_LINE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(['*', '_']).trim().to_string())
        .unwrap_or_default();

    let targets = TARGETS_LINE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            let mut ids: Vec<String> = Vec::new();
            for id in NODE_ID.find_iter(m.as_str()) {
                if !ids.iter().any(|seen| seen == id.as_str()) {
                    ids.push(id.as_str().to_string());
                }
            }
            ids
        })
        .unwrap_or_default();

    let relevant = RELEVANT_LINE
        .captures(body)
        .map(|caps| caps[1].eq_ignore_ascii_case("YES"));
    let score = SCORE_LINE
        .captures(body)
        .and_then(|caps| caps[1].parse::<u16>().ok())
        .filter(|score| *score <= 100);

    match (relevant, score) {
        (Some(is_relevant), Some(score)) => RelevanceAnswer {
            is_relevant,
            score: score as u8,
            reasoning,
            targets,
        },
        _ => {
            log::debug!("Relevance response missing RELEVANT or SCORE; treating as not relevant");
            RelevanceAnswer {
                is_relevant: false,
                score: 0,
                reasoning,
                targets,
            }
        }
    }
}

/// One replacement value from a `patch/v1` edit map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeEditValue {
    PlainText(String),
    Annotated {
        code: String,
        required_imports: Vec<String>,
    },
}

impl NodeEditValue {
    /// Decode a single map value; unknown shapes are declined with `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(code) => Some(Self::PlainText(code.clone())),
            Value::Object(fields) => {
                let code = fields
                    .get("modifiedCode")
                    .or_else(|| fields.get("modified_code"))
                    .and_then(Value::as_str)?;
                let required_imports = match fields
                    .get("requiredImports")
                    .or_else(|| fields.get("required_imports"))
                {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Some(Value::String(single)) => vec![single.clone()],
                    _ => Vec::new(),
                };
                Some(Self::Annotated {
                    code: code.to_string(),
                    required_imports,
                })
            }
            _ => None,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::PlainText(code) => code,
            Self::Annotated { code, .. } => code,
        }
    }

    pub fn required_imports(&self) -> &[String] {
        match self {
            Self::PlainText(_) => &[],
            Self::Annotated { required_imports, .. } => required_imports,
        }
    }
}

/// Decode a `patch/v1` response into `(node id, value)` pairs
///
/// Empty or unparsable responses yield no pairs.
pub fn decode_edit_map(raw: &str) -> Vec<(String, NodeEditValue)> {
    let Some(map) = extract_json_object(raw) else {
        if !raw.trim().is_empty() {
            log::debug!("Patch response contained no JSON object");
        }
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(id, value)| match NodeEditValue::from_json(&value) {
            Some(edit) => Some((id, edit)),
            None => {
                log::debug!("Declining edit for {id}: unsupported value shape");
                None
            }
        })
        .collect()
}

/// First JSON object in a response: fenced blocks first, then the raw text
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .find_map(|block| first_object_in(block.as_str()))
        .or_else(|| first_object_in(raw))
}

fn first_object_in(text: &str) -> Option<Map<String, Value>> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(start, _)| {
            let end = balanced_end(&text[start..])?;
            serde_json::from_str::<Map<String, Value>>(&text[start..start + end]).ok()
        })
}

/// Byte length of the balanced `{...}` prefix, honouring JSON strings
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
