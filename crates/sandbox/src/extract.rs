//! Fenced code block extraction from agent replies.

use regex::Regex;

/// One fenced block lifted from a reply, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub source: String,
}

impl CodeBlock {
    pub fn is_python(&self) -> bool {
        matches!(self.language.as_deref(), Some("python") | Some("py"))
    }
}

/// Extract every triple-backtick fenced block from `reply`.
pub fn extract_code_blocks(reply: &str) -> Vec<CodeBlock> {
    let fence_pattern = Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\n(.*?)```")
        .expect("Invalid code fence regex pattern");

    fence_pattern
        .captures_iter(reply)
        .map(|caps| {
            let language = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|lang| !lang.is_empty())
                .map(|lang| lang.to_lowercase());
            CodeBlock {
                language,
                source: caps[2].to_string(),
            }
        })
        .collect()
}
