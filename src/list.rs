use serde::Serialize;

use crate::actions::build_item;
use crate::types::{Action, ParsedNode, SourceResult, TreeNode};

const SOURCE_TAGS: [&str; 6] = ["🔵", "🟢", "🟠", "🟣", "🔴", "🟡"];
const UNKNOWN_SOURCE_TAG: &str = "🌕";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Document,
    Checkmark,
    Hashtag,
    Text,
}

impl Icon {
    pub fn for_node(node: &ParsedNode) -> Self {
        match node {
            ParsedNode::Page(_) => Icon::Document,
            ParsedNode::Text(text) if text.is_task => Icon::Checkmark,
            ParsedNode::Header(_) => Icon::Hashtag,
            ParsedNode::Text(_) => Icon::Text,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Document => "📄",
            Icon::Checkmark => "✅",
            Icon::Hashtag => "#",
            Icon::Text => "📝",
        }
    }
}

/// One row of the result list: either a failed source or a rendered match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub key: String,
    pub title: String,
    pub source: String,
    /// Colour marker distinguishing sources; empty when only one is configured.
    pub source_tag: &'static str,
    pub icon: Option<Icon>,
    pub actions: Vec<Action>,
}

impl ListEntry {
    pub fn is_error(&self) -> bool {
        self.icon.is_none()
    }
}

/// Flatten a result set into list rows: one row per failed source first, then
/// every match of every healthy source in source order.
pub fn build_list(results: &[SourceResult]) -> Vec<ListEntry> {
    let sources: Vec<&str> = results.iter().map(|r| r.source.as_str()).collect();

    let errors = results.iter().filter_map(|result| {
        let error = result.error.as_ref()?;
        Some(ListEntry {
            key: result.source.clone(),
            title: error.clone(),
            source: result.source.clone(),
            source_tag: source_tag(&result.source, &sources),
            icon: None,
            actions: Vec::new(),
        })
    });

    let matches = results
        .iter()
        .filter(|result| !result.is_error())
        .flat_map(|result| {
            let tag = source_tag(&result.source, &sources);
            result
                .results
                .iter()
                .enumerate()
                .map(move |(idx, item)| match_entry(item, idx, &result.source, tag))
        });

    errors.chain(matches).collect()
}

fn match_entry(item: &TreeNode, idx: usize, source: &str, source_tag: &'static str) -> ListEntry {
    let rendered = build_item(item, source);
    let branch = if item.indent > 0 { "|" } else { "" };
    ListEntry {
        key: format!("t{source}{idx}"),
        title: format!("{branch}{} {}", "–".repeat(item.indent), rendered.text),
        source: source.to_string(),
        source_tag,
        icon: Some(Icon::for_node(&item.node)),
        actions: rendered.actions,
    }
}

/// Colour marker for `source` given every source in the current result set.
pub fn source_tag(source: &str, sources: &[&str]) -> &'static str {
    if sources.len() == 1 {
        return "";
    }
    match sources.iter().position(|s| *s == source) {
        Some(idx) => SOURCE_TAGS[idx % SOURCE_TAGS.len()],
        None => UNKNOWN_SOURCE_TAG,
    }
}
