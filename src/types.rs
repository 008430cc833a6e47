use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Inline token kinds produced by the markdown tokenizer running in the vault
/// plugin. Anything not listed lands in `Other` and is passed through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Inline,
    ObsidianLink,
    LinkOpen,
    LinkClose,
    Text,
    CodeInline,
    Image,
    StrongOpen,
    StrongClose,
    EmOpen,
    EmClose,
    SOpen,
    SClose,
    Softbreak,
    Hardbreak,
    #[serde(other)]
    Other,
}

/// One inline markdown unit (markdown-it token shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub children: Option<Vec<Token>>,
    /// `[[name, value], ...]` pairs, e.g. `href` on `link_open`.
    #[serde(default)]
    pub attrs: Option<Vec<(String, String)>>,
    /// Delimiter text, e.g. `**` for `strong_open` or a backtick for `code_inline`.
    #[serde(default)]
    pub markup: String,
}

impl Token {
    pub fn new(kind: TokenKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            children: None,
            attrs: None,
            markup: String::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Text, content)
    }

    /// An `inline` container wrapping `children`.
    pub fn inline(children: Vec<Token>) -> Self {
        Self {
            children: Some(children),
            ..Self::new(TokenKind::Inline, "")
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }

    /// Value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .as_deref()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child sequence when this token is an `inline` container.
    pub fn container_children(&self) -> Option<&[Token]> {
        match self.kind {
            TokenKind::Inline => self.children.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    #[serde(rename = "ch")]
    pub col: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A zero-based range inside one vault document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    pub search_key: String,
    pub location: Location,
    pub page: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderNode {
    pub search_key: String,
    pub location: Location,
    pub page: String,
    pub header: String,
    #[serde(default)]
    pub is_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub search_key: String,
    pub location: Location,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_task: bool,
    #[serde(default)]
    pub is_completed: bool,
}

/// A search hit, discriminated on the wire by `nodeType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "lowercase", from = "WireNode")]
pub enum ParsedNode {
    Page(PageNode),
    Header(HeaderNode),
    Text(TextNode),
}

/// Every `nodeType` older and newer plugin versions emit. Task kinds are
/// folded into `Text` with the task flags set.
#[derive(Deserialize)]
#[serde(tag = "nodeType", rename_all = "kebab-case")]
enum WireNode {
    #[serde(alias = "virtual-page")]
    Page(PageNode),
    Header(HeaderNode),
    Text(TextNode),
    Task(TextNode),
    CompletedTask(TextNode),
}

impl From<WireNode> for ParsedNode {
    fn from(node: WireNode) -> Self {
        match node {
            WireNode::Page(page) => ParsedNode::Page(page),
            WireNode::Header(header) => ParsedNode::Header(header),
            WireNode::Text(text) => ParsedNode::Text(text),
            WireNode::Task(text) => ParsedNode::Text(TextNode { is_task: true, ..text }),
            WireNode::CompletedTask(text) => ParsedNode::Text(TextNode {
                is_task: true,
                is_completed: true,
                ..text
            }),
        }
    }
}

impl ParsedNode {
    pub fn location(&self) -> &Location {
        match self {
            ParsedNode::Page(n) => &n.location,
            ParsedNode::Header(n) => &n.location,
            ParsedNode::Text(n) => &n.location,
        }
    }

    pub fn search_key(&self) -> &str {
        match self {
            ParsedNode::Page(n) => &n.search_key,
            ParsedNode::Header(n) => &n.search_key,
            ParsedNode::Text(n) => &n.search_key,
        }
    }

    pub fn node_type(&self) -> &'static str {
        match self {
            ParsedNode::Page(_) => "page",
            ParsedNode::Header(_) => "header",
            ParsedNode::Text(_) => "text",
        }
    }
}

/// A `ParsedNode` plus the presentation state assigned by the vault plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub node: ParsedNode,
    #[serde(default)]
    pub indent: usize,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub selected: bool,
    /// Render key; unique and order-preserving within one result set.
    pub index: usize,
}

/// One source's outcome for a query. `error` is only set when the fetch failed,
/// in which case `results` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub source: String,
    pub results: Vec<TreeNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    pub fn found(source: impl Into<String>, results: Vec<TreeNode>) -> Self {
        Self {
            source: source.into(),
            results,
            error: None,
        }
    }

    pub fn failed(source: impl Into<String>, advisory: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            results: Vec::new(),
            error: Some(advisory.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A local socket serving one vault's search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    pub socket: PathBuf,
    /// Human-readable vault name derived from the socket path.
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Open,
    Insert,
    Copy,
    Browse,
}

/// A user-triggerable command attached to a rendered row. For `Copy` the
/// target is the clipboard payload, otherwise it is a URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub title: String,
    pub kind: ActionKind,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<&'static str>,
}

impl Action {
    pub fn new(title: impl Into<String>, kind: ActionKind, target: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            target: target.into(),
            shortcut: None,
        }
    }

    pub fn with_shortcut(mut self, shortcut: &'static str) -> Self {
        self.shortcut = Some(shortcut);
        self
    }
}
