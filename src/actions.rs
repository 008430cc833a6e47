use anyhow::Result;
use arboard::Clipboard;
use serde::Serialize;
use urlencoding::encode;

use crate::render::render_node;
use crate::types::{Action, ActionKind, Location, ParsedNode, Token, TokenKind, TreeNode};

/// URL scheme handled by the note-taking app.
pub const URI_SCHEME: &str = "obsidian";

/// Display string plus the full, ordered action list for one search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedItem {
    pub text: String,
    pub actions: Vec<Action>,
}

/// Render a hit and assemble its actions: markup-derived ones first, in
/// document order, then open, insert-after and copy-as-markdown.
pub fn build_item(item: &TreeNode, source: &str) -> RenderedItem {
    let mut actions = Vec::new();
    let text = render_node(&item.node, &mut actions, source);
    let location = item.node.location();

    actions.push(
        Action::new("See in Obsidian", ActionKind::Open, location_uri("open", location, source))
            .with_shortcut("shift+enter"),
    );
    actions.push(
        Action::new("Insert After", ActionKind::Insert, location_uri("insert", location, source))
            .with_shortcut("ctrl+i"),
    );
    actions.push(
        Action::new("Copy to clipboard", ActionKind::Copy, to_markdown(&item.node))
            .with_shortcut("ctrl+c"),
    );

    RenderedItem { text, actions }
}

/// URI opening the document `file` in `vault`.
pub fn open_file_uri(vault: &str, file: &str) -> String {
    format!("{URI_SCHEME}://open?vault={}&file={}", encode(vault), encode(file))
}

/// URI for the vault plugin's location handler. `action` is `open` or `insert`.
pub fn location_uri(action: &str, location: &Location, vault: &str) -> String {
    let start = location.position.start;
    let end = location.position.end;
    format!(
        "{URI_SCHEME}://tree-search-uri?raycastaction={}&vault={}&filepath={}&sl={}&sc={}&el={}&ec={}",
        encode(action),
        encode(vault),
        encode(&location.path),
        start.line,
        start.col,
        end.line,
        end.col,
    )
}

/// Reconstruct the markdown a hit was parsed from.
pub fn to_markdown(node: &ParsedNode) -> String {
    match node {
        ParsedNode::Page(page) => format!("[[{}]]", page.page),
        ParsedNode::Header(header) => format!("[[{}#{}]]", header.page, header.header),
        ParsedNode::Text(text) => {
            let mut out = String::new();
            if text.is_task {
                out.push_str(if text.is_completed { "- [x] " } else { "- [ ] " });
            }
            let mut hrefs = Vec::new();
            markdown_into(&text.tokens, &mut hrefs, &mut out);
            out
        }
    }
}

fn markdown_into<'a>(tokens: &'a [Token], hrefs: &mut Vec<&'a str>, out: &mut String) {
    for token in tokens {
        if let Some(children) = token.container_children() {
            markdown_into(children, hrefs, out);
            continue;
        }

        match token.kind {
            TokenKind::ObsidianLink => {
                out.push_str("[[");
                out.push_str(&token.content);
                out.push_str("]]");
            }
            TokenKind::LinkOpen => {
                hrefs.push(token.attr("href").unwrap_or_default());
                out.push('[');
            }
            TokenKind::LinkClose => {
                out.push_str("](");
                out.push_str(hrefs.pop().unwrap_or_default());
                out.push(')');
            }
            TokenKind::CodeInline => {
                let fence = markup_or(token, "`");
                out.push_str(fence);
                out.push_str(&token.content);
                out.push_str(fence);
            }
            TokenKind::Image => {
                out.push_str("![");
                out.push_str(&token.content);
                out.push_str("](");
                out.push_str(token.attr("src").unwrap_or_default());
                out.push(')');
            }
            TokenKind::StrongOpen | TokenKind::StrongClose => out.push_str(markup_or(token, "**")),
            TokenKind::EmOpen | TokenKind::EmClose => out.push_str(markup_or(token, "*")),
            TokenKind::SOpen | TokenKind::SClose => out.push_str(markup_or(token, "~~")),
            TokenKind::Softbreak | TokenKind::Hardbreak => out.push('\n'),
            TokenKind::Inline | TokenKind::Text | TokenKind::Other => out.push_str(&token.content),
        }
    }
}

fn markup_or<'a>(token: &'a Token, default: &'a str) -> &'a str {
    if token.markup.is_empty() {
        default
    } else {
        &token.markup
    }
}

/// Carry out an action: URIs go to the OS handler, copy payloads to the clipboard.
pub fn perform(action: &Action) -> Result<()> {
    match action.kind {
        ActionKind::Copy => {
            let mut clipboard = Clipboard::new()
                .map_err(|e| anyhow::anyhow!("Clipboard init failed: {e}"))?;
            clipboard
                .set_text(action.target.clone())
                .map_err(|e| anyhow::anyhow!("Clipboard write failed: {e}"))?;
        }
        ActionKind::Open | ActionKind::Insert | ActionKind::Browse => {
            open::that_detached(&action.target)?;
        }
    }
    tracing::debug!("Performed {:?} action {:?}", action.kind, action.title);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeaderNode, PageNode, Position, Span, TextNode};

    fn location() -> Location {
        Location {
            path: "Daily/2024 01.md".into(),
            position: Span {
                start: Position { line: 3, col: 0 },
                end: Position { line: 4, col: 17 },
            },
        }
    }

    fn text_item(tokens: Vec<Token>, is_task: bool, is_completed: bool) -> TreeNode {
        TreeNode {
            node: ParsedNode::Text(TextNode {
                search_key: "k".into(),
                location: location(),
                tokens,
                tags: vec![],
                is_task,
                is_completed,
            }),
            indent: 0,
            has_children: false,
            visible: true,
            selected: false,
            index: 0,
        }
    }

    #[test]
    fn test_location_uri() {
        assert_eq!(
            location_uri("insert", &location(), "My Vault"),
            "obsidian://tree-search-uri?raycastaction=insert&vault=My%20Vault&filepath=Daily%2F2024%2001.md&sl=3&sc=0&el=4&ec=17"
        );
    }

    #[test]
    fn test_open_file_uri_encodes() {
        assert_eq!(
            open_file_uri("My Vault", "a&b"),
            "obsidian://open?vault=My%20Vault&file=a%26b"
        );
    }

    #[test]
    fn test_standing_actions_come_last() {
        let item = text_item(
            vec![
                Token::new(TokenKind::CodeInline, "cargo"),
                Token::text(" and "),
                Token::new(TokenKind::ObsidianLink, "Rust"),
            ],
            false,
            false,
        );
        let rendered = build_item(&item, "Work");
        assert_eq!(rendered.text, "📋 cargo and 🔹Rust");

        let kinds: Vec<ActionKind> = rendered.actions.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::Copy,
                ActionKind::Open,
                ActionKind::Open,
                ActionKind::Insert,
                ActionKind::Copy,
            ]
        );
        assert_eq!(rendered.actions[2].title, "See in Obsidian");
        assert!(rendered.actions[2].target.contains("raycastaction=open"));
        assert_eq!(rendered.actions[3].title, "Insert After");
        assert_eq!(rendered.actions[4].target, "`cargo` and [[Rust]]");
    }

    #[test]
    fn test_markdown_for_tasks_and_markup() {
        let tokens = vec![Token::inline(vec![
            Token::new(TokenKind::StrongOpen, "").with_markup("__"),
            Token::text("ship"),
            Token::new(TokenKind::StrongClose, "").with_markup("__"),
            Token::text(" "),
            Token::new(TokenKind::LinkOpen, "").with_attr("href", "https://x.org"),
            Token::text("docs"),
            Token::new(TokenKind::LinkClose, ""),
            Token::new(TokenKind::Softbreak, "\n"),
            Token::new(TokenKind::Image, "logo").with_attr("src", "logo.png"),
            Token::new(TokenKind::EmOpen, ""),
            Token::text("now"),
            Token::new(TokenKind::EmClose, ""),
        ])];
        assert_eq!(
            to_markdown(&text_item(tokens.clone(), true, false).node),
            "- [ ] __ship__ [docs](https://x.org)\n![logo](logo.png)*now*"
        );
        assert!(to_markdown(&text_item(tokens, true, true).node).starts_with("- [x] "));
    }

    #[test]
    fn test_markdown_for_pages_and_headers() {
        let page = ParsedNode::Page(PageNode {
            search_key: "k".into(),
            location: location(),
            page: "Ideas".into(),
            aliases: vec![],
            tags: vec![],
            is_reference: false,
        });
        assert_eq!(to_markdown(&page), "[[Ideas]]");

        let header = ParsedNode::Header(HeaderNode {
            search_key: "k".into(),
            location: location(),
            page: "Ideas".into(),
            header: "Later".into(),
            is_reference: false,
        });
        assert_eq!(to_markdown(&header), "[[Ideas#Later]]");
    }
}
