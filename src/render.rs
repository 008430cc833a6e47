use std::borrow::Cow;

use crate::actions::open_file_uri;
use crate::types::{Action, ActionKind, ParsedNode, Token, TokenKind};

/// Render a search hit to its one-line display string, appending the actions
/// derived from its inline markup to `actions` in document order.
pub fn render_node(node: &ParsedNode, actions: &mut Vec<Action>, source: &str) -> String {
    match node {
        ParsedNode::Text(text) => render_tokens(&text.tokens, actions, source),
        ParsedNode::Header(header) => format!("{} > {}", header.page, header.header),
        ParsedNode::Page(page) => page.page.clone(),
    }
}

/// Render a token sequence. Containers are flattened in place, so wrapping a
/// sequence in an extra `inline` level never changes the output.
pub fn render_tokens(tokens: &[Token], actions: &mut Vec<Action>, source: &str) -> String {
    let mut out = String::new();
    render_into(tokens, actions, source, &mut out);
    out
}

fn render_into(tokens: &[Token], actions: &mut Vec<Action>, source: &str, out: &mut String) {
    let mut cursor = 0;
    while let Some(token) = tokens.get(cursor) {
        cursor += 1;

        if let Some(children) = token.container_children() {
            render_into(children, actions, source, out);
            continue;
        }

        match token.kind {
            TokenKind::ObsidianLink => {
                out.push('🔹');
                out.push_str(&token.content);
                actions.push(Action::new(
                    format!("Open 🔹{}", token.content),
                    ActionKind::Open,
                    open_file_uri(source, link_target(&token.content)),
                ));
            }
            TokenKind::LinkOpen => {
                let (label, next) = link_label(tokens, cursor);
                cursor = next;
                out.push_str("🔗 ");
                out.push_str(label);
                actions.push(Action::new(
                    format!("Browse 🔗{label}"),
                    ActionKind::Browse,
                    decode_href(token),
                ));
            }
            TokenKind::Text if token.content.trim().starts_with("http") => {
                out.push_str("🔗 ");
                out.push_str(&token.content);
                actions.push(Action::new(
                    format!("Browse 🔗{}", token.content),
                    ActionKind::Browse,
                    token.content.trim(),
                ));
            }
            TokenKind::CodeInline => {
                out.push_str("📋 ");
                out.push_str(&token.content);
                actions.push(Action::new(
                    format!("Copy {} to clipboard", token.content),
                    ActionKind::Copy,
                    token.content.as_str(),
                ));
            }
            TokenKind::Image => {
                out.push_str("🖼️ ");
                out.push_str(&token.content);
            }
            // Formatting markers, breaks, stray closers and unknown kinds
            // contribute their content only.
            TokenKind::Text
            | TokenKind::Inline
            | TokenKind::LinkClose
            | TokenKind::StrongOpen
            | TokenKind::StrongClose
            | TokenKind::EmOpen
            | TokenKind::EmClose
            | TokenKind::SOpen
            | TokenKind::SClose
            | TokenKind::Softbreak
            | TokenKind::Hardbreak
            | TokenKind::Other => out.push_str(&token.content),
        }
    }
}

/// Bare document name of an internal link: `Note#Header|Alias` -> `Note`.
pub fn link_target(content: &str) -> &str {
    let name = content.split('|').next().unwrap_or(content);
    name.split('#').next().unwrap_or(name)
}

/// Label of the external link opened just before `start`, and the index of the
/// first token after the link.
fn link_label(tokens: &[Token], start: usize) -> (&str, usize) {
    let mut next = start;
    let mut label = "";
    if let Some(token) = tokens.get(next) {
        if token.kind != TokenKind::LinkClose {
            label = &token.content;
            next += 1;
        }
    }
    if tokens.get(next).is_some_and(|t| t.kind == TokenKind::LinkClose) {
        next += 1;
    }
    (label, next)
}

/// Percent-decoded href of a `link_open` token. Hrefs that do not decode to
/// valid UTF-8 are used as-is.
fn decode_href(token: &Token) -> String {
    let href = token
        .attr("href")
        .or_else(|| {
            token
                .attrs
                .as_deref()
                .and_then(|attrs| attrs.first())
                .map(|(_, v)| v.as_str())
        })
        .unwrap_or("#");

    match urlencoding::decode(href).map(Cow::into_owned) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Keeping undecodable href {href:?}: {e}");
            href.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeaderNode, Location, PageNode, TextNode};

    fn link(content: &str) -> Token {
        Token::new(TokenKind::ObsidianLink, content)
    }

    fn external(href: &str, label: &str) -> Vec<Token> {
        vec![
            Token::new(TokenKind::LinkOpen, "").with_attr("href", href),
            Token::text(label),
            Token::new(TokenKind::LinkClose, ""),
        ]
    }

    fn render(tokens: &[Token]) -> (String, Vec<Action>) {
        let mut actions = Vec::new();
        let text = render_tokens(tokens, &mut actions, "Work");
        (text, actions)
    }

    #[test]
    fn test_internal_link() {
        let tokens = vec![
            Token::text("Hello "),
            link("Note#Header|Note"),
            Token::text(" world"),
        ];
        let (text, actions) = render(&tokens);
        assert_eq!(text, "Hello 🔹Note#Header|Note world");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].title, "Open 🔹Note#Header|Note");
        assert_eq!(actions[0].kind, ActionKind::Open);
        assert_eq!(actions[0].target, "obsidian://open?vault=Work&file=Note");
    }

    #[test]
    fn test_link_target() {
        assert_eq!(link_target("Note#Header|Note"), "Note");
        assert_eq!(link_target("Note|Alias#x"), "Note");
        assert_eq!(link_target("Plain"), "Plain");
        assert_eq!(link_target("#Local"), "");
    }

    #[test]
    fn test_inline_code() {
        let (text, actions) = render(&[Token::new(TokenKind::CodeInline, "TODO")]);
        assert_eq!(text, "📋 TODO");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Copy);
        assert_eq!(actions[0].target, "TODO");
    }

    #[test]
    fn test_external_link_consumes_pair() {
        let mut tokens = external("https://example.org/a%20b", "docs");
        tokens.push(Token::text(" after"));
        let (text, actions) = render(&tokens);
        assert_eq!(text, "🔗 docs after");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Browse);
        assert_eq!(actions[0].title, "Browse 🔗docs");
        assert_eq!(actions[0].target, "https://example.org/a b");
    }

    #[test]
    fn test_undecodable_href_falls_back_to_raw() {
        let (_, actions) = render(&external("https://x.org/%FF", "bad"));
        assert_eq!(actions[0].target, "https://x.org/%FF");
    }

    #[test]
    fn test_link_without_href() {
        let tokens = vec![Token::new(TokenKind::LinkOpen, ""), Token::new(TokenKind::LinkClose, "")];
        let (text, actions) = render(&tokens);
        assert_eq!(text, "🔗 ");
        assert_eq!(actions[0].target, "#");
    }

    #[test]
    fn test_autolink_trims_target() {
        let (text, actions) = render(&[Token::text(" https://rust-lang.org ")]);
        assert_eq!(text, "🔗  https://rust-lang.org ");
        assert_eq!(actions[0].target, "https://rust-lang.org");
    }

    #[test]
    fn test_image_and_passthrough() {
        let tokens = vec![
            Token::new(TokenKind::StrongOpen, ""),
            Token::text("bold"),
            Token::new(TokenKind::StrongClose, ""),
            Token::new(TokenKind::Softbreak, "\n"),
            Token::new(TokenKind::Image, "diagram"),
            Token::new(TokenKind::Other, "[^1]"),
        ];
        let (text, actions) = render(&tokens);
        assert_eq!(text, "bold\n🖼️ diagram[^1]");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_closers_and_bare_inline_pass_through() {
        let tokens = vec![
            Token::new(TokenKind::LinkClose, "]"),
            Token::new(TokenKind::Inline, "raw"),
            Token::new(TokenKind::Hardbreak, "\n"),
            Token::new(TokenKind::EmClose, "_"),
        ];
        let (text, actions) = render(&tokens);
        assert_eq!(text, "]raw\n_");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_empty_sequence() {
        let (text, actions) = render(&[]);
        assert_eq!(text, "");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_container_flattening() {
        let mut flat = vec![Token::text("see "), link("A"), Token::new(TokenKind::CodeInline, "x")];
        flat.extend(external("https://b.org", "b"));
        flat.push(Token::text("http://c.org"));

        let wrapped = vec![Token::inline(flat.clone())];
        let nested = vec![Token::inline(vec![Token::inline(flat[..2].to_vec())]), Token::inline(flat[2..].to_vec())];

        let (flat_text, flat_actions) = render(&flat);
        let (wrapped_text, wrapped_actions) = render(&wrapped);
        let (nested_text, nested_actions) = render(&nested);
        assert_eq!(flat_text, wrapped_text);
        assert_eq!(flat_actions, wrapped_actions);
        assert_eq!(flat_text, nested_text);
        assert_eq!(flat_actions, nested_actions);
    }

    #[test]
    fn test_siblings_after_container_are_rendered() {
        let tokens = vec![Token::inline(vec![Token::text("a")]), Token::text("b")];
        assert_eq!(render(&tokens).0, "ab");
    }

    #[test]
    fn test_action_order_ignores_formatting() {
        let tokens = vec![
            Token::new(TokenKind::EmOpen, ""),
            Token::new(TokenKind::CodeInline, "one"),
            Token::new(TokenKind::EmClose, ""),
            link("two"),
            Token::new(TokenKind::SOpen, ""),
            Token::text("https://three.org"),
            Token::new(TokenKind::SClose, ""),
        ];
        let (_, actions) = render(&tokens);
        let kinds: Vec<ActionKind> = actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Copy, ActionKind::Open, ActionKind::Browse]);
    }

    #[test]
    fn test_render_nodes() {
        let mut actions = Vec::new();
        let header = ParsedNode::Header(HeaderNode {
            search_key: "k".into(),
            location: Location::default(),
            page: "Recipes".into(),
            header: "Soup".into(),
            is_reference: false,
        });
        assert_eq!(render_node(&header, &mut actions, "Work"), "Recipes > Soup");

        let page = ParsedNode::Page(PageNode {
            search_key: "k".into(),
            location: Location::default(),
            page: "Recipes".into(),
            aliases: vec![],
            tags: vec![],
            is_reference: false,
        });
        assert_eq!(render_node(&page, &mut actions, "Work"), "Recipes");
        assert!(actions.is_empty());

        let text = ParsedNode::Text(TextNode {
            search_key: "k".into(),
            location: Location::default(),
            tokens: vec![Token::inline(vec![Token::text("buy "), link("Milk")])],
            tags: vec![],
            is_task: true,
            is_completed: false,
        });
        assert_eq!(render_node(&text, &mut actions, "Work"), "buy 🔹Milk");
        assert_eq!(actions.len(), 1);
    }
}
