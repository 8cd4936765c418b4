//! Anchor extraction from simple-repository HTML pages.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use url::Url;

use crate::model::Link;

// Quoted attribute values may contain `>`, e.g. an unescaped requires-python.
static BASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<base\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("base pattern is valid")
});

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("anchor pattern is valid")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern is valid")
});

/// Decode the character references that show up in index attributes.
pub fn unescape(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Attributes of one tag, names lowercased, values unescaped. A bare
/// attribute maps to an empty string.
fn attributes(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| unescape(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

/// Every `<a href>` on the page, resolved against `<base href>` when present
/// and the page URL otherwise.
pub fn parse_links(content: &str, page_url: &Url) -> Vec<Link> {
    let base = BASE_RE
        .captures(content)
        .and_then(|caps| attributes(&caps[1]).remove("href"))
        .and_then(|href| page_url.join(&href).ok())
        .unwrap_or_else(|| page_url.clone());

    let mut links = Vec::new();
    for caps in ANCHOR_RE.captures_iter(content) {
        let mut attrs = attributes(&caps[1]);
        let Some(href) = attrs.remove("href") else {
            continue;
        };
        let url = match base.join(href.trim()) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping anchor with bad href '{}' on {}: {}", href, page_url, e);
                continue;
            }
        };

        let mut link = Link::from_url(&url);
        if let Some(constraint) = attrs.remove("data-requires-python") {
            if !constraint.is_empty() {
                link = link.with_requires_interpreter(constraint);
            }
        }
        if let Some(reason) = attrs.remove("data-yanked") {
            link = link.with_yank(Some(reason));
        }
        links.push(link);
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://index.example.com/simple/pkg/").unwrap()
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("&gt;=3.6"), ">=3.6");
        assert_eq!(unescape("&lt;4&#44;&#x3E;=3"), "<4,>=3");
        assert_eq!(unescape("a &amp;&amp; b"), "a && b");
        assert_eq!(unescape("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_parse_relative_links() {
        let html = r#"
            <html><body>
            <a href="pkg-1.0.tar.gz#sha256=abcd">pkg-1.0.tar.gz</a><br/>
            <A HREF='../../files/pkg-2.0-py3-none-any.whl'>pkg-2.0</A>
            <a name="anchor-without-href">x</a>
            </body></html>
        "#;

        let links = parse_links(html, &page_url());
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].url(),
            "https://index.example.com/simple/pkg/pkg-1.0.tar.gz#sha256=abcd"
        );
        assert_eq!(links[0].digest().unwrap().hex, "abcd");
        assert_eq!(
            links[1].url(),
            "https://index.example.com/files/pkg-2.0-py3-none-any.whl"
        );
    }

    #[test]
    fn test_base_href() {
        let html = r#"<head><base href="https://files.example.com/pkg/"></head>
            <a href="pkg-1.0.tar.gz">pkg</a>"#;
        let links = parse_links(html, &page_url());
        assert_eq!(links[0].url(), "https://files.example.com/pkg/pkg-1.0.tar.gz");
    }

    #[test]
    fn test_unescaped_gt_in_attribute_value() {
        let html = r#"
            <a data-requires-python=">=3.13" href="pkg-1.0.tar.gz">a</a>
            <a href='pkg-2.0.tar.gz' data-requires-python='>=3.9,<4'>b</a>
        "#;
        let links = parse_links(html, &page_url());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].filename(), "pkg-1.0.tar.gz");
        assert_eq!(links[0].requires_interpreter(), Some(">=3.13"));
        assert_eq!(links[1].filename(), "pkg-2.0.tar.gz");
        assert_eq!(links[1].requires_interpreter(), Some(">=3.9,<4"));
    }

    #[test]
    fn test_base_href_after_quoted_gt() {
        let html = r#"<base data-note="a > b" href="https://files.example.com/pkg/">
            <a href="pkg-1.0.tar.gz">pkg</a>"#;
        let links = parse_links(html, &page_url());
        assert_eq!(links[0].url(), "https://files.example.com/pkg/pkg-1.0.tar.gz");
    }

    #[test]
    fn test_data_attributes() {
        let html = r#"
            <a href="pkg-1.0.tar.gz" data-requires-python="&gt;=3.6">a</a>
            <a href="pkg-0.9.tar.gz" data-yanked="">b</a>
            <a href="pkg-0.8.tar.gz" data-yanked="broken &amp; bad">c</a>
            <a href="pkg-0.7.tar.gz" data-yanked>d</a>
        "#;
        let links = parse_links(html, &page_url());

        assert_eq!(links[0].requires_interpreter(), Some(">=3.6"));
        assert!(!links[0].is_yanked());

        assert!(links[1].is_yanked());
        assert_eq!(links[1].yank_reason(), None);

        assert!(links[2].is_yanked());
        assert_eq!(links[2].yank_reason(), Some("broken & bad"));

        assert!(links[3].is_yanked());
    }
}
