//! Links found in annotation rows and help articles.

use regex::Regex;
use relative_path::{RelativePath, RelativePathBuf};
use std::sync::OnceLock;

fn word_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/dict/(.+)$").expect("Invalid word link regex"))
}

fn academy_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"rc://.*/ta/man/(.+)").expect("Invalid academy link regex"))
}

fn scripture_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\.\./(\d+)/(\d+)\.md$").expect("Invalid scripture link regex"))
}

/// `rc://*/tw/dict/bible/kt/god` gives `bible/kt/god.md`.
pub fn word_article_path(tw_link: &str) -> Option<RelativePathBuf> {
    let captures = word_link_regex().captures(tw_link.trim())?;
    normalize("", &format!("{}.md", &captures[1]))
}

/// `rc://*/ta/man/translate/figs-metaphor` gives `translate/figs-metaphor/01.md`.
pub fn academy_article_path(support_reference: &str) -> Option<RelativePathBuf> {
    let captures = academy_link_regex().captures(support_reference.trim())?;
    let path = captures[1].trim_end_matches('/');
    normalize("", &format!("{path}/01.md"))
}

/// `../03/16.md` gives chapter `3`, verse `16`. Links into another book
/// (`../../jhn/03/16.md`) are not scripture links of the open book.
pub fn scripture_link(href: &str) -> Option<(String, String)> {
    let captures = scripture_link_regex().captures(href)?;
    let chapter: u64 = captures[1].parse().ok()?;
    let verse: u64 = captures[2].parse().ok()?;
    Some((chapter.to_string(), verse.to_string()))
}

/// Resolve a link inside the article at `current`.
///
/// Relative hrefs are taken from the current article's directory; academy
/// `rc://` links resolve to the article they name. Links that would leave
/// the resource are rejected.
pub fn resolve_article_link(current: &RelativePath, href: &str) -> Option<RelativePathBuf> {
    if href.starts_with("rc://") {
        return academy_article_path(href);
    }

    let directory = current.parent().unwrap_or(RelativePath::new(""));
    normalize(directory.as_str(), href)
}

/// Apply `href`'s segments to the directory `base`, resolving `.` and `..`.
/// `None` when the path would climb above the resource root or is empty.
fn normalize(base: &str, href: &str) -> Option<RelativePathBuf> {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for part in href.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            part => parts.push(part),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(RelativePathBuf::from(parts.join("/")))
}
