//! Build-wide cross-reference registry.
//!
//! Assemblers register every id they assign together with its reference
//! text. Once every page has been assembled, [`CrossReferences::post_process`]
//! fills empty links pointing at those ids with that text. Links that already
//! carry text are never touched.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// An `<a>` with an `href` and no content: `(opening tag)(href)</a>`.
static EMPTY_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<a\s[^>]*href="([^"]*)"[^>]*>)</a>"#).expect("empty anchor pattern")
});

/// Identity of a page as seen by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef<'a> {
    /// Path of the source file relative to the content root, `/`-separated
    pub source_path: &'a str,
    pub title: &'a str,
}

impl<'a> PageRef<'a> {
    pub fn new(source_path: &'a str, title: &'a str) -> Self {
        Self { source_path, title }
    }

    /// Source path without its markdown extension: `guide/intro.md` -> `guide/intro`
    pub fn stem(&self) -> &'a str {
        strip_page_extension(self.source_path)
    }

    /// Directory holding the page: `guide/intro.md` -> `guide`
    fn directory(&self) -> &'a str {
        self.source_path
            .rsplit_once('/')
            .map_or("", |(directory, _)| directory)
    }
}

fn strip_page_extension(path: &str) -> &str {
    path.strip_suffix(".md")
        .or_else(|| path.strip_suffix(".markdown"))
        .or_else(|| path.strip_suffix(".html"))
        .unwrap_or(path)
}

#[derive(Debug)]
pub struct CrossReferences {
    cross_reference_text: String,
    /// Text for links from other pages, keyed by `stem#id`
    global: HashMap<String, String>,
    /// Text for same-page links, keyed by source path then id
    local: HashMap<String, HashMap<String, String>>,
}

impl Default for CrossReferences {
    fn default() -> Self {
        Self::new("{local_ref}")
    }
}

impl CrossReferences {
    /// Create an empty registry.
    ///
    /// `cross_reference_text` renders links coming from other pages and may
    /// use `{page_title}` and `{local_ref}`.
    pub fn new(cross_reference_text: &str) -> Self {
        Self {
            cross_reference_text: cross_reference_text.to_string(),
            global: HashMap::new(),
            local: HashMap::new(),
        }
    }

    /// Forget every registration.
    pub fn clear(&mut self) {
        self.global.clear();
        self.local.clear();
    }

    pub fn len(&self) -> usize {
        self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }

    /// Register `id` on `page` as a reference target rendered as `text`.
    ///
    /// Registering the same id on the same page again overwrites the text.
    pub fn register_target(&mut self, id: &str, text: &str, page: &PageRef<'_>) {
        let global_text = self
            .cross_reference_text
            .replace("{page_title}", page.title)
            .replace("{local_ref}", text);
        self.global
            .insert(format!("{}#{id}", page.stem()), global_text);
        self.local
            .entry(page.source_path.to_string())
            .or_default()
            .insert(id.to_string(), text.to_string());

        tracing::debug!(page = page.source_path, id, text, "registered reference target");
    }

    /// Fill empty links on `page`.
    ///
    /// Page-qualified links are resolved against the directory of `page`;
    /// links that do not resolve there are also tried from the content root.
    /// Must only run once every page of the build has registered its targets.
    pub fn post_process(&self, page: &PageRef<'_>, html: &str) -> String {
        EMPTY_ANCHOR_RE
            .replace_all(html, |caps: &Captures| match self.lookup(page, &caps[2]) {
                Some(text) => format!("{}{text}</a>", &caps[1]),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn lookup(&self, page: &PageRef<'_>, href: &str) -> Option<&str> {
        let (path, id) = href.split_once('#')?;
        if id.is_empty() {
            return None;
        }
        if path.is_empty() {
            return self
                .local
                .get(page.source_path)?
                .get(id)
                .map(String::as_str);
        }
        if path.contains("://") || path.starts_with("mailto:") {
            return None;
        }

        let target = strip_page_extension(path.trim_end_matches('/'));
        let base = if target.starts_with('/') { "" } else { page.directory() };
        [resolve(base, target), resolve("", target)]
            .into_iter()
            .find_map(|stem| self.global.get(&format!("{stem}#{id}")))
            .map(String::as_str)
    }
}

/// Join `path` onto `base` and fold `.` and `..` segments, never climbing
/// above the content root.
fn resolve(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join("/")
}
