//! Markdown-phase fencing of caption lines.
//!
//! A caption line such as
//!
//! ```text
//! Figure: A cat {#cat .wide}
//!
//! ![cat](cat.png)
//! ```
//!
//! is rewritten into a start marker, the caption paragraph and an end marker,
//! each separated by blank lines so the markdown renderer keeps them as three
//! paragraphs in front of the captioned element:
//!
//! ```text
//! <figure-caption identifier="Figure" id="cat" class="wide"></figure-caption>
//!
//! A cat
//!
//! <figure-caption-end></figure-caption-end>
//! ```

use regex::{Captures, Regex};

use crate::dom::escape_attr;

/// Build the matcher for caption lines starting with `keyword`.
///
/// The caption runs up to the first blank line and may end with a
/// `{...}` option block.
pub fn caption_pattern(keyword: &str, allow_indented: bool) -> Result<Regex, regex::Error> {
    let indent = if allow_indented { r"[ \t]*" } else { "" };
    Regex::new(&format!(
        r"(?ms)^({indent})({}) (.*?)(\{{(.*?)\}})?\n\n",
        regex::escape(keyword)
    ))
}

/// Wrap every caption line introduced by `keyword` in `tag` markers.
pub fn fence_captions(
    markdown: &str,
    keyword: &str,
    tag: &str,
    allow_indented: bool,
) -> Result<String, regex::Error> {
    let pattern = caption_pattern(keyword, allow_indented)?;
    let fenced = pattern.replace_all(markdown, |caps: &Captures| {
        let prefix = &caps[1];
        let identifier = escape_attr(caps[2].trim_end_matches(':'));
        let caption = caps[3].replace('\n', " ");
        let caption = caption.trim_end();
        let options = caps.get(5).map(|m| marker_attributes(m.as_str())).unwrap_or_default();
        format!(
            "\n{prefix}<{tag} identifier=\"{identifier}\"{options}></{tag}>\n\n\
             {prefix}{caption}\n\n\
             {prefix}<{tag}-end></{tag}-end>\n\n"
        )
    });
    Ok(fenced.into_owned())
}

enum OptionToken<'a> {
    Id(&'a str),
    Classes,
    Raw(&'a str),
}

/// Turn a `{#id .class key="value"}` option block into marker attributes.
///
/// Class tokens are merged into a single `class` attribute placed where the
/// first one appeared. Only the first `#id` counts. Anything else is copied
/// through verbatim.
fn marker_attributes(options: &str) -> String {
    let mut tokens = Vec::new();
    let mut classes = Vec::new();
    let mut has_id = false;

    for token in options.split(' ').filter(|t| !t.is_empty()) {
        if let Some(class) = token.strip_prefix('.') {
            if classes.is_empty() {
                tokens.push(OptionToken::Classes);
            }
            classes.push(class);
        } else if let Some(id) = token.strip_prefix('#') {
            if !has_id {
                has_id = true;
                tokens.push(OptionToken::Id(id));
            }
        } else {
            tokens.push(OptionToken::Raw(token));
        }
    }

    let mut out = String::new();
    for token in tokens {
        out.push(' ');
        match token {
            OptionToken::Id(id) => out.push_str(&format!("id=\"{}\"", escape_attr(id))),
            OptionToken::Classes => {
                out.push_str(&format!("class=\"{}\"", escape_attr(&classes.join(" "))))
            }
            OptionToken::Raw(raw) => out.push_str(raw),
        }
    }
    out
}
