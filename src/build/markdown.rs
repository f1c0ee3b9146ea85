//! Markdown rendering with heading permalinks.

use std::collections::HashSet;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// A heading whose id is generated once its text is known.
struct PendingHeading<'a> {
    level: HeadingLevel,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    events: Vec<Event<'a>>,
    text: String,
}

/// Render markdown to HTML using pulldown-cmark.
///
/// Headings without an explicit id get one derived from their text, plus a
/// permalink. Relative links to `.md` files are pointed at the rendered
/// `.html` pages. Raw HTML (including caption marker tags) passes through.
pub fn render_markdown(
    markdown: &str,
    markdown_config: &MarkdownConfig,
) -> Result<String, MarkdownError> {
    let options = parser_options(markdown_config)?;
    let parser = Parser::new_ext(markdown, options);

    let mut events: Vec<Event> = Vec::new();
    let mut heading: Option<PendingHeading> = None;
    let mut used_heading_ids: HashSet<String> = HashSet::new();

    for event in parser.map(rewrite_link) {
        match event {
            Event::Start(Tag::Heading {
                level,
                id: None,
                classes,
                attrs,
            }) => {
                heading = Some(PendingHeading {
                    level,
                    classes,
                    attrs,
                    events: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Start(Tag::Heading {
                level,
                id: Some(id),
                classes,
                attrs,
            }) => {
                used_heading_ids.insert(id.to_string());
                events.push(Event::Start(Tag::Heading {
                    level,
                    id: Some(id),
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(pending) = heading.take() {
                    let id = unique_id(&pending.text, &mut used_heading_ids);
                    let permalink = format!(
                        " <a class=\"header-anchor\" href=\"#{id}\" aria-label=\"Link to this heading\">#</a>"
                    );
                    events.push(Event::Start(Tag::Heading {
                        level: pending.level,
                        id: Some(CowStr::from(id)),
                        classes: pending.classes,
                        attrs: pending.attrs,
                    }));
                    events.extend(pending.events);
                    events.push(Event::Html(permalink.into()));
                }
                events.push(Event::End(TagEnd::Heading(level)));
            }
            event => match heading.as_mut() {
                Some(pending) => {
                    if let Event::Text(text) | Event::Code(text) = &event {
                        pending.text.push_str(text);
                    }
                    pending.events.push(event);
                }
                None => events.push(event),
            },
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());
    Ok(html_output)
}

fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

fn unique_id(text: &str, used: &mut HashSet<String>) -> String {
    let base_id = slugify(text);
    let mut id = base_id.clone();
    let mut suffix = 1;
    while used.contains(&id) {
        id = format!("{base_id}-{suffix}");
        suffix += 1;
    }
    used.insert(id.clone());
    id
}

fn rewrite_link(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = match markdown_link_to_html(&dest_url) {
                Some(url) => CowStr::from(url),
                None => dest_url,
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    }
}

/// `other.md#fig` -> `other.html#fig`; `None` for anything else.
fn markdown_link_to_html(url: &str) -> Option<String> {
    if url.contains("://") || url.starts_with("mailto:") {
        return None;
    }
    let (path, fragment) = match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    };
    let stem = path
        .strip_suffix(".md")
        .or_else(|| path.strip_suffix(".markdown"))?;
    Some(match fragment {
        Some(fragment) => format!("{stem}.html#{fragment}"),
        None => format!("{stem}.html"),
    })
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}
