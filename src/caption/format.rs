//! Template rendering for ids, caption prefixes and reference texts.

use crate::config::IdentifierConfig;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown placeholder '{{{0}}}' in template '{1}'")]
    UnknownPlaceholder(String, String),

    #[error("template '{0}' uses {{index}} where no index is available")]
    MissingIndex(String),

    #[error("unbalanced brace in template '{0}'")]
    UnbalancedBrace(String),
}

/// Render a template.
///
/// Recognized placeholders are `{identifier}` (lowercase), `{Identifier}`
/// (first letter uppercase, rest lowercase) and `{index}`. `{{` and `}}`
/// produce literal braces. Output is not escaped.
pub fn format_template(
    template: &str,
    identifier: &str,
    index: Option<i64>,
) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len() + identifier.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(FormatError::UnbalancedBrace(template.to_string()));
                        }
                        Some(c) => name.push(c),
                    }
                }
                match name.as_str() {
                    "identifier" => out.push_str(&identifier.to_lowercase()),
                    "Identifier" => out.push_str(&capitalize(identifier)),
                    "index" => match index {
                        Some(index) => out.push_str(&index.to_string()),
                        None => return Err(FormatError::MissingIndex(template.to_string())),
                    },
                    _ => {
                        return Err(FormatError::UnknownPlaceholder(
                            name,
                            template.to_string(),
                        ));
                    }
                }
            }
            '}' => return Err(FormatError::UnbalancedBrace(template.to_string())),
            c => out.push(c),
        }
    }

    Ok(out)
}

/// "list" -> "List", "EQUATION" -> "Equation"
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

impl IdentifierConfig {
    /// The keyword that starts a caption line in markdown, e.g. `Figure:`.
    pub fn markdown_keyword(&self, identifier: &str) -> Result<String, FormatError> {
        format_template(&self.markdown_identifier, identifier, None)
    }

    pub fn caption_prefix(&self, identifier: &str, index: i64) -> Result<String, FormatError> {
        format_template(&self.caption_prefix, identifier, Some(index))
    }

    pub fn reference_text(&self, identifier: &str, index: i64) -> Result<String, FormatError> {
        format_template(&self.reference_text, identifier, Some(index))
    }

    pub fn default_id(&self, identifier: &str, index: i64) -> Result<String, FormatError> {
        format_template(&self.default_id, identifier, Some(index))
    }
}
