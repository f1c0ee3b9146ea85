//! Balanced-markup checks for generated caption fragments.

use quick_xml::Reader;
use quick_xml::events::Event;

/// Markup that does not form a balanced fragment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed fragment: {reason}")]
pub struct FragmentError {
    pub reason: String,
}

impl FragmentError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Elements written without an end tag.
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"param", b"source", b"track", b"wbr",
];

/// Check that `markup` parses as a sequence of balanced elements and text.
///
/// HTML void elements may be written either as `<br>` or `<br />`. Entity
/// references are not resolved, so `&nbsp;` and friends pass. An unescaped
/// `<` in text, an unclosed tag or a mismatched end tag fails.
pub fn check_well_formed(markup: &str) -> Result<(), FragmentError> {
    let wrapped = format!("<fragment>{markup}</fragment>");
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().check_end_names = false;
    let mut open: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                if name.is_empty() {
                    return Err(FragmentError::new("tag without a name"));
                }
                if !VOID_ELEMENTS.contains(&name.as_slice()) {
                    open.push(name);
                }
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref().is_empty() {
                    return Err(FragmentError::new("tag without a name"));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                if VOID_ELEMENTS.contains(&name.as_slice()) {
                    continue;
                }
                match open.pop() {
                    Some(expected) if expected == name => {}
                    Some(expected) => {
                        return Err(FragmentError::new(format!(
                            "expected </{}>, found </{}>",
                            String::from_utf8_lossy(&expected),
                            String::from_utf8_lossy(&name)
                        )));
                    }
                    None => return Err(FragmentError::new("unexpected end tag")),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FragmentError::new(e.to_string())),
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(FragmentError::new("unclosed element"));
    }
    Ok(())
}
