//! Table captions.
//!
//! The caption becomes the table's `<caption>`; `caption-side` follows the
//! configured position. A `cols="1,3"` option adds a `<colgroup>` with
//! relative column widths.

use crate::config::IdentifierConfig;
use crate::dom::{Attribute, Dom, NodeId};

use super::{
    CaptionError, CaptionMarkers, CaptionRecord, CrossReferences, IndexCounter, PageRef,
    TABLE_CAPTION_TAG, caption_element,
};

const IDENTIFIER: &str = "table";

pub(super) fn process(
    dom: &mut Dom,
    config: &IdentifierConfig,
    page: &PageRef<'_>,
    references: &mut CrossReferences,
) -> Result<(), CaptionError> {
    if !config.enable {
        return Ok(());
    }

    let mut counter = IndexCounter::new(config.start_index, config.increment_index);
    let mut markers = CaptionMarkers::find(dom, TABLE_CAPTION_TAG);
    while let Some(record) = markers.next_record(dom) {
        let index = counter.current(IDENTIFIER);
        let result = record
            .and_then(|record| caption_table(dom, record, config, index, page, references));
        match result {
            Ok(()) => counter.advance(IDENTIFIER),
            Err(e) if e.is_caption_level() => {
                tracing::error!(page = page.source_path, error = %e, "skipping table caption");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn caption_table(
    dom: &mut Dom,
    mut record: CaptionRecord,
    config: &IdentifierConfig,
    index: i64,
    page: &PageRef<'_>,
    references: &mut CrossReferences,
) -> Result<(), CaptionError> {
    let table = match record.target {
        Some(target) if dom.is_element_named(target, "table") => target,
        _ => {
            return Err(CaptionError::mismatch(
                &record.body,
                "table caption must be followed by a table",
            ));
        }
    };

    let prefix = config.caption_prefix(IDENTIFIER, index)?;
    let reference = config.reference_text(IDENTIFIER, index)?;
    let default_id = config.default_id(IDENTIFIER, index)?;

    let caption = caption_element(
        dom,
        "caption",
        vec![Attribute::new(
            "style",
            format!("caption-side:{}", config.position),
        )],
        &format!("{prefix} {}", record.body),
    )?;
    dom.insert_child(table, 0, caption);

    if let Some(cols) = record.take_attribute("cols") {
        match column_widths(&cols) {
            Some(widths) => {
                let colgroup = colgroup(dom, &widths);
                dom.insert_child(table, 0, colgroup);
            }
            None => tracing::warn!(
                page = page.source_path,
                cols = %cols,
                "ignoring invalid column widths"
            ),
        }
    }

    for (name, value) in &record.attributes {
        dom.set_attr(table, name, value.as_str());
    }
    let id = match dom.attr(table, "id") {
        Some(id) => id.to_string(),
        None => {
            dom.set_attr(table, "id", default_id.as_str());
            default_id
        }
    };

    references.register_target(&id, &reference, page);
    Ok(())
}

/// Column widths as percentages of their sum.
///
/// `None` unless every entry is a non-negative number and the sum is positive.
fn column_widths(cols: &str) -> Option<Vec<f64>> {
    let widths = cols
        .split(',')
        .map(|w| w.trim().parse::<f64>().ok().filter(|w| w.is_finite() && *w >= 0.0))
        .collect::<Option<Vec<f64>>>()?;
    let total: f64 = widths.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(widths.iter().map(|w| w / total * 100.0).collect())
}

fn colgroup(dom: &mut Dom, percentages: &[f64]) -> NodeId {
    let colgroup = dom.create_element("colgroup", Vec::new());
    for percentage in percentages {
        let col = dom.create_element(
            "col",
            vec![
                Attribute::new("span", "1"),
                Attribute::new("width", format!("{percentage:?}%")),
            ],
        );
        dom.append(colgroup, col);
    }
    colgroup
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: PageRef<'static> = PageRef {
        source_path: "tables.md",
        title: "Tables",
    };

    fn marker(options: &str, caption: &str) -> String {
        format!(
            "<p><table-caption identifier=\"Table\"{options}></table-caption></p>\
             <p>{caption}</p>\
             <p><table-caption-end></table-caption-end></p>"
        )
    }

    const TABLE: &str = "<table><tbody><tr><td>1</td></tr></tbody></table>";

    fn run(html: &str, config: &IdentifierConfig) -> (String, CrossReferences) {
        let mut dom = Dom::parse_fragment(html);
        let mut references = CrossReferences::default();
        process(&mut dom, config, &PAGE, &mut references).unwrap();
        (dom.fragment_html(), references)
    }

    #[test]
    fn test_caption_is_first_child() {
        let html = format!("{}{TABLE}", marker("", "Numbers"));
        let (out, references) = run(&html, &IdentifierConfig::default());
        assert_eq!(
            out,
            "<table id=\"_table-1\"><caption style=\"caption-side:bottom\">Table 1: Numbers</caption>\
             <tbody><tr><td>1</td></tr></tbody></table>"
        );
        assert_eq!(references.len(), 1);
    }

    #[test]
    fn test_position_top() {
        let config = IdentifierConfig {
            position: crate::config::Position::Top,
            ..IdentifierConfig::default()
        };
        let html = format!("{}{TABLE}", marker("", "Numbers"));
        let (out, _) = run(&html, &config);
        assert!(out.contains("<caption style=\"caption-side:top\">"));
    }

    #[test]
    fn test_marker_attributes_are_copied() {
        let html = format!("{}{TABLE}", marker(" id=\"tab\" class=\"wide\"", "Numbers"));
        let (out, _) = run(&html, &IdentifierConfig::default());
        assert!(out.starts_with("<table id=\"tab\" class=\"wide\"><caption"));
    }

    #[test]
    fn test_existing_table_id_is_kept() {
        let html = format!(
            "{}<table id=\"results\"><tbody><tr><td>1</td></tr></tbody></table>",
            marker("", "Numbers")
        );
        let (out, _) = run(&html, &IdentifierConfig::default());
        assert!(out.starts_with("<table id=\"results\">"));
    }

    #[test]
    fn test_colgroup_before_caption() {
        let html = format!("{}{TABLE}", marker(" cols=\"1,3\"", "Numbers"));
        let (out, _) = run(&html, &IdentifierConfig::default());
        assert_eq!(
            out,
            "<table id=\"_table-1\"><colgroup><col span=\"1\" width=\"25.0%\"><col span=\"1\" width=\"75.0%\"></colgroup>\
             <caption style=\"caption-side:bottom\">Table 1: Numbers</caption>\
             <tbody><tr><td>1</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_invalid_cols_are_dropped() {
        let html = format!("{}{TABLE}", marker(" cols=\"1,x\"", "Numbers"));
        let (out, _) = run(&html, &IdentifierConfig::default());
        assert!(!out.contains("colgroup"));
        assert!(!out.contains("cols="));
        assert!(out.contains("<caption"));
    }

    #[test]
    fn test_column_widths_keep_ratio() {
        let widths = column_widths("2, 3, 5").unwrap();
        assert_eq!(widths, vec![20.0, 30.0, 50.0]);
        let widths = column_widths("456,85").unwrap();
        let sum: f64 = widths.iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((widths[0] / widths[1] - 456.0 / 85.0).abs() < 1e-9);

        assert_eq!(column_widths(""), None);
        assert_eq!(column_widths("0,0"), None);
        assert_eq!(column_widths("1,-1"), None);
    }

    #[test]
    fn test_wrong_target_is_left_alone() {
        let html = format!("{}<p>Not a table</p>", marker("", "Numbers"));
        let (out, references) = run(&html, &IdentifierConfig::default());
        assert_eq!(out, "<p>Not a table</p>");
        assert!(references.is_empty());
    }

    #[test]
    fn test_failed_caption_does_not_consume_an_index() {
        let html = format!(
            "{}{TABLE}{}<p>oops</p>{}{TABLE}",
            marker("", "One"),
            marker("", "Skipped"),
            marker("", "Two")
        );
        let (out, _) = run(&html, &IdentifierConfig::default());
        assert!(out.contains("Table 1: One"));
        assert!(out.contains("Table 2: Two"));
        assert!(out.contains("id=\"_table-2\""));
    }

    #[test]
    fn test_start_and_increment() {
        let config = IdentifierConfig {
            start_index: 0,
            increment_index: 2,
            ..IdentifierConfig::default()
        };
        let html = format!("{}{TABLE}{}{TABLE}", marker("", "A"), marker("", "B"));
        let (out, _) = run(&html, &config);
        assert!(out.contains("Table 0: A"));
        assert!(out.contains("Table 2: B"));
    }

    #[test]
    fn test_malformed_prefix_skips_caption() {
        let config = IdentifierConfig {
            caption_prefix: "Table {index} <".to_string(),
            ..IdentifierConfig::default()
        };
        let html = format!("{}{TABLE}", marker("", "Numbers"));
        let (out, references) = run(&html, &config);
        assert_eq!(out, TABLE);
        assert!(references.is_empty());
    }

    #[test]
    fn test_disabled() {
        let config = IdentifierConfig {
            enable: false,
            ..IdentifierConfig::default()
        };
        let html = format!("{}{TABLE}", marker("", "Numbers"));
        let mut dom = Dom::parse_fragment(&html);
        let mut references = CrossReferences::default();
        process(&mut dom, &config, &PAGE, &mut references).unwrap();
        assert!(!dom.is_modified());
    }
}
