//! Captions of additional identifiers (`List:`, `Equation:`, ...).
//!
//! Whatever element follows the caption is wrapped in a `figure`. Every
//! identifier has its own numbering.

use crate::config::IdentifierConfig;
use crate::dom::Dom;

use super::{
    CUSTOM_CAPTION_TAG, CaptionError, CaptionMarkers, CaptionRecord, CrossReferences,
    IndexCounter, PageRef, attributes_with_id, caption_element, wrap_in_figure,
};

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
    let mut markers = CaptionMarkers::find(dom, CUSTOM_CAPTION_TAG);
    while let Some(record) = markers.next_record(dom) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(page = page.source_path, error = %e, "skipping caption");
                continue;
            }
        };
        let identifier = record.identifier.clone();
        let index = counter.current(&identifier);
        match wrap_target(dom, record, config, index, page, references) {
            Ok(()) => counter.advance(&identifier),
            Err(e) if e.is_caption_level() => {
                tracing::error!(page = page.source_path, identifier = %identifier, error = %e, "skipping caption");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn wrap_target(
    dom: &mut Dom,
    record: CaptionRecord,
    config: &IdentifierConfig,
    index: i64,
    page: &PageRef<'_>,
    references: &mut CrossReferences,
) -> Result<(), CaptionError> {
    let Some(target) = record.target else {
        return Err(CaptionError::mismatch(
            &record.body,
            "caption is not followed by an element",
        ));
    };

    let identifier = record.identifier.as_str();
    let prefix = config.caption_prefix(identifier, index)?;
    let reference = config.reference_text(identifier, index)?;
    let id = match record.attribute("id") {
        Some(id) => id.to_string(),
        None => config.default_id(identifier, index)?,
    };

    let figcaption = caption_element(
        dom,
        "figcaption",
        Vec::new(),
        &format!("{prefix} {}", record.body),
    )?;
    wrap_in_figure(
        dom,
        &[target],
        figcaption,
        config.position,
        attributes_with_id(&record.attributes, &id),
    );

    references.register_target(&id, &reference, page);
    Ok(())
}
