//! Discovery of the slide sequence and each slide's notes page.

use crate::package::Package;
use crate::rels::{self, Relationship};
use crate::xml::{local_name, xml_err};
use deck_core::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// A slide part and the notes page attached to it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlideParts {
    pub slide: String,
    pub notes: Option<String>,
}

/// Resolve every slide, in presentation order, with its notes part.
pub(crate) fn discover_slides(package: &Package) -> Result<Vec<SlideParts>> {
    let order = slide_order(package)?;
    let mut slides = Vec::with_capacity(order.len());

    for slide in order {
        let notes = notes_part_for(package, &slide)?;
        slides.push(SlideParts { slide, notes });
    }

    Ok(slides)
}

/// Get the ordered list of slide parts.
///
/// The order comes from `p:sldIdLst` in `presentation.xml`. Packages without
/// one fall back to sorting the slide relationships by number.
fn slide_order(package: &Package) -> Result<Vec<String>> {
    let rels_path = rels::rels_path_for(PRESENTATION_PART);
    let rels_content = package.read_str(&rels_path)?;
    let slide_rels: Vec<Relationship> = rels::parse_relationships(&rels_content)?
        .into_iter()
        .filter(|r| r.rel_type == rels::SLIDE && !r.external)
        .collect();

    let by_id: HashMap<&str, &Relationship> =
        slide_rels.iter().map(|r| (r.id.as_str(), r)).collect();

    let listed = match package.read_str_opt(PRESENTATION_PART)? {
        Some(content) => slide_id_list(&content)?,
        None => Vec::new(),
    };

    let ordered: Vec<String> = listed
        .iter()
        .filter_map(|id| {
            let rel = by_id.get(id.as_str());
            if rel.is_none() {
                log::warn!("Slide id list references unknown relationship {}", id);
            }
            rel.map(|r| rels::resolve_target(PRESENTATION_PART, &r.target))
        })
        .collect();

    if !ordered.is_empty() {
        return Ok(ordered);
    }

    log::debug!("No slide id list found; ordering slides by relationship number");
    let mut slides: Vec<(String, Option<usize>)> = slide_rels
        .iter()
        .map(|r| {
            let order_num = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
            (rels::resolve_target(PRESENTATION_PART, &r.target), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Relationship ids of `p:sldId` entries, in document order.
fn slide_id_list(content: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                // `id` is the numeric slide id; the prefixed `r:id` is the relationship.
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    (key != b"id" && local_name(key) == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).into_owned())
                });
                if let Some(id) = rel_id {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(format!("Error parsing presentation: {}", e))),
            _ => {}
        }
    }

    Ok(ids)
}

/// The notes page attached to a slide, if the package contains it.
fn notes_part_for(package: &Package, slide: &str) -> Result<Option<String>> {
    let Some(content) = package.read_str_opt(&rels::rels_path_for(slide))? else {
        return Ok(None);
    };

    let notes = rels::parse_relationships(&content)?
        .into_iter()
        .find(|r| r.rel_type == rels::NOTES_SLIDE && !r.external)
        .map(|r| rels::resolve_target(slide, &r.target))
        .filter(|part| {
            let present = package.contains(part);
            if !present {
                log::warn!("{} points at missing notes part {}", slide, part);
            }
            present
        });

    Ok(notes)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
