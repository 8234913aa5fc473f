//! Embedding narration audio into a slide.

use crate::package::Package;
use crate::rels::{self, Relationship};
use crate::xml::{self, local_name, xml_err};
use deck_core::{MediaPlacement, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ICON_PART: &str = "ppt/media/narration_icon.png";
const MEDIA_STEM: &str = "ppt/media/narration";

const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const P14_NS: &str = "http://schemas.microsoft.com/office/powerpoint/2010/main";
const MEDIA_EXT_URI: &str = "{DAA4B4D4-6D71-4841-9C94-3DE7FCFB9230}";

/// EMU per point.
const EMU_PER_POINT: f64 = 12_700.0;

/// A transparent 1x1 PNG used as the poster image of the audio icon.
const ICON_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Relationship ids the new audio shape refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AudioLinks {
    audio: String,
    media: String,
    image: String,
}

fn to_emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round() as i64
}

/// Embed `audio` (MP3 bytes) into `slide_part` at `placement`.
///
/// Every affected part is prepared before any is stored, so a failure
/// leaves the package unchanged.
pub(crate) fn embed_audio(
    package: &mut Package,
    slide_part: &str,
    audio: Vec<u8>,
    placement: &MediaPlacement,
) -> Result<()> {
    let media_part = package.unused_name(MEDIA_STEM, "mp3");
    let media_target = rels::relative_target(slide_part, &media_part);
    let icon_target = rels::relative_target(slide_part, ICON_PART);

    let content_types = ensure_content_defaults(
        &package.read_str(CONTENT_TYPES_PART)?,
        &[("mp3", "audio/mpeg"), ("png", "image/png")],
    )?;

    let rels_part = rels::rels_path_for(slide_part);
    let existing_rels = package.read_str_opt(&rels_part)?;
    let mut known = match &existing_rels {
        Some(content) => rels::parse_relationships(content)?,
        None => Vec::new(),
    };

    let mut added = Vec::with_capacity(3);
    for (rel_type, target) in [
        (rels::AUDIO, media_target.as_str()),
        (rels::MEDIA, media_target.as_str()),
        (rels::IMAGE, icon_target.as_str()),
    ] {
        let rel = Relationship::internal(rels::next_id(&known), rel_type, target);
        known.push(rel.clone());
        added.push(rel);
    }
    let links = AudioLinks {
        audio: added[0].id.clone(),
        media: added[1].id.clone(),
        image: added[2].id.clone(),
    };
    let slide_rels = rels::append_relationships(existing_rels.as_deref(), &added)?;

    let clip_number = media_part
        .trim_start_matches(MEDIA_STEM)
        .trim_end_matches(".mp3")
        .to_string();
    let slide = insert_audio_shape(
        &package.read_str(slide_part)?,
        &format!("Narration {}", clip_number),
        &links,
        placement,
    )?;

    package.put(media_part, audio);
    if !package.contains(ICON_PART) {
        package.put(ICON_PART, ICON_PNG);
    }
    package.put(CONTENT_TYPES_PART, content_types);
    package.put(rels_part, slide_rels);
    package.put(slide_part, slide);
    Ok(())
}

/// Add `<Default>` content types for extensions that have none yet.
fn ensure_content_defaults(content: &str, defaults: &[(&str, &str)]) -> Result<String> {
    let mut existing: Vec<String> = Vec::new();
    {
        let mut reader = Reader::from_str(content);
        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Empty(ref e) | Event::Start(ref e) if local_name(e.name().as_ref()) == b"Default" => {
                    if let Some(ext) = xml::attr_value(e, b"Extension") {
                        existing.push(ext.to_ascii_lowercase());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
    }

    let missing: Vec<&(&str, &str)> = defaults
        .iter()
        .filter(|(ext, _)| !existing.iter().any(|e| e.as_str() == *ext))
        .collect();
    if missing.is_empty() {
        return Ok(content.to_string());
    }

    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::with_capacity(content.len() + 128));
    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match &event {
            Event::End(e) if local_name(e.name().as_ref()) == b"Types" => {
                let prefix = xml::prefix_of(e.name().as_ref()).unwrap_or_default();
                let name = xml::qualified(&prefix, "Default");
                for &&(ext, content_type) in &missing {
                    xml::empty(&mut writer, &name, &[("Extension", ext), ("ContentType", content_type)])?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event).map_err(xml_err)?;
    }

    xml::into_string(writer)
}

/// Highest `cNvPr` id used by any shape on the slide.
fn max_shape_id(content: &str) -> Result<u32> {
    let mut reader = Reader::from_str(content);
    let mut max: u32 = 0;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Empty(ref e) | Event::Start(ref e) if local_name(e.name().as_ref()) == b"cNvPr" => {
                if let Some(id) = xml::attr_value(e, b"id").and_then(|v| v.parse::<u32>().ok()) {
                    max = max.max(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(max)
}

/// Append an audio `p:pic` to the end of the slide's shape tree.
fn insert_audio_shape(
    content: &str,
    name: &str,
    links: &AudioLinks,
    placement: &MediaPlacement,
) -> Result<String> {
    let shape_id = max_shape_id(content)? + 1;
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::with_capacity(content.len() + 1024));
    let mut inserted = false;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match &event {
            Event::End(e) if !inserted && local_name(e.name().as_ref()) == b"spTree" => {
                let prefix = xml::prefix_of(e.name().as_ref()).unwrap_or_default();
                write_audio_shape(&mut writer, &prefix, shape_id, name, links, placement)?;
                inserted = true;
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event).map_err(xml_err)?;
    }

    if !inserted {
        return Err(xml_err("slide has no shape tree"));
    }
    xml::into_string(writer)
}

fn write_audio_shape(
    w: &mut xml::XmlWriter,
    prefix: &str,
    shape_id: u32,
    name: &str,
    links: &AudioLinks,
    placement: &MediaPlacement,
) -> Result<()> {
    let p = |local: &str| xml::qualified(prefix, local);
    let id = shape_id.to_string();
    let x = to_emu(placement.left).to_string();
    let y = to_emu(placement.top).to_string();
    let cx = to_emu(placement.width).to_string();
    let cy = to_emu(placement.height).to_string();

    xml::start(w, &p("pic"), &[("xmlns:a", DRAWING_NS), ("xmlns:r", RELATIONSHIPS_NS)])?;

    xml::start(w, &p("nvPicPr"), &[])?;
    xml::start(w, &p("cNvPr"), &[("id", id.as_str()), ("name", name)])?;
    xml::empty(w, "a:hlinkClick", &[("r:id", ""), ("action", "ppaction://media")])?;
    xml::end(w, &p("cNvPr"))?;
    xml::start(w, &p("cNvPicPr"), &[])?;
    xml::empty(w, "a:picLocks", &[("noChangeAspect", "1")])?;
    xml::end(w, &p("cNvPicPr"))?;
    xml::start(w, &p("nvPr"), &[])?;
    xml::empty(w, "a:audioFile", &[("r:link", links.audio.as_str())])?;
    xml::start(w, &p("extLst"), &[])?;
    xml::start(w, &p("ext"), &[("uri", MEDIA_EXT_URI)])?;
    xml::empty(w, "p14:media", &[("xmlns:p14", P14_NS), ("r:embed", links.media.as_str())])?;
    xml::end(w, &p("ext"))?;
    xml::end(w, &p("extLst"))?;
    xml::end(w, &p("nvPr"))?;
    xml::end(w, &p("nvPicPr"))?;

    xml::start(w, &p("blipFill"), &[])?;
    xml::empty(w, "a:blip", &[("r:embed", links.image.as_str())])?;
    xml::start(w, "a:stretch", &[])?;
    xml::empty(w, "a:fillRect", &[])?;
    xml::end(w, "a:stretch")?;
    xml::end(w, &p("blipFill"))?;

    xml::start(w, &p("spPr"), &[])?;
    xml::start(w, "a:xfrm", &[])?;
    xml::empty(w, "a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    xml::empty(w, "a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml::end(w, "a:xfrm")?;
    xml::start(w, "a:prstGeom", &[("prst", "rect")])?;
    xml::empty(w, "a:avLst", &[])?;
    xml::end(w, "a:prstGeom")?;
    xml::end(w, &p("spPr"))?;

    xml::end(w, &p("pic"))
}
