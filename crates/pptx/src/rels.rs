//! Package relationships (`_rels/*.rels`) and part-name resolution.

use crate::xml::{self, xml_err};
use deck_core::Result;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

pub(crate) const SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub(crate) const AUDIO: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/audio";
pub(crate) const IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const MEDIA: &str = "http://schemas.microsoft.com/office/2007/relationships/media";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// One `<Relationship>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub fn internal(id: impl Into<String>, rel_type: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        }
    }
}

/// Parse every relationship of a `.rels` part.
pub(crate) fn parse_relationships(content: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if xml::local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship::internal(String::new(), "", String::new());

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"Id" => rel.id = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }

                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(xml_err(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Path of the relationships part belonging to `part`.
///
/// `ppt/slides/slide1.xml` becomes `ppt/slides/_rels/slide1.xml.rels`.
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(pos) => format!("{}/_rels/{}.rels", &part[..pos], &part[pos + 1..]),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rfind('/') {
        Some(pos) => source_part[..pos].split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

/// Relative target from `source_part` to `target_part`, both package paths.
pub(crate) fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = match source_part.rfind('/') {
        Some(pos) => source_part[..pos].split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();

    let common = source_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; source_dir.len() - common];
    parts.extend(&target[common..]);
    parts.join("/")
}

/// Next free `rIdN` given the existing relationships.
pub(crate) fn next_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// Append relationships to an existing `.rels` part, or create a new one.
pub(crate) fn append_relationships(existing: Option<&str>, added: &[Relationship]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    let Some(content) = existing else {
        writer
            .write_event(Event::Decl(quick_xml::events::BytesDecl::new(
                "1.0",
                Some("UTF-8"),
                Some("yes"),
            )))
            .map_err(xml_err)?;
        xml::start(&mut writer, "Relationships", &[("xmlns", RELATIONSHIPS_NS)])?;
        write_relationships(&mut writer, "", added)?;
        xml::end(&mut writer, "Relationships")?;
        return xml::into_string(writer);
    };

    let mut reader = Reader::from_str(content);
    let mut appended = false;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match &event {
            Event::End(e) if xml::local_name(e.name().as_ref()) == b"Relationships" && !appended => {
                let prefix = xml::prefix_of(e.name().as_ref()).unwrap_or_default();
                write_relationships(&mut writer, &prefix, added)?;
                appended = true;
            }
            Event::Empty(e) if xml::local_name(e.name().as_ref()) == b"Relationships" && !appended => {
                // `<Relationships/>`: reopen it so the new entries fit inside.
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let prefix = xml::prefix_of(e.name().as_ref()).unwrap_or_default();
                writer
                    .write_event(Event::Start(e.clone()))
                    .map_err(xml_err)?;
                write_relationships(&mut writer, &prefix, added)?;
                xml::end(&mut writer, &name)?;
                appended = true;
                continue;
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event).map_err(xml_err)?;
    }

    if !appended {
        return Err(xml_err("relationships part has no <Relationships> root"));
    }
    xml::into_string(writer)
}

fn write_relationships(writer: &mut xml::XmlWriter, prefix: &str, rels: &[Relationship]) -> Result<()> {
    let name = xml::qualified(prefix, "Relationship");
    for rel in rels {
        let mut attrs = vec![
            ("Id", rel.id.as_str()),
            ("Type", rel.rel_type.as_str()),
            ("Target", rel.target.as_str()),
        ];
        if rel.external {
            attrs.push(("TargetMode", "External"));
        }
        xml::empty(writer, &name, &attrs)?;
    }
    Ok(())
}
