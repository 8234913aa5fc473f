//! Reading and replacing the text of a notes page's body placeholder.
//!
//! The notes region is the `p:sp` whose `p:nvPr/p:ph` has `type="body"`.
//! Its text is the concatenation of the `a:t` runs of each `a:p`, with
//! paragraphs joined by `\n` and `a:br` read as `\n`.

use crate::xml::{self, local_name, xml_err};
use deck_core::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

fn is_body_placeholder(e: &BytesStart<'_>) -> bool {
    xml::attr_value(e, b"type").as_deref() == Some("body")
}

/// Text of the notes region, or `None` if the page has no body placeholder.
pub(crate) fn read_notes_text(content: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(content);

    let mut in_shape = false;
    let mut is_body = false;
    let mut in_text_body = false;
    let mut in_text = false;
    let mut paragraphs: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(ref e) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    is_body = false;
                    paragraphs.clear();
                }
                b"ph" if in_shape => is_body = is_body_placeholder(e),
                b"txBody" if in_shape => in_text_body = true,
                b"p" if in_text_body => paragraphs.push(String::new()),
                b"t" if in_text_body => in_text = true,
                _ => {}
            },
            Event::Empty(ref e) => match local_name(e.name().as_ref()) {
                b"ph" if in_shape => is_body = is_body_placeholder(e),
                b"p" if in_text_body => paragraphs.push(String::new()),
                b"br" if in_text_body => {
                    if let Some(last) = paragraphs.last_mut() {
                        last.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(ref e) if in_text => {
                let text = e.unescape().map_err(xml_err)?;
                if let Some(last) = paragraphs.last_mut() {
                    last.push_str(&text);
                }
            }
            Event::End(ref e) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"txBody" => in_text_body = false,
                b"sp" => {
                    if in_shape && is_body {
                        return Ok(Some(paragraphs.join("\n")));
                    }
                    in_shape = false;
                    is_body = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(None)
}

/// Rewrite a notes page so its notes region holds `text`.
///
/// Every `\n`-separated line becomes one paragraph. The text body's
/// `bodyPr` and `lstStyle` are kept, and the first run's properties are
/// reused for the new runs. Returns `None` if the page has no notes region.
pub(crate) fn replace_notes_text(content: &str, text: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::with_capacity(content.len() + text.len()));

    let mut in_shape = false;
    let mut is_body = false;
    let mut in_text_body = false;
    let mut replaced = false;
    let mut skip_depth = 0usize;
    let mut prefix = String::from("a");
    let mut run_props: Option<BytesStart<'static>> = None;

    loop {
        let event = reader.read_event().map_err(xml_err)?;

        // Drop the original paragraphs, remembering the first run properties.
        if skip_depth > 0 {
            match &event {
                Event::Start(e) => {
                    if run_props.is_none() && local_name(e.name().as_ref()) == b"rPr" {
                        run_props = Some(e.clone().into_owned());
                    }
                    skip_depth += 1;
                }
                Event::Empty(e) => {
                    if run_props.is_none() && local_name(e.name().as_ref()) == b"rPr" {
                        run_props = Some(e.clone().into_owned());
                    }
                }
                Event::End(_) => skip_depth -= 1,
                Event::Eof => return Err(xml_err("unexpected end of notes page")),
                _ => {}
            }
            continue;
        }

        let rewriting = in_text_body && is_body && !replaced;

        match &event {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    is_body = false;
                }
                b"ph" if in_shape => is_body = is_body_placeholder(e),
                b"txBody" if in_shape => in_text_body = true,
                b"p" if rewriting => {
                    if let Some(p) = xml::prefix_of(e.name().as_ref()) {
                        prefix = p;
                    }
                    skip_depth = 1;
                    continue;
                }
                _ => {}
            },
            Event::Empty(e) => match local_name(e.name().as_ref()) {
                b"ph" if in_shape => is_body = is_body_placeholder(e),
                b"p" if rewriting => continue,
                b"bodyPr" | b"lstStyle" if rewriting => {
                    if let Some(p) = xml::prefix_of(e.name().as_ref()) {
                        prefix = p;
                    }
                }
                _ => {}
            },
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"txBody" if in_text_body => {
                    if rewriting {
                        write_paragraphs(&mut writer, &prefix, text, run_props.as_ref())?;
                        replaced = true;
                    }
                    in_text_body = false;
                }
                b"sp" => {
                    in_shape = false;
                    is_body = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }

        writer.write_event(event).map_err(xml_err)?;
    }

    if !replaced {
        return Ok(None);
    }
    xml::into_string(writer).map(Some)
}

fn write_paragraphs(
    writer: &mut xml::XmlWriter,
    prefix: &str,
    text: &str,
    run_props: Option<&BytesStart<'static>>,
) -> Result<()> {
    let p = xml::qualified(prefix, "p");
    let r = xml::qualified(prefix, "r");
    let t = xml::qualified(prefix, "t");

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            xml::empty(writer, &p, &[])?;
            continue;
        }

        xml::start(writer, &p, &[])?;
        xml::start(writer, &r, &[])?;
        if let Some(props) = run_props {
            writer
                .write_event(Event::Empty(props.clone()))
                .map_err(xml_err)?;
        }
        xml::start(writer, &t, &[])?;
        xml::text(writer, line)?;
        xml::end(writer, &t)?;
        xml::end(writer, &r)?;
        xml::end(writer, &p)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>Welcome &amp; thanks</a:t></a:r><a:r><a:rPr lang="en-US"/><a:t> for coming.</a:t></a:r></a:p><a:p><a:r><a:t>Line</a:t></a:r><a:br/><a:r><a:t>break</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="4" name="Slide Number Placeholder 3"/><p:cNvSpPr/><p:nvPr><p:ph type="sldNum" idx="5"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>1</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#;

    const NO_BODY: &str = r#"<p:notes xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr></p:sp></p:spTree></p:cSld></p:notes>"#;

    #[test]
    fn test_read_body_placeholder_only() {
        let text = read_notes_text(NOTES).unwrap();
        assert_eq!(text.as_deref(), Some("Welcome & thanks for coming.\nLine\nbreak"));
    }

    #[test]
    fn test_read_without_body_placeholder() {
        assert_eq!(read_notes_text(NO_BODY).unwrap(), None);
    }

    #[test]
    fn test_replace_rewrites_body_only() {
        let out = replace_notes_text(NOTES, "First <line>\n\nThird").unwrap().unwrap();

        assert_eq!(read_notes_text(&out).unwrap().as_deref(), Some("First <line>\n\nThird"));
        assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert!(out.contains("<a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang=\"en-US\" dirty=\"0\"/><a:t>First &lt;line&gt;</a:t></a:r></a:p><a:p/>"));
        // The slide number placeholder is untouched.
        assert!(out.contains("<a:p><a:r><a:t>1</a:t></a:r></a:p>"));
        assert!(!out.contains("Welcome"));
    }

    #[test]
    fn test_replace_is_idempotent() {
        let once = replace_notes_text(NOTES, "Same text").unwrap().unwrap();
        let twice = replace_notes_text(&once, "Same text").unwrap().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_replace_without_body_placeholder() {
        assert_eq!(replace_notes_text(NO_BODY, "x").unwrap(), None);
    }
}
