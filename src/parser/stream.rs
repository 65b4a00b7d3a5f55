//! Single pass over an SCML byte stream.
//!
//! Nothing is kept outside a `com`, `sidebar` or `chapter` element. Inside one,
//! the subtree is built until its end tag, handed to an extractor and dropped.
//! A note or sidebar nested in a chapter is dispatched on its own and never
//! becomes part of the chapter's content.

use std::io::BufRead;

use indexmap::IndexSet;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::{Diagnostics, ScmlError, Warning};
use super::extract::images::candidate_images;
use super::extract::resources::{self, Division, ResourceSet};
use super::extract::{notes, ExtractContext};
use super::tree::{Element, Node};
use crate::output::{Note, Resource};

const CAPTURED: &[&str] = &["com", "sidebar", "chapter"];

fn is_captured(tag: &str) -> bool {
    CAPTURED.contains(&tag)
}

/// Everything one translation yields, in output order.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Sorted by `start`, document order among equal starts.
    pub notes: Vec<Note>,
    /// First-seen order of resource ids.
    pub resources: Vec<Resource>,
    /// Image basenames backing emitted resources.
    pub images: Vec<String>,
}

#[derive(Default)]
struct Collected {
    notes: Vec<Note>,
    resources: ResourceSet,
    images: IndexSet<String>,
}

pub struct Driver<'c, 'a> {
    ctx: &'c ExtractContext<'a>,
}

impl<'c, 'a> Driver<'c, 'a> {
    pub fn new(ctx: &'c ExtractContext<'a>) -> Self {
        Driver { ctx }
    }

    pub fn run<R: BufRead>(&self, source: R, diag: &mut Diagnostics) -> Result<Extraction, ScmlError> {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::new();
        let mut collected = Collected::default();

        // Captured elements still being built, innermost last.
        let mut depth = 0usize;
        let mut open: Vec<Element> = Vec::new();
        let mut division: Option<(Division, usize)> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| match e {
                    quick_xml::Error::Io(io) => {
                        ScmlError::Io(std::io::Error::new(io.kind(), io.to_string()))
                    }
                    other => ScmlError::MalformedMarkup {
                        position: reader.error_position() as u64,
                        message: other.to_string(),
                    },
                })?;

            match event {
                Event::Start(e) => {
                    depth += 1;
                    let element = start_element(&e, position, diag);
                    if element.tag == "division" {
                        division = Some((Division::from_id(element.id()), depth));
                    }
                    if !open.is_empty() || is_captured(&element.tag) {
                        open.push(element);
                    }
                }
                Event::Empty(e) => {
                    let element = start_element(&e, position, diag);
                    if is_captured(&element.tag) {
                        self.dispatch(element, division.map(|d| d.0), &mut collected, diag)?;
                    } else if let Some(parent) = open.last_mut() {
                        parent.children.push(Node::Element(element));
                    }
                }
                Event::End(_) => {
                    if depth == 0 {
                        return Err(ScmlError::MalformedMarkup {
                            position,
                            message: "end tag without a matching start tag".to_string(),
                        });
                    }
                    if division.is_some_and(|(_, at)| at == depth) {
                        division = None;
                    }
                    depth -= 1;

                    if let Some(done) = open.pop() {
                        match open.last_mut() {
                            Some(parent) if !is_captured(&done.tag) => {
                                parent.children.push(Node::Element(done));
                            }
                            _ => self.dispatch(done, division.map(|d| d.0), &mut collected, diag)?,
                        }
                    }
                }
                Event::Text(t) => {
                    if let Some(top) = open.last_mut() {
                        match t.unescape() {
                            Ok(text) => top.push_text(&text),
                            Err(_) => {
                                diag.report(Warning::UndecodableText { position });
                                top.push_text(&String::from_utf8_lossy(&t));
                            }
                        }
                    }
                }
                Event::CData(c) => {
                    if let Some(top) = open.last_mut() {
                        top.push_text(&String::from_utf8_lossy(&c));
                    }
                }
                Event::Eof => {
                    if depth != 0 {
                        return Err(ScmlError::MalformedMarkup {
                            position,
                            message: format!("input ended with {} unclosed element(s)", depth),
                        });
                    }
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        let mut notes = collected.notes;
        notes.sort_by_key(|n| n.start);
        Ok(Extraction {
            notes,
            resources: collected.resources.into_vec(),
            images: collected.images.into_iter().collect(),
        })
    }

    /// Hand a closed element to its extractor. The element is consumed and
    /// dropped on return.
    fn dispatch(
        &self,
        element: Element,
        division: Option<Division>,
        collected: &mut Collected,
        diag: &mut Diagnostics,
    ) -> Result<(), ScmlError> {
        if element.tag == "com" {
            if let Some(note) = notes::extract(&element, self.ctx, diag) {
                collected.notes.push(note);
            }
            return Ok(());
        }

        let Some(kind) = resources::classify(&element, division, &self.ctx.codec) else {
            return Ok(());
        };
        let produced = resources::extract(&element, kind, self.ctx, diag)?;
        for image in candidate_images(&element, self.ctx.decorative) {
            if produced.iter().any(|r| r.id == image) {
                collected.images.insert(image);
            }
        }
        for resource in produced {
            collected.resources.insert(resource, diag);
        }
        Ok(())
    }
}

fn start_element(e: &BytesStart, position: u64, diag: &mut Diagnostics) -> Element {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => {
                diag.report(Warning::UndecodableText { position });
                String::from_utf8_lossy(&attr.value).into_owned()
            }
        };
        element = element.with_attr(key, value);
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::parser::books::BookTable;
    use crate::parser::extract::images::DecorativeFilter;
    use crate::parser::extract::ImagePolicy;

    fn run(xml: &str) -> (Result<Extraction, ScmlError>, Diagnostics) {
        let books = BookTable::standard();
        let decorative = DecorativeFilter::standard();
        let disk: HashSet<String> = ["a.jpg".to_string()].into_iter().collect();
        let ctx = ExtractContext::new(&books, &decorative, &disk, ImagePolicy::Lenient);
        let mut diag = Diagnostics::new();
        let result = Driver::new(&ctx).run(xml.as_bytes(), &mut diag);
        (result, diag)
    }

    #[test]
    fn notes_sorted_stably() {
        let xml = r#"<scml><book>
            <com id="com01001002">second verse</com>
            <com id="com01001001">first</com>
            <com id="com01001001a">first again</com>
        </book></scml>"#;
        let notes = run(xml).0.unwrap().notes;
        let contents: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "first again", "second verse"]);
    }

    #[test]
    fn nested_note_is_not_part_of_chapter() {
        let xml = r#"<scml><chapter id="ch01" semantic="Genesis 1">
            <p>In the beginning</p>
            <com id="com01001001">note text</com>
        </chapter></scml>"#;
        let x = run(xml).0.unwrap();
        assert_eq!(x.notes.len(), 1);
        assert_eq!(x.notes[0].content, "note text");
        assert!(x.resources.is_empty());
    }

    #[test]
    fn entities_and_cdata_become_text() {
        let xml = r#"<scml><com id="com01001001">A &amp; B <![CDATA[<raw>]]></com></scml>"#;
        let notes = run(xml).0.unwrap().notes;
        assert_eq!(notes[0].content, "A & B <raw>");
    }

    #[test]
    fn unknown_entity_kept_raw_with_warning() {
        let xml = r#"<scml><com id="com01001001">a&nbsp;b</com></scml>"#;
        let (result, diag) = run(xml);
        assert_eq!(result.unwrap().notes[0].content, "a&nbsp;b");
        assert!(matches!(diag.warnings()[0], Warning::UndecodableText { .. }));
    }

    #[test]
    fn division_scopes_matter_chapters() {
        let body = "Abbreviations used throughout the notes and articles of this edition are listed here.";
        let xml = format!(
            r#"<scml>
            <division id="bm"><chapter id="ch90" semantic="Abbreviations"><p>{body}</p></chapter></division>
            <division id="ot"><chapter id="ch91" semantic="Abbreviations"><p>{body}</p></chapter></division>
            </scml>"#
        );
        let resources = run(&xml).0.unwrap().resources;
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].id, "abbreviations");
    }

    #[test]
    fn referenced_images_only_for_emitted_resources() {
        let xml = r#"<scml>
            <sidebar id="sbm01"><figh>Map</figh><img src="images/a.jpg"/><img src="images/b.jpg"/></sidebar>
            <sidebar id="sbx01"><img src="images/c.jpg"/></sidebar>
        </scml>"#;
        let (result, _) = run(xml);
        assert_eq!(result.unwrap().images, vec!["a.jpg"]);
    }

    #[test]
    fn malformed_markup_is_fatal() {
        assert!(matches!(
            run("<scml><com id=\"com01001001\">x</p></scml>").0,
            Err(ScmlError::MalformedMarkup { .. })
        ));
        assert!(matches!(
            run("<scml><com id=\"com01001001\">x").0,
            Err(ScmlError::MalformedMarkup { .. })
        ));
    }
}
