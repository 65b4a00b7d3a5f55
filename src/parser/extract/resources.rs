//! Sidebar and chapter elements that become study resources.

use std::sync::LazyLock;

use indexmap::map::Entry;
use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use super::images::candidate_images;
use super::{ExtractContext, ImagePolicy};
use crate::output::{Resource, ResourceType};
use crate::parser::books::UNKNOWN_BOOK;
use crate::parser::error::{Diagnostics, ScmlError, Warning};
use crate::parser::refs::RefCodec;
use crate::parser::tree::Element;

/// `<words> <number>`; Bible text when the words name a book, e.g. "1 John 3".
static CHAPTER_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(\d+)$").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const CHAPTER_KEYWORDS: &[&str] = &["introduction", "article", "how to", "overview", "chronology"];
const INTRO_ID_PREFIX: &str = "intro";
const MIN_CHAPTER_CONTENT: usize = 50;
const SLUG_WORDS: usize = 10;

/// Joins the content of resources that share an id.
pub const MERGE_SEPARATOR: &str = " | ";

/// Top-level division the driver is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Division {
    FrontMatter,
    BackMatter,
    Other,
}

impl Division {
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "fm" => Division::FrontMatter,
            "bm" => Division::BackMatter,
            _ => Division::Other,
        }
    }

    fn is_matter(self) -> bool {
        matches!(self, Division::FrontMatter | Division::BackMatter)
    }
}

// ── Classification ──

pub fn classify(element: &Element, division: Option<Division>, codec: &RefCodec) -> Option<ResourceType> {
    match element.tag.as_str() {
        "sidebar" => classify_sidebar(element),
        "chapter" => classify_chapter(element, division, codec),
        _ => None,
    }
}

fn classify_sidebar(element: &Element) -> Option<ResourceType> {
    let id = element.id();
    if id.starts_with("sbc") {
        Some(ResourceType::Chart)
    } else if id.starts_with("sbm") {
        Some(ResourceType::Figure)
    } else {
        None
    }
}

fn classify_chapter(element: &Element, division: Option<Division>, codec: &RefCodec) -> Option<ResourceType> {
    let label = element.attr("semantic").unwrap_or("").trim();
    if is_bible_text(label, codec) {
        return None;
    }

    let label = label.to_lowercase();
    let id = element.id().trim().to_lowercase();
    let intro_id = id.starts_with(INTRO_ID_PREFIX);
    let keyword = CHAPTER_KEYWORDS
        .iter()
        .any(|k| label.contains(k) || id.contains(k));

    if !(keyword || intro_id || division.is_some_and(Division::is_matter)) {
        return None;
    }

    if label.contains("introduction") || intro_id {
        Some(ResourceType::Introduction)
    } else {
        Some(ResourceType::Article)
    }
}

fn is_bible_text(label: &str, codec: &RefCodec) -> bool {
    CHAPTER_LABEL_RE
        .captures(label)
        .and_then(|c| c.get(1))
        .is_some_and(|book| codec.book_number(book.as_str()) != UNKNOWN_BOOK)
}

// ── Extraction ──

/// Resources for an element already classified as `kind`.
///
/// Only a missing image under [`ImagePolicy::Strict`] is an error; every other
/// problem yields fewer resources and a warning.
pub fn extract(
    element: &Element,
    kind: ResourceType,
    ctx: &ExtractContext,
    diag: &mut Diagnostics,
) -> Result<Vec<Resource>, ScmlError> {
    let is_chapter = element.tag == "chapter";
    let title = if is_chapter {
        chapter_title(element)
    } else {
        sidebar_title(element)
    };
    let Some(title) = title else {
        return Ok(Vec::new());
    };

    let mut content = ctx.serializer.serialize(element, diag);
    if is_chapter && content.chars().count() < MIN_CHAPTER_CONTENT {
        debug!("Chapter {:?} too short for a resource", element.id());
        return Ok(Vec::new());
    }
    if content.is_empty() {
        content = title.clone();
    }

    let images = candidate_images(element, ctx.decorative);
    if images.is_empty() {
        let Some(id) = synthesize_id(&title, element.id(), &content) else {
            return Ok(Vec::new());
        };
        return Ok(vec![Resource {
            id,
            title,
            content,
            kind,
        }]);
    }

    let mut out = Vec::with_capacity(images.len());
    for image in images {
        if !ctx.images.contains(&image) {
            let resource = owner_name(element, &title);
            match ctx.policy {
                ImagePolicy::Strict => return Err(ScmlError::MissingImage { resource, image }),
                ImagePolicy::Lenient => {
                    diag.report(Warning::MissingImage { resource, image });
                    continue;
                }
            }
        }
        out.push(Resource {
            id: image,
            title: title.clone(),
            content: content.clone(),
            kind,
        });
    }
    Ok(out)
}

fn owner_name(element: &Element, title: &str) -> String {
    if element.id().is_empty() {
        title.to_string()
    } else {
        element.id().to_string()
    }
}

fn sidebar_title(element: &Element) -> Option<String> {
    let xref_in = |tag: &str| {
        element
            .descendants()
            .filter(|e| e.tag == tag)
            .find_map(|e| e.find("xref").map(Element::text_content).filter(|t| !t.is_empty()))
    };
    xref_in("figh")
        .or_else(|| xref_in("th"))
        .or_else(|| non_empty_text(element, "figh"))
        .or_else(|| Some(element.id().trim().to_string()).filter(|t| !t.is_empty()))
}

fn chapter_title(element: &Element) -> Option<String> {
    ["ctfm", "ah", "inh", "h1", "h2"]
        .iter()
        .find_map(|tag| non_empty_text(element, tag))
        .or_else(|| {
            element
                .attr("semantic")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .or_else(|| Some(element.id().trim().to_string()).filter(|t| !t.is_empty()))
}

fn non_empty_text(element: &Element, tag: &str) -> Option<String> {
    element
        .descendants()
        .filter(|e| e.tag == tag)
        .map(Element::text_content)
        .find(|t| !t.is_empty())
}

/// Id for a resource without images: the title's slug, unless the title is
/// only the element id, then a slug of the opening words of the content.
fn synthesize_id(title: &str, element_id: &str, content: &str) -> Option<String> {
    let from_title = slugify(title);
    if !from_title.is_empty() && title != element_id.trim() {
        return Some(from_title);
    }
    let plain = TAG_RE.replace_all(content, " ");
    let opening: Vec<&str> = plain.split_whitespace().take(SLUG_WORDS).collect();
    let from_content = slugify(&opening.join(" "));
    [from_content, from_title, element_id.trim().to_string()]
        .into_iter()
        .find(|s| !s.is_empty())
}

/// Lowercase, non-alphanumeric runs become one hyphen, no edge hyphens.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

// ── Collection ──

/// Resources keyed by id in first-seen order.
#[derive(Debug, Default)]
pub struct ResourceSet {
    by_id: IndexMap<String, Merged>,
}

/// A resource plus the content fragments already joined into it.
#[derive(Debug)]
struct Merged {
    resource: Resource,
    fragments: Vec<String>,
}

impl ResourceSet {
    /// Insert, or merge into the resource already holding this id. The first
    /// title and type are kept; new content is appended after
    /// [`MERGE_SEPARATOR`] unless it is already present verbatim.
    pub fn insert(&mut self, resource: Resource, diag: &mut Diagnostics) {
        match self.by_id.entry(resource.id.clone()) {
            Entry::Vacant(slot) => {
                debug!("Resource {} ({})", resource.id, resource.kind.as_str());
                let fragments = vec![resource.content.clone()];
                slot.insert(Merged { resource, fragments });
            }
            Entry::Occupied(mut slot) => {
                diag.report(Warning::DuplicateResource {
                    id: resource.id.clone(),
                });
                let existing = slot.get_mut();
                if !existing.fragments.contains(&resource.content) {
                    existing.resource.content.push_str(MERGE_SEPARATOR);
                    existing.resource.content.push_str(&resource.content);
                    existing.fragments.push(resource.content);
                }
            }
        }
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.by_id.into_values().map(|m| m.resource).collect()
    }
}
