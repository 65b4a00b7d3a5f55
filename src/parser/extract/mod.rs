pub mod images;
pub mod notes;
pub mod resources;

use std::collections::HashSet;

use super::books::BookTable;
use super::inline::InlineSerializer;
use super::refs::RefCodec;
use images::DecorativeFilter;

/// Answers whether an image basename exists where the translation's images live.
pub trait ImageSource {
    fn contains(&self, basename: &str) -> bool;
}

impl ImageSource for HashSet<String> {
    fn contains(&self, basename: &str) -> bool {
        HashSet::contains(self, basename)
    }
}

/// What to do with a resource instance whose image is not on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Drop the instance and warn.
    #[default]
    Lenient,
    /// Fail the translation.
    Strict,
}

/// Read-only collaborators shared by every extractor of one translation.
pub struct ExtractContext<'a> {
    pub codec: RefCodec<'a>,
    pub serializer: InlineSerializer<'a>,
    pub decorative: &'a DecorativeFilter,
    pub images: &'a dyn ImageSource,
    pub policy: ImagePolicy,
}

impl<'a> ExtractContext<'a> {
    pub fn new(
        books: &'a BookTable,
        decorative: &'a DecorativeFilter,
        images: &'a dyn ImageSource,
        policy: ImagePolicy,
    ) -> Self {
        let codec = RefCodec::new(books);
        ExtractContext {
            codec,
            serializer: InlineSerializer::new(codec),
            decorative,
            images,
            policy,
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ResourceType;
    use crate::parser::error::{Diagnostics, Warning};
    use crate::parser::stream::{Driver, Extraction};

    fn run(fixture: &str, images: &[&str], policy: ImagePolicy) -> (Extraction, Diagnostics) {
        let path = format!("tests/fixtures/{}.scml", fixture);
        let file = std::fs::File::open(&path).unwrap();
        let books = BookTable::standard();
        let decorative = DecorativeFilter::standard();
        let on_disk: HashSet<String> = images.iter().map(|s| s.to_string()).collect();
        let ctx = ExtractContext::new(&books, &decorative, &on_disk, policy);
        let mut diag = Diagnostics::new();
        let extraction = Driver::new(&ctx)
            .run(std::io::BufReader::new(file), &mut diag)
            .unwrap();
        (extraction, diag)
    }

    const GENESIS_IMAGES: &[&str] = &["foo-fig1.jpg", "eden-map.jpg", "eden-map-detail.jpg"];

    #[test]
    fn genesis_notes() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let first = &x.notes[0];
        assert_eq!(first.start, 1_001_001);
        assert_eq!(first.end, None);
        assert_eq!(
            first.content,
            "<b><a>Gen. 1:1</a></b> <b>Moses</b> wrote this."
        );

        let ranged = x.notes.iter().find(|n| n.start == 1_001_003).unwrap();
        assert_eq!(ranged.end, Some(1_001_005));

        assert!(x.notes.windows(2).all(|w| w[0].start <= w[1].start));
        assert!(x.notes.iter().all(|n| n.end.map_or(true, |e| e > n.start)));
        assert!(x.notes.iter().all(|n| !n.content.is_empty()));
    }

    #[test]
    fn genesis_note_order_is_stable() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let same: Vec<&str> = x
            .notes
            .iter()
            .filter(|n| n.start == 1_002_004)
            .map(|n| n.content.as_str())
            .collect();
        assert_eq!(same.len(), 2);
        assert!(same[0].contains("first of two"));
        assert!(same[1].contains("second of two"));
    }

    #[test]
    fn genesis_inline_cross_reference() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let n = x.notes.iter().find(|n| n.start == 1_002_004).unwrap();
        assert!(n.content.contains("<a ref='Exodus 20:11'>Ex. 20:11</a>"));
    }

    #[test]
    fn genesis_chart_resource() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let chart = x.resources.iter().find(|r| r.id == "foo-fig1.jpg").unwrap();
        assert_eq!(chart.title, "Flood Chronology");
        assert_eq!(chart.kind, ResourceType::Chart);
        assert!(!chart.content.is_empty());
    }

    #[test]
    fn genesis_map_with_two_images() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let maps: Vec<_> = x
            .resources
            .iter()
            .filter(|r| r.title == "The Garden of Eden")
            .collect();
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].id, "eden-map.jpg");
        assert_eq!(maps[1].id, "eden-map-detail.jpg");
        assert_eq!(maps[0].content, maps[1].content);
        assert!(maps.iter().all(|r| r.kind == ResourceType::Figure));
    }

    #[test]
    fn genesis_introduction_chapter() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let intro = x
            .resources
            .iter()
            .find(|r| r.id == "how-to-use-this-study-bible")
            .unwrap();
        assert_eq!(intro.kind, ResourceType::Introduction);
        assert_eq!(intro.title, "How to Use This Study Bible");
    }

    #[test]
    fn genesis_excludes_bible_text_and_decoration() {
        let (x, _) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let decorative = DecorativeFilter::standard();
        assert!(x.resources.iter().all(|r| !decorative.is_decorative(&r.id)));
        assert!(x.resources.iter().all(|r| r.title != "Genesis 1"));
        assert!(x.images.iter().all(|i| !decorative.is_decorative(i)));
    }

    #[test]
    fn genesis_ids_unique_and_duplicates_merged() {
        let (x, diag) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        let ids: HashSet<&str> = x.resources.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), x.resources.len());

        let chart = x.resources.iter().find(|r| r.id == "foo-fig1.jpg").unwrap();
        assert!(chart.content.contains("Noah enters the ark"));
        assert!(chart.content.contains(" | "));
        assert!(chart.content.contains("Waters recede"));
        assert!(diag
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::DuplicateResource { id } if id == "foo-fig1.jpg")));
    }

    #[test]
    fn genesis_recoverable_problems_are_reported() {
        let (x, diag) = run("genesis", GENESIS_IMAGES, ImagePolicy::Lenient);
        assert!(diag
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::MissingIdentifierDigits { .. })));
        assert!(diag
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::UnknownBook { token, .. } if token == "Enoch")));
        // The note with the unknown book reference is still emitted.
        assert!(x.notes.iter().any(|n| n.content.contains("Enoch")));
    }

    #[test]
    fn missing_image_dropped_when_lenient() {
        let (x, diag) = run("genesis", &["foo-fig1.jpg", "eden-map.jpg"], ImagePolicy::Lenient);
        assert!(x.resources.iter().all(|r| r.id != "eden-map-detail.jpg"));
        assert!(x.resources.iter().any(|r| r.id == "eden-map.jpg"));
        assert!(diag
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::MissingImage { image, .. } if image == "eden-map-detail.jpg")));
    }

    #[test]
    fn missing_image_fails_when_strict() {
        let path = "tests/fixtures/genesis.scml";
        let file = std::fs::File::open(path).unwrap();
        let books = BookTable::standard();
        let decorative = DecorativeFilter::standard();
        let on_disk: HashSet<String> = HashSet::new();
        let ctx = ExtractContext::new(&books, &decorative, &on_disk, ImagePolicy::Strict);
        let mut diag = Diagnostics::new();
        let result = Driver::new(&ctx).run(std::io::BufReader::new(file), &mut diag);
        assert!(matches!(
            result,
            Err(crate::parser::error::ScmlError::MissingImage { .. })
        ));
    }
}
