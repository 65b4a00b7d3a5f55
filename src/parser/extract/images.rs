//! Representative image selection for sidebar and chapter resources.

use std::collections::HashSet;

use crate::parser::tree::Element;

const DECORATIVE_NAMES: &[&str] = &[
    "hcp-rule.jpg",
    "ctorntop.jpg",
    "ctornbottom.jpg",
    "csorn.jpg",
    "hcp-logo.jpg",
    "hcp-esvlogo.jpg",
];
const DECORATIVE_MARKERS: &[&str] = &["-rule.", "logo", "ornament"];
const DECORATIVE_PREFIXES: &[&str] = &["ctorn", "csorn"];

const IMAGE_DIR_PREFIX: &str = "images/";
const IMAGE_EXTENSION: &str = ".jpg";

/// Layout ornamentation that is never a resource's own image.
#[derive(Debug, Clone)]
pub struct DecorativeFilter {
    names: HashSet<String>,
    markers: Vec<String>,
    prefixes: Vec<String>,
}

impl DecorativeFilter {
    pub fn standard() -> Self {
        DecorativeFilter {
            names: DECORATIVE_NAMES.iter().map(|s| s.to_string()).collect(),
            markers: DECORATIVE_MARKERS.iter().map(|s| s.to_string()).collect(),
            prefixes: DECORATIVE_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_decorative(&self, basename: &str) -> bool {
        let name = basename.to_lowercase();
        self.names.contains(&name)
            || self.markers.iter().any(|m| name.contains(m.as_str()))
            || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl Default for DecorativeFilter {
    fn default() -> Self {
        Self::standard()
    }
}

/// Basename of an `images/<name>.jpg` source path, or `None` for any other shape.
pub fn image_basename(src: &str) -> Option<&str> {
    let name = src.trim().strip_prefix(IMAGE_DIR_PREFIX)?;
    let is_jpg = name.len() > IMAGE_EXTENSION.len()
        && name
            .get(name.len() - IMAGE_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
    (is_jpg && !name.contains('/')).then_some(name)
}

/// Non-decorative image basenames under `element`, first occurrence order.
pub fn candidate_images(element: &Element, filter: &DecorativeFilter) -> Vec<String> {
    let mut seen = HashSet::new();
    element
        .descendants()
        .filter(|e| e.tag == "img")
        .filter_map(|e| e.attr("src"))
        .filter_map(image_basename)
        .filter(|name| !filter.is_decorative(name))
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}
