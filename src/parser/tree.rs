//! Owned element subtrees for the handful of SCML elements the driver keeps.
//!
//! Only closed `com`, `sidebar` and `chapter` elements are ever materialized.
//! A subtree lives from its start tag to the moment it is dispatched, then it is
//! dropped as a whole.

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Identifier attribute, empty when absent.
    pub fn id(&self) -> &str {
        self.attr("id").unwrap_or("")
    }

    pub fn push_text(&mut self, text: &str) {
        // Adjacent text events (text, then CDATA, then text) merge into one node.
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// First direct child element with the given tag, with its index in `children`.
    pub fn child_with_index(&self, tag: &str) -> Option<(usize, &Element)> {
        self.children.iter().enumerate().find_map(|(i, n)| match n {
            Node::Element(e) if e.tag == tag => Some((i, e)),
            _ => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant with the given tag, in document order.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.descendants().find(|e| e.tag == tag)
    }

    /// Concatenated descendant text with whitespace collapsed.
    pub fn text_content(&self) -> String {
        let mut raw = String::new();
        collect_text(self, &mut raw);
        collapse_whitespace(&raw)
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        while let Some(node) = self.stack.pop() {
            if let Node::Element(e) = node {
                self.stack.extend(e.children.iter().rev());
                return Some(e);
            }
        }
        None
    }
}

/// Collapse every whitespace run to one ASCII space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        let mut inner = Element::new("xref");
        inner.push_text("Flood");
        let mut figh = Element::new("figh");
        figh.children.push(Node::Element(inner));
        figh.push_text(" Chronology");
        let mut root = Element::new("sidebar").with_attr("id", "sbc01");
        root.children.push(Node::Element(figh));
        root.children
            .push(Node::Element(Element::new("img").with_attr("src", "images/a.jpg")));
        root
    }

    #[test]
    fn attributes() {
        let root = sample();
        assert_eq!(root.id(), "sbc01");
        assert_eq!(root.attr("missing"), None);
        assert_eq!(Element::new("com").id(), "");
    }

    #[test]
    fn descendants_in_document_order() {
        let root = sample();
        let tags: Vec<&str> = root.descendants().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["figh", "xref", "img"]);
        assert_eq!(root.find("img").and_then(|e| e.attr("src")), Some("images/a.jpg"));
    }

    #[test]
    fn text_content_is_collapsed() {
        let root = sample();
        assert_eq!(root.text_content(), "Flood Chronology");
    }

    #[test]
    fn adjacent_text_merges() {
        let mut e = Element::new("p");
        e.push_text("a");
        e.push_text("b");
        assert_eq!(e.children, vec![Node::Text("ab".into())]);
    }

    #[test]
    fn collapse_is_idempotent() {
        let once = collapse_whitespace("  a \n\t b  c ");
        assert_eq!(once, "a b c");
        assert_eq!(collapse_whitespace(&once), once);
    }
}
