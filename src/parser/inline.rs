//! Flattens an element subtree into the small HTML-like vocabulary the JSON
//! consumers understand: `<b>`, `<i>` and `<a ref='…'>`.

use super::error::Diagnostics;
use super::refs::RefCodec;
use super::tree::{collapse_whitespace, Element, Node};

/// What an SCML tag becomes in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Bold,
    Italic,
    CrossRef,
    /// Paragraph, table, list and heading structure: text only, space separated.
    Block,
    /// Contributes no text of its own (images).
    Void,
    /// Unrecognized: children are kept, the tag itself is dropped.
    Transparent,
}

pub fn markup_for(tag: &str) -> Markup {
    match tag {
        "b" | "bi" | "strong" => Markup::Bold,
        "i" | "em" => Markup::Italic,
        "xbr" => Markup::CrossRef,
        "p" | "para" | "pf" | "pcon" | "br" | "table" | "tr" | "row" | "td" | "th" | "cell"
        | "tdnl" | "tdul" | "list" | "ul" | "ol" | "li" | "bl" | "blf" | "bll" | "h1" | "h2"
        | "h3" | "ah" | "inh" | "ctfm" | "figh" | "caption" => Markup::Block,
        "img" | "graphic" => Markup::Void,
        _ => Markup::Transparent,
    }
}

pub struct InlineSerializer<'a> {
    codec: RefCodec<'a>,
}

impl<'a> InlineSerializer<'a> {
    pub fn new(codec: RefCodec<'a>) -> Self {
        InlineSerializer { codec }
    }

    /// Serialize the content of `element`; its own tag contributes nothing.
    pub fn serialize(&self, element: &Element, diag: &mut Diagnostics) -> String {
        self.serialize_skipping(element, None, diag)
    }

    /// Like [`serialize`](Self::serialize), leaving out the direct child at
    /// index `skip`. Deeper elements with the same tag are kept.
    pub fn serialize_skipping(&self, element: &Element, skip: Option<usize>, diag: &mut Diagnostics) -> String {
        let mut out = String::new();
        for (i, child) in element.children.iter().enumerate() {
            if Some(i) != skip {
                self.write_node(child, diag, &mut out);
            }
        }
        collapse_whitespace(&out)
    }

    fn write_children(&self, element: &Element, diag: &mut Diagnostics, out: &mut String) {
        for child in &element.children {
            self.write_node(child, diag, out);
        }
    }

    fn write_node(&self, node: &Node, diag: &mut Diagnostics, out: &mut String) {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) => self.write_element(e, diag, out),
        }
    }

    fn write_element(&self, e: &Element, diag: &mut Diagnostics, out: &mut String) {
        match markup_for(&e.tag) {
            Markup::Bold => self.write_wrapped(e, "b", diag, out),
            Markup::Italic => self.write_wrapped(e, "i", diag, out),
            Markup::CrossRef => self.write_cross_ref(e, diag, out),
            Markup::Block => {
                out.push(' ');
                self.write_children(e, diag, out);
                out.push(' ');
            }
            Markup::Void => {}
            Markup::Transparent => self.write_children(e, diag, out),
        }
    }

    /// Whitespace at the edges of a wrapper moves outside the tag so that
    /// `a<b> b </b>c` reads `a <b>b</b> c`.
    fn write_wrapped(&self, e: &Element, tag: &str, diag: &mut Diagnostics, out: &mut String) {
        let mut inner = String::new();
        self.write_children(e, diag, &mut inner);
        let body = collapse_whitespace(&inner);
        let lead = inner.starts_with(char::is_whitespace);
        let trail = inner.ends_with(char::is_whitespace);
        if body.is_empty() {
            if lead || trail {
                out.push(' ');
            }
            return;
        }
        if lead {
            out.push(' ');
        }
        out.push_str(&format!("<{tag}>{body}</{tag}>"));
        if trail {
            out.push(' ');
        }
    }

    fn write_cross_ref(&self, e: &Element, diag: &mut Diagnostics, out: &mut String) {
        let target = e.attr("t").map(str::trim).filter(|t| !t.is_empty());
        let mut display = e.text_content();

        let Some(target) = target else {
            if !display.is_empty() {
                out.push_str(&format!("<a>{}</a>", display));
            }
            return;
        };

        let parsed = self.codec.parse_reported(target, diag);
        if display.is_empty() {
            display = match &parsed {
                Some(p) => self.codec.render(p, true),
                None => target.to_string(),
            };
        }
        let canonical = match &parsed {
            Some(p) => self.codec.render(p, false),
            None => target.to_string(),
        };
        out.push_str(&format!(
            "<a ref='{}'>{}</a>",
            escape_attr(&canonical),
            display
        ));
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\'', "&apos;").replace('"', "&quot;")
}
