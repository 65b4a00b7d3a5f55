use std::sync::LazyLock;

use regex::Regex;

use super::ExtractContext;
use crate::output::Note;
use crate::parser::error::{Diagnostics, Warning};
use crate::parser::tree::{collapse_whitespace, Element};

/// `com01001004a` carries verse 1001004; a trailing letter marks a second note
/// on the same verse.
static NOTE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^com(\d+)").unwrap());

const HEADER_TAG: &str = "bcv";

pub fn extract(com: &Element, ctx: &ExtractContext, diag: &mut Diagnostics) -> Option<Note> {
    let start = match start_from_id(com.id()) {
        Ok(start) => start,
        Err(warning) => {
            diag.report(warning);
            return None;
        }
    };

    // Only the first top-level bcv is the header; later ones are verse markers.
    let bcv = com.child_with_index(HEADER_TAG);
    let header_at = bcv.map(|(i, _)| i);
    let header = bcv.and_then(|(_, e)| e.find("xbr"));

    let mut end = None;
    let mut display = String::new();
    if let Some(xbr) = header {
        display = xbr.text_content();
        if let Some(t) = xbr.attr("t").map(str::trim).filter(|t| !t.is_empty()) {
            let parsed = ctx.codec.parse_reported(t, diag);
            if let Some(p) = &parsed {
                end = p.range.end_int().filter(|&e| e > start);
            }
            if display.is_empty() {
                display = match &parsed {
                    Some(p) => ctx.codec.render(p, true),
                    None => t.to_string(),
                };
            }
        }
    }

    let body = ctx.serializer.serialize_skipping(com, header_at, diag);
    let content = if display.is_empty() {
        body
    } else {
        collapse_whitespace(&format!("<b><a>{}</a></b> {}", display, body))
    };

    if content.is_empty() {
        diag.report(Warning::EmptyNote {
            id: com.id().to_string(),
        });
        return None;
    }

    Some(Note {
        start,
        end,
        content,
    })
}

fn start_from_id(id: &str) -> Result<u32, Warning> {
    let Some(digits) = NOTE_ID_RE.captures(id).and_then(|c| c.get(1)) else {
        return Err(Warning::MissingIdentifierDigits { id: id.to_string() });
    };
    digits
        .as_str()
        .parse()
        .map_err(|_| Warning::IdentifierOutOfRange { id: id.to_string() })
}
