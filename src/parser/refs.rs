//! Verse references: "Book C:V", "Book C:V-V2" and "Book C:V-C2:V2".
//!
//! A reference is reduced to the canonical `BBCCCVVV` integer so notes can be
//! ordered and ranges compared without any knowledge of book names.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::books::{BookInfo, BookTable, UNKNOWN_BOOK};
use super::error::{Diagnostics, Warning};

static REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*((?:[1-3]\s*)?[A-Za-z]+(?:\s+of\s+[A-Za-z]+)?)\.?\s*(\d+)\s*:\s*(\d+)(?:\s*-\s*(\d+)(?:\s*:\s*(\d+))?)?",
    )
    .unwrap()
});

/// Dash characters accepted as a range separator besides the ASCII hyphen.
const RANGE_DASHES: &[char] = &['\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}'];

const MAX_COMPONENT: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    #[error("no reference grammar matches {0:?}")]
    Unparseable(String),
    #[error("chapter or verse wider than three digits in {0:?}")]
    OutOfRange(String),
    #[error("range end precedes its start in {0:?}")]
    Reversed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseRef {
    pub book: u8,
    pub chapter: u16,
    pub verse: u16,
}

impl VerseRef {
    /// Returns `None` when chapter or verse does not fit in three digits.
    pub fn new(book: u8, chapter: u32, verse: u32) -> Option<Self> {
        if chapter > MAX_COMPONENT || verse > MAX_COMPONENT {
            return None;
        }
        Some(VerseRef {
            book,
            chapter: chapter as u16,
            verse: verse as u16,
        })
    }

    pub fn to_int(self) -> u32 {
        self.book as u32 * 1_000_000 + self.chapter as u32 * 1_000 + self.verse as u32
    }

    pub fn from_int(value: u32) -> Option<Self> {
        let book = value / 1_000_000;
        if book > 99 {
            return None;
        }
        VerseRef::new(book as u8, (value / 1_000) % 1_000, value % 1_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRange {
    pub start: VerseRef,
    /// Always strictly after `start`; a one-verse range carries no end.
    pub end: Option<VerseRef>,
}

impl VerseRange {
    pub fn point(start: VerseRef) -> Self {
        VerseRange { start, end: None }
    }

    pub fn new(start: VerseRef, end: VerseRef) -> Option<Self> {
        match end.to_int().cmp(&start.to_int()) {
            std::cmp::Ordering::Less => None,
            std::cmp::Ordering::Equal => Some(VerseRange::point(start)),
            std::cmp::Ordering::Greater => Some(VerseRange {
                start,
                end: Some(end),
            }),
        }
    }

    pub fn start_int(&self) -> u32 {
        self.start.to_int()
    }

    pub fn end_int(&self) -> Option<u32> {
        self.end.map(VerseRef::to_int)
    }
}

/// A parsed reference together with the book token as written, which is the
/// only name available when the book is not in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRef {
    pub range: VerseRange,
    pub book_token: String,
}

impl ParsedRef {
    pub fn is_known_book(&self) -> bool {
        self.range.start.book != UNKNOWN_BOOK
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefCodec<'a> {
    books: &'a BookTable,
}

impl<'a> RefCodec<'a> {
    pub fn new(books: &'a BookTable) -> Self {
        RefCodec { books }
    }

    pub fn book_number(&self, name_or_abbr: &str) -> u8 {
        self.books.book_number(name_or_abbr)
    }

    pub fn parse_ref(&self, text: &str) -> Result<ParsedRef, RefError> {
        let normalized: String = text
            .chars()
            .map(|c| if RANGE_DASHES.contains(&c) { '-' } else { c })
            .collect();
        let caps = REF_RE
            .captures(&normalized)
            .ok_or_else(|| RefError::Unparseable(text.to_string()))?;

        let book_token = caps[1].trim().to_string();
        let book = self.books.book_number(&book_token);
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let out_of_range = || RefError::OutOfRange(text.to_string());

        let (chapter, verse) = match (number(2), number(3)) {
            (Some(c), Some(v)) => (c, v),
            _ => return Err(out_of_range()),
        };
        let start = VerseRef::new(book, chapter, verse).ok_or_else(out_of_range)?;

        let end = match (number(4), number(5)) {
            (Some(end_chapter), Some(end_verse)) => {
                Some(VerseRef::new(book, end_chapter, end_verse).ok_or_else(out_of_range)?)
            }
            (Some(end_verse), None) => {
                Some(VerseRef::new(book, chapter, end_verse).ok_or_else(out_of_range)?)
            }
            _ => None,
        };

        let range = match end {
            Some(end) => {
                VerseRange::new(start, end).ok_or_else(|| RefError::Reversed(text.to_string()))?
            }
            None => VerseRange::point(start),
        };

        Ok(ParsedRef { range, book_token })
    }

    /// [`parse_ref`](Self::parse_ref) with failures and unknown books
    /// reported as warnings instead of returned.
    pub fn parse_reported(&self, text: &str, diag: &mut Diagnostics) -> Option<ParsedRef> {
        match self.parse_ref(text) {
            Ok(parsed) => {
                if !parsed.is_known_book() {
                    diag.report(Warning::UnknownBook {
                        token: parsed.book_token.clone(),
                        text: text.to_string(),
                    });
                }
                Some(parsed)
            }
            Err(_) => {
                diag.report(Warning::UnparseableReference {
                    text: text.to_string(),
                });
                None
            }
        }
    }

    /// Render a numeric range as "Book C:V", "Book C:V-V2" or "Book C:V-C2:V2".
    pub fn format_display(&self, range: &VerseRange, abbreviated: bool) -> String {
        let name = self
            .books
            .by_number(range.start.book)
            .map(|b| book_name(b, abbreviated))
            .unwrap_or("Unknown");
        format_with_name(name, range)
    }

    /// Like [`format_display`](Self::format_display), but an unknown book keeps
    /// the spelling it was written with.
    pub fn render(&self, parsed: &ParsedRef, abbreviated: bool) -> String {
        if parsed.is_known_book() {
            self.format_display(&parsed.range, abbreviated)
        } else {
            format_with_name(&parsed.book_token, &parsed.range)
        }
    }
}

fn book_name(info: &BookInfo, abbreviated: bool) -> &'static str {
    if abbreviated {
        info.short
    } else {
        info.full
    }
}

fn format_with_name(name: &str, range: &VerseRange) -> String {
    let start = range.start;
    match range.end {
        None => format!("{} {}:{}", name, start.chapter, start.verse),
        Some(end) if end.chapter == start.chapter => {
            format!("{} {}:{}-{}", name, start.chapter, start.verse, end.verse)
        }
        Some(end) => format!(
            "{} {}:{}-{}:{}",
            name, start.chapter, start.verse, end.chapter, end.verse
        ),
    }
}
