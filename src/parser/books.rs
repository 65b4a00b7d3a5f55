use std::collections::HashMap;

/// Reserved book number for tokens missing from the table.
pub const UNKNOWN_BOOK: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookInfo {
    pub number: u8,
    /// Abbreviated display form, e.g. "Gen."
    pub short: &'static str,
    pub full: &'static str,
    pub aliases: &'static [&'static str],
}

const fn book(
    number: u8,
    short: &'static str,
    full: &'static str,
    aliases: &'static [&'static str],
) -> BookInfo {
    BookInfo { number, short, full, aliases }
}

const BOOKS: &[BookInfo] = &[
    book(1, "Gen.", "Genesis", &["Ge", "Gen", "Gn"]),
    book(2, "Ex.", "Exodus", &["Ex", "Exo", "Exod"]),
    book(3, "Lev.", "Leviticus", &["Le", "Lev", "Lv"]),
    book(4, "Num.", "Numbers", &["Nu", "Num", "Nm"]),
    book(5, "Deut.", "Deuteronomy", &["De", "Dt", "Deut"]),
    book(6, "Josh.", "Joshua", &["Jos", "Josh"]),
    book(7, "Judg.", "Judges", &["Jdg", "Judg"]),
    book(8, "Ruth", "Ruth", &["Ru", "Ruth"]),
    book(9, "1 Sam.", "1 Samuel", &["1Sa", "1 Sam", "1Sam"]),
    book(10, "2 Sam.", "2 Samuel", &["2Sa", "2 Sam", "2Sam"]),
    book(11, "1 Kings", "1 Kings", &["1Ki", "1 Kin", "1Kgs"]),
    book(12, "2 Kings", "2 Kings", &["2Ki", "2 Kin", "2Kgs"]),
    book(13, "1 Chron.", "1 Chronicles", &["1Ch", "1 Chr", "1 Chron"]),
    book(14, "2 Chron.", "2 Chronicles", &["2Ch", "2 Chr", "2 Chron"]),
    book(15, "Ezra", "Ezra", &["Ezr"]),
    book(16, "Neh.", "Nehemiah", &["Ne", "Neh"]),
    book(17, "Est.", "Esther", &["Est", "Esth"]),
    book(18, "Job", "Job", &["Jb"]),
    book(19, "Ps.", "Psalms", &["Ps", "Psa", "Pss", "Psalm"]),
    book(20, "Prov.", "Proverbs", &["Pr", "Prov"]),
    book(21, "Eccl.", "Ecclesiastes", &["Ec", "Eccl", "Eccles"]),
    book(22, "Song", "Song of Solomon", &["So", "Song", "SOS", "Song of Sol"]),
    book(23, "Isa.", "Isaiah", &["Is", "Isa"]),
    book(24, "Jer.", "Jeremiah", &["Je", "Jer"]),
    book(25, "Lam.", "Lamentations", &["La", "Lam"]),
    book(26, "Ezek.", "Ezekiel", &["Eze", "Ezek"]),
    book(27, "Dan.", "Daniel", &["Da", "Dan"]),
    book(28, "Hos.", "Hosea", &["Ho", "Hos"]),
    book(29, "Joel", "Joel", &["Joe"]),
    book(30, "Amos", "Amos", &["Am"]),
    book(31, "Obad.", "Obadiah", &["Ob", "Obad"]),
    book(32, "Jonah", "Jonah", &["Jon"]),
    book(33, "Mic.", "Micah", &["Mic"]),
    book(34, "Nah.", "Nahum", &["Na", "Nah"]),
    book(35, "Hab.", "Habakkuk", &["Hab"]),
    book(36, "Zeph.", "Zephaniah", &["Zep", "Zeph"]),
    book(37, "Hag.", "Haggai", &["Hag"]),
    book(38, "Zech.", "Zechariah", &["Zec", "Zech"]),
    book(39, "Mal.", "Malachi", &["Mal"]),
    book(40, "Matt.", "Matthew", &["Mt", "Matt"]),
    book(41, "Mark", "Mark", &["Mk", "Mar"]),
    book(42, "Luke", "Luke", &["Lu", "Lk"]),
    book(43, "John", "John", &["Jn", "Joh"]),
    book(44, "Acts", "Acts", &["Ac"]),
    book(45, "Rom.", "Romans", &["Ro", "Rom"]),
    book(46, "1 Cor.", "1 Corinthians", &["1Co", "1Cor", "1 Cor"]),
    book(47, "2 Cor.", "2 Corinthians", &["2Co", "2Cor", "2 Cor"]),
    book(48, "Gal.", "Galatians", &["Ga", "Gal"]),
    book(49, "Eph.", "Ephesians", &["Eph"]),
    book(50, "Phil.", "Philippians", &["Php", "Phil"]),
    book(51, "Col.", "Colossians", &["Col"]),
    book(52, "1 Thess.", "1 Thessalonians", &["1Th", "1Thess", "1 Thess"]),
    book(53, "2 Thess.", "2 Thessalonians", &["2Th", "2Thess", "2 Thess"]),
    book(54, "1 Tim.", "1 Timothy", &["1Ti", "1Tim", "1 Tim"]),
    book(55, "2 Tim.", "2 Timothy", &["2Ti", "2Tim", "2 Tim"]),
    book(56, "Titus", "Titus", &["Tit"]),
    book(57, "Philem.", "Philemon", &["Phm", "Philem"]),
    book(58, "Heb.", "Hebrews", &["Heb"]),
    book(59, "James", "James", &["Jam", "Jas"]),
    book(60, "1 Pet.", "1 Peter", &["1Pe", "1Pet", "1 Pet"]),
    book(61, "2 Pet.", "2 Peter", &["2Pe", "2Pet", "2 Pet"]),
    book(62, "1 John", "1 John", &["1Jn", "1Jo"]),
    book(63, "2 John", "2 John", &["2Jn", "2Jo"]),
    book(64, "3 John", "3 John", &["3Jn", "3Jo"]),
    book(65, "Jude", "Jude", &["Jud", "Jd"]),
    book(66, "Rev.", "Revelation", &["Re", "Rev"]),
];

/// Read-only lookup from any accepted spelling of a book to its entry.
///
/// Keys are folded: lowercase, with dots and whitespace removed, so
/// "1 Sam.", "1Sam" and "1 sam" all resolve to the same book.
#[derive(Debug)]
pub struct BookTable {
    by_key: HashMap<String, &'static BookInfo>,
}

impl BookTable {
    pub fn standard() -> Self {
        let mut by_key = HashMap::new();
        for info in BOOKS {
            let names = info
                .aliases
                .iter()
                .copied()
                .chain([info.short, info.full]);
            for name in names {
                by_key.entry(fold(name)).or_insert(info);
            }
        }
        BookTable { by_key }
    }

    pub fn lookup(&self, token: &str) -> Option<&'static BookInfo> {
        let key = fold(token);
        if key.is_empty() {
            return None;
        }
        if let Some(info) = self.by_key.get(&key) {
            return Some(*info);
        }
        // Plural spellings such as "Pss" or "Prov's"
        key.strip_suffix('s')
            .and_then(|k| self.by_key.get(k))
            .copied()
    }

    /// Book number for a name or abbreviation, `UNKNOWN_BOOK` if absent.
    pub fn book_number(&self, token: &str) -> u8 {
        self.lookup(token).map_or(UNKNOWN_BOOK, |b| b.number)
    }

    pub fn by_number(&self, number: u8) -> Option<&'static BookInfo> {
        number
            .checked_sub(1)
            .and_then(|i| BOOKS.get(i as usize))
    }
}

impl Default for BookTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '\'')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_complete_and_ordered() {
        assert_eq!(BOOKS.len(), 66);
        for (i, b) in BOOKS.iter().enumerate() {
            assert_eq!(b.number as usize, i + 1, "{}", b.full);
        }
    }

    #[test]
    fn lookup_spellings() {
        let t = BookTable::standard();
        assert_eq!(t.book_number("Gen."), 1);
        assert_eq!(t.book_number("gen"), 1);
        assert_eq!(t.book_number("Genesis"), 1);
        assert_eq!(t.book_number("1 Sam"), 9);
        assert_eq!(t.book_number("1Sam."), 9);
        assert_eq!(t.book_number("Song of Solomon"), 22);
        assert_eq!(t.book_number("Rev"), 66);
    }

    #[test]
    fn plural_fallback() {
        let t = BookTable::standard();
        assert_eq!(t.book_number("Pss"), 19);
        assert_eq!(t.book_number("Psalms"), 19);
    }

    #[test]
    fn unknown_token() {
        let t = BookTable::standard();
        assert_eq!(t.book_number("Hezekiah"), UNKNOWN_BOOK);
        assert_eq!(t.book_number(""), UNKNOWN_BOOK);
    }

    #[test]
    fn by_number_bounds() {
        let t = BookTable::standard();
        assert_eq!(t.by_number(1).map(|b| b.full), Some("Genesis"));
        assert_eq!(t.by_number(66).map(|b| b.short), Some("Rev."));
        assert!(t.by_number(0).is_none());
        assert!(t.by_number(67).is_none());
    }
}
