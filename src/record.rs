use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log record, ordered strictest first.
///
/// The ordering matters: reads filter with an inclusive upper bound, so
/// `Level::Warn` selects `Error` and `Warn` records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

/// Store-assigned record identity. Monotonic per store instance, used to
/// break timestamp ties so read and eviction orderings stay total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecordId(pub u64);

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<RecordId> for u64 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

/// A single persisted log line. Immutable once written: the store only ever
/// inserts, evicts, or bulk-clears records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub module: String,
    pub text: String,
}

impl LogRecord {
    /// Sort key for the canonical oldest-first ordering. Reads use the
    /// reverse of this key.
    pub(crate) fn sort_key(&self) -> (DateTime<Utc>, RecordId) {
        (self.timestamp, self.id)
    }
}

/// Filter applied by paginated reads: an inclusive severity upper bound and
/// an optional keyword the record text must contain.
///
/// The keyword match is case- and diacritic-insensitive; the keyword is
/// folded once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFilter {
    max_level: Level,
    keyword: Option<String>,
}

impl RecordFilter {
    pub fn new(max_level: Level, keyword: Option<&str>) -> Self {
        Self {
            max_level,
            keyword: keyword.map(fold),
        }
    }

    pub fn max_level(&self) -> Level {
        self.max_level
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if record.level > self.max_level {
            return false;
        }
        match &self.keyword {
            Some(keyword) => fold(&record.text).contains(keyword.as_str()),
            None => true,
        }
    }
}

/// Lowercases and strips common Latin diacritics so that "Café" matches
/// "cafe". Not a full Unicode normalization; good enough for log search.
pub(crate) fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_char)
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'č' => 'c',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ì'..='ï' | 'ĩ' | 'ī' | 'į' => 'i',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ù'..='ü' | 'ũ' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ś' | 'š' => 's',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Level, text: &str) -> LogRecord {
        LogRecord {
            id: RecordId(1),
            timestamp: Utc::now(),
            level,
            module: "test".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn level_ordering_is_strictest_first() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
    }

    #[test]
    fn filter_level_is_inclusive_upper_bound() {
        let filter = RecordFilter::new(Level::Warn, None);
        assert!(filter.matches(&record(Level::Error, "x")));
        assert!(filter.matches(&record(Level::Warn, "x")));
        assert!(!filter.matches(&record(Level::Info, "x")));
        assert!(!filter.matches(&record(Level::Debug, "x")));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let filter = RecordFilter::new(Level::Debug, Some("Token"));
        assert!(filter.matches(&record(Level::Info, "refresh TOKEN expired")));
        assert!(!filter.matches(&record(Level::Info, "no match here")));
    }

    #[test]
    fn keyword_match_folds_diacritics() {
        let filter = RecordFilter::new(Level::Debug, Some("cafe"));
        assert!(filter.matches(&record(Level::Info, "visited Café Noir")));

        let filter = RecordFilter::new(Level::Debug, Some("Señor"));
        assert!(filter.matches(&record(Level::Info, "hola senor")));
    }

    #[test]
    fn empty_keyword_matches_everything() {
        let filter = RecordFilter::new(Level::Debug, Some(""));
        assert!(filter.matches(&record(Level::Info, "")));
    }
}
