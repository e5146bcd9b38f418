use crate::record::{Level, RecordFilter};

/// Caller-directed movement of the pagination cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageDirection {
    #[default]
    Forward,
    Backward,
    Reset,
}

/// Ephemeral per-filter pagination cursor. Owned exclusively by the store
/// worker: created lazily on the first read, replaced wholesale on filter
/// change, dropped on clear. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSession {
    max_level: Level,
    keyword: Option<String>,
    page_index: usize,
    page_size: usize,
}

impl FetchSession {
    pub fn new(max_level: Level, keyword: Option<&str>, page_size: usize) -> Self {
        Self {
            max_level,
            keyword: keyword.map(str::to_owned),
            page_index: 0,
            page_size,
        }
    }

    /// Whether a read with the given filter can reuse this cursor. A changed
    /// level or keyword invalidates pagination state.
    pub fn matches_filter(&self, max_level: Level, keyword: Option<&str>) -> bool {
        self.max_level == max_level && self.keyword.as_deref() == keyword
    }

    /// Pure cursor transition: forward increments, backward saturates at
    /// page zero, reset zeroes. Returns the new cursor instead of mutating
    /// in place.
    pub fn advance(&self, direction: PageDirection) -> Self {
        let page_index = match direction {
            PageDirection::Forward => self.page_index + 1,
            PageDirection::Backward => self.page_index.saturating_sub(1),
            PageDirection::Reset => 0,
        };
        Self {
            max_level: self.max_level,
            keyword: self.keyword.clone(),
            page_index,
            page_size: self.page_size,
        }
    }

    pub fn filter(&self) -> RecordFilter {
        RecordFilter::new(self.max_level, self.keyword.as_deref())
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn offset(&self) -> usize {
        self.page_index * self.page_size
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_increments_page_index() {
        let session = FetchSession::new(Level::Info, None, 25);
        let session = session.advance(PageDirection::Forward);
        assert_eq!(session.page_index(), 1);
        assert_eq!(session.offset(), 25);

        let session = session.advance(PageDirection::Forward);
        assert_eq!(session.page_index(), 2);
        assert_eq!(session.offset(), 50);
    }

    #[test]
    fn backward_saturates_at_zero() {
        let session = FetchSession::new(Level::Info, None, 25);
        let session = session.advance(PageDirection::Backward);
        assert_eq!(session.page_index(), 0);
        assert_eq!(session.offset(), 0);
    }

    #[test]
    fn reset_returns_to_first_page() {
        let session = FetchSession::new(Level::Info, None, 25)
            .advance(PageDirection::Forward)
            .advance(PageDirection::Forward)
            .advance(PageDirection::Reset);
        assert_eq!(session.page_index(), 0);
    }

    #[test]
    fn filter_change_is_detected() {
        let session = FetchSession::new(Level::Info, Some("token"), 25);
        assert!(session.matches_filter(Level::Info, Some("token")));
        assert!(!session.matches_filter(Level::Warn, Some("token")));
        assert!(!session.matches_filter(Level::Info, Some("other")));
        assert!(!session.matches_filter(Level::Info, None));
    }

    #[test]
    fn advance_preserves_filter() {
        let session = FetchSession::new(Level::Warn, Some("token"), 10);
        let session = session.advance(PageDirection::Forward);
        assert!(session.matches_filter(Level::Warn, Some("token")));
        assert_eq!(session.limit(), 10);
    }
}
