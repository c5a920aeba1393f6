//! Per-session state: the saved entries and the latest unsaved rewrite.
//!
//! A [`Session`] is created when the user's session starts and dropped when
//! it ends. Nothing in it is persisted.

/// A saved paragraph with the title and keywords given at save time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    title: String,
    keywords: String,
    paragraph: String,
}

impl Entry {
    pub fn new(
        title: impl Into<String>,
        keywords: impl Into<String>,
        paragraph: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            keywords: keywords.into(),
            paragraph: paragraph.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Comma-separated, stored exactly as typed.
    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn paragraph(&self) -> &str {
        &self.paragraph
    }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    entries: Vec<Entry>,
    latest: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    pub fn has_latest(&self) -> bool {
        self.latest.is_some()
    }

    pub fn set_latest(&mut self, paragraph: impl Into<String>) {
        self.latest = Some(paragraph.into());
    }

    /// Appends an entry and clears the latest result, whether or not the
    /// paragraph came from it.
    pub fn save(
        &mut self,
        title: impl Into<String>,
        keywords: impl Into<String>,
        paragraph: impl Into<String>,
    ) -> &Entry {
        self.latest = None;
        self.entries.push(Entry::new(title, keywords, paragraph));
        &self.entries[self.entries.len() - 1]
    }

    /// Commits the latest result under `title` and `keywords`. Returns `None`
    /// and leaves the entries untouched when there is nothing to save.
    pub fn save_latest(
        &mut self,
        title: impl Into<String>,
        keywords: impl Into<String>,
    ) -> Option<&Entry> {
        let paragraph = self.latest.take()?;
        Some(self.save(title, keywords, paragraph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_latest_overwrites() {
        let mut session = Session::new();
        session.set_latest("one");
        session.set_latest("two");
        assert_eq!(session.latest(), Some("two"));
        assert!(session.entries().is_empty());
    }

    #[test]
    fn save_latest_moves_result_into_entries() {
        let mut session = Session::new();
        session.set_latest("I think it is good.");
        let saved = session.save_latest("t1", "k1,k2").cloned();
        assert_eq!(
            saved,
            Some(Entry::new("t1", "k1,k2", "I think it is good."))
        );
        assert_eq!(session.latest(), None);
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn save_latest_without_result_is_a_no_op() {
        let mut session = Session::new();
        assert!(session.save_latest("t", "k").is_none());
        assert!(session.entries().is_empty());

        session.set_latest("p");
        session.save_latest("t", "k");
        assert!(session.save_latest("t2", "k2").is_none());
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn explicit_save_clears_latest_and_keeps_order() {
        let mut session = Session::new();
        session.save("a", "", "first");
        session.set_latest("pending");
        session.save("b", "x", "second");
        assert!(!session.has_latest());
        let titles: Vec<_> = session.entries().iter().map(Entry::title).collect();
        assert_eq!(titles, ["a", "b"]);
    }
}
