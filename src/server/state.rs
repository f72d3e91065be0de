//! Per-connection session state

use crate::article::Article;
use crate::group::Group;

/// Cursor state owned exclusively by one connection
///
/// Invariant: the current article, when set, always belongs to the current
/// group. Handlers that fail must leave both cursors untouched; selecting a
/// new group re-anchors the article cursor to that group's first article
/// (or clears it when the group is empty).
#[derive(Debug, Default)]
pub struct Session {
    current_group: Option<Group>,
    current_article: Option<Article>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected group, if any
    pub fn current_group(&self) -> Option<&Group> {
        self.current_group.as_ref()
    }

    /// Currently selected article, if any
    pub fn current_article(&self) -> Option<&Article> {
        self.current_article.as_ref()
    }

    /// Select a group, re-anchoring the article cursor
    pub fn select_group(&mut self, group: Group, article: Option<Article>) {
        self.current_group = Some(group);
        self.current_article = article;
    }

    /// Move (or clear) the article cursor within the current group
    pub fn select_article(&mut self, article: Option<Article>) {
        self.current_article = article;
    }
}
