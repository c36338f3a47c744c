//! Hierarchical chapter records read from media containers
//!
//! Container formats such as Matroska nest chapters (a part containing
//! chapters, a chapter containing scenes) and give each entry names in
//! several languages. The container parser produces a forest of
//! [`ChapterTree`] nodes; this module picks display names and flattens the
//! forest into [`ChapterMarks`] for a single file.

use crate::types::{ChapterMarks, Duration};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A chapter label and the languages it is written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterName {
    pub name: String,
    pub languages: BTreeSet<String>,
}

impl ChapterName {
    pub fn new<I, S>(name: impl Into<String>, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if this name is written in `language`
    pub fn is_in(&self, language: &str) -> bool {
        self.languages.contains(language)
    }
}

/// One chapter entry with its nested sub chapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTree {
    /// Offset of the chapter inside the containing media
    pub start_time: Duration,
    pub names: Vec<ChapterName>,
    pub children: Vec<ChapterTree>,
}

impl ChapterTree {
    pub fn new(start_time: Duration, names: Vec<ChapterName>, children: Vec<ChapterTree>) -> Self {
        Self {
            start_time,
            names,
            children,
        }
    }

    /// Picks the display name for this chapter
    ///
    /// Preferred languages are tried in order; the first one that any name
    /// is written in wins. Without a match the first declared name is used,
    /// and a chapter without names has none.
    pub fn get_name<S: AsRef<str>>(&self, preferred_languages: &[S]) -> Option<&str> {
        preferred_languages
            .iter()
            .find_map(|language| self.names.iter().find(|n| n.is_in(language.as_ref())))
            .or_else(|| self.names.first())
            .map(|n| n.name.as_str())
    }
}

/// Flattens a chapter forest into start time → name marks
///
/// Parents come before their children. A node without any name is called
/// "Chapter N" after its 1-based position among its siblings. When two
/// nodes start at the same time, the first visited keeps the mark.
pub fn flatten_chapter_trees<S: AsRef<str>>(
    trees: &[ChapterTree],
    preferred_languages: &[S],
) -> ChapterMarks {
    let mut marks = ChapterMarks::new();
    collect_marks(trees, preferred_languages, &mut marks);
    marks
}

fn collect_marks<S: AsRef<str>>(
    trees: &[ChapterTree],
    preferred_languages: &[S],
    marks: &mut ChapterMarks,
) {
    for (index, tree) in trees.iter().enumerate() {
        let name = tree
            .get_name(preferred_languages)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Chapter {}", index + 1));
        marks.insert(tree.start_time, name);
        collect_marks(&tree.children, preferred_languages, marks);
    }
}
