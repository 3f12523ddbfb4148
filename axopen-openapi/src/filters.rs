//! Post-hoc document transforms selecting operations by tag.

use crate::document::Document;

/// A document transform. Filters run on a copy; the source document is left
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl TagFilter {
    pub fn include<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagFilter::Include(tags.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagFilter::Exclude(tags.into_iter().map(Into::into).collect())
    }

    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            TagFilter::Include(tags) => include_tags(doc, tags),
            TagFilter::Exclude(tags) => exclude_tags(doc, tags),
        }
    }
}

/// Apply `filters` left to right.
pub fn apply_filters(doc: &Document, filters: &[TagFilter]) -> Document {
    filters
        .iter()
        .fold(doc.clone(), |current, filter| filter.apply(&current))
}

/// Keep only operations tagged with at least one of `tags`.
///
/// Surviving operations keep only the selected tags, the document tag list is
/// narrowed to `tags`, and paths left without operations are removed.
pub fn include_tags<S: AsRef<str>>(doc: &Document, tags: &[S]) -> Document {
    let selected = |name: &str| tags.iter().any(|t| t.as_ref() == name);

    let mut out = doc.clone();
    out.tags.retain(|tag| selected(&tag.name));

    for item in out.paths.values_mut() {
        item.retain_operations(|op| {
            op.tags.retain(|t| selected(t));
            !op.tags.is_empty()
        });
    }
    out.paths.retain(|_, item| !item.is_empty());
    out
}

/// Drop every operation tagged with any of `tags`.
pub fn exclude_tags<S: AsRef<str>>(doc: &Document, tags: &[S]) -> Document {
    let excluded = |name: &str| tags.iter().any(|t| t.as_ref() == name);

    let mut out = doc.clone();
    out.tags.retain(|tag| !excluded(&tag.name));

    for item in out.paths.values_mut() {
        item.retain_operations(|op| !op.tags.iter().any(|t| excluded(t)));
    }
    out.paths.retain(|_, item| !item.is_empty());
    out
}
