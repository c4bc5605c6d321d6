// ABOUTME: Utility functions for slugging and archive naming
// ABOUTME: Provides consistent, filesystem-safe export filenames

pub const ARCHIVE_EXTENSION: &str = "audapolis";

pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// `<slug>-<id>.audapolis`, or `<id>.audapolis` when the name slugs to nothing.
pub fn archive_file_name(display_name: Option<&str>, doc_id: &str) -> String {
    let slug = display_name.map(slugify).unwrap_or_default();
    if slug.is_empty() {
        format!("{}.{}", doc_id, ARCHIVE_EXTENSION)
    } else {
        format!("{}-{}.{}", slug, doc_id, ARCHIVE_EXTENSION)
    }
}
