//! Slug generation for section file names.

use std::collections::HashSet;

/// Slug used when a title has no usable characters.
pub const EMPTY_SLUG: &str = "section";

/// Generate a file-name slug from a section title.
///
/// Lowercases, keeps alphanumerics and underscores, turns whitespace and
/// hyphen runs into single hyphens and drops everything else.
///
/// # Examples
///
/// ```
/// use docsplit::markdown::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("@import"), "import");
/// assert_eq!(slugify("comptime_int  values"), "comptime_int-values");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '_' {
                Some(c)
            } else if c.is_whitespace() || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Hands out unique `NN-slug.ext` file names.
///
/// Two titles with the same slug get `-2`, `-3`, ... on the later ones, in
/// the order they are allocated.
#[derive(Debug, Clone)]
pub struct FilenameAllocator {
    extension: String,
    used_slugs: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            used_slugs: HashSet::new(),
        }
    }

    /// Allocate the file name for the section at `order` titled `title`.
    pub fn allocate(&mut self, order: usize, title: &str) -> String {
        let mut base = slugify(title);
        if base.is_empty() {
            base = EMPTY_SLUG.to_string();
        }

        let mut slug = base.clone();
        let mut n = 2;
        while self.used_slugs.contains(&slug) {
            slug = format!("{base}-{n}");
            n += 1;
        }
        self.used_slugs.insert(slug.clone());

        format!("{order:02}-{slug}.{}", self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_simple() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_slugify_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("C Pointers (unsafe)"), "c-pointers-unsafe");
    }

    #[test]
    fn test_slugify_spacing_and_hyphens() {
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("hello--world"), "hello-world");
        assert_eq!(slugify("-hello-"), "hello");
        assert_eq!(slugify("a - b"), "a-b");
    }

    #[test]
    fn test_slugify_keeps_underscores() {
        assert_eq!(slugify("comptime_int"), "comptime_int");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_allocate_prefix_and_extension() {
        let mut alloc = FilenameAllocator::new("md");
        assert_eq!(alloc.allocate(0, "Introduction"), "00-introduction.md");
        assert_eq!(alloc.allocate(12, "Hello World"), "12-hello-world.md");
        assert_eq!(alloc.allocate(100, "Appendix"), "100-appendix.md");
    }

    #[test]
    fn test_allocate_disambiguates_collisions() {
        let mut alloc = FilenameAllocator::new("md");
        assert_eq!(alloc.allocate(0, "Overview"), "00-overview.md");
        assert_eq!(alloc.allocate(1, "Overview"), "01-overview-2.md");
        assert_eq!(alloc.allocate(2, "overview!"), "02-overview-3.md");
    }

    #[test]
    fn test_allocate_skips_taken_suffix() {
        let mut alloc = FilenameAllocator::new("md");
        assert_eq!(alloc.allocate(0, "Overview 2"), "00-overview-2.md");
        assert_eq!(alloc.allocate(1, "Overview"), "01-overview.md");
        assert_eq!(alloc.allocate(2, "Overview"), "02-overview-3.md");
    }

    #[test]
    fn test_allocate_empty_title() {
        let mut alloc = FilenameAllocator::new("md");
        assert_eq!(alloc.allocate(3, "§"), "03-section.md");
        assert_eq!(alloc.allocate(4, ""), "04-section-2.md");
    }
}
