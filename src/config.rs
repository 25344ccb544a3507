//! Conversion configuration.

/// Languages recognised from `class` attributes on `code`/`pre` elements
/// and from `<lang>-cap` figure captions.
pub const DEFAULT_LANGUAGES: &[&str] = &["zig", "c", "cpp", "shell", "sh", "javascript", "peg"];

/// Configuration for converting one document version.
///
/// Construct with [`ConvertConfig::default`] and adjust with the `with_*`
/// builders.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Project name used in the navigation index heading.
    pub project_name: String,
    /// Source URL of the converted page; `{version}` is replaced with the
    /// document version.
    pub source_url: Option<String>,
    /// Extension of section files, without the dot.
    pub extension: String,
    /// File name of the generated navigation index.
    pub index_filename: String,
    /// How many TOC levels the navigation index lists (1 = top-level only).
    pub index_depth: usize,
    /// Emit an HTML anchor carrying the original id before each section
    /// heading.
    pub heading_anchors: bool,
    /// Recognised code languages.
    pub known_languages: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            project_name: "Language Reference".to_string(),
            source_url: None,
            extension: "md".to_string(),
            index_filename: "README.md".to_string(),
            index_depth: 1,
            heading_anchors: false,
            known_languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_source_url(mut self, template: impl Into<String>) -> Self {
        self.source_url = Some(template.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_index_filename(mut self, name: impl Into<String>) -> Self {
        self.index_filename = name.into();
        self
    }

    pub fn with_index_depth(mut self, depth: usize) -> Self {
        self.index_depth = depth.max(1);
        self
    }

    pub fn with_heading_anchors(mut self, enabled: bool) -> Self {
        self.heading_anchors = enabled;
        self
    }

    pub fn with_known_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Source URL for `version`, if a template is configured.
    pub fn source_url_for(&self, version: &str) -> Option<String> {
        self.source_url
            .as_ref()
            .map(|template| template.replace("{version}", version))
    }

    pub(crate) fn is_known_language(&self, name: &str) -> bool {
        self.known_languages.iter().any(|l| l == name)
    }
}
