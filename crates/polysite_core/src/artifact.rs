//! Artifact model: named immutable byte payloads with a content type.
//!
//! Every piece of synchronized state (content.json, markdown bodies, theme
//! sources, images, favicons, rendered site files) is represented as an
//! [`Artifact`]. Artifacts are value objects: freely cloned, no shared
//! mutable state.

/// File name of the structured content manifest.
pub const CONTENT_FILE_NAME: &str = "content.json";

/// Extension used for per-language markdown bodies.
pub const MARKDOWN_FILE_EXTENSION: &str = ".md";

/// Extension of the single theme HTML template.
pub const HTML_FILE_EXTENSION: &str = ".html";

/// Extension of theme style partials.
pub const SASS_FILE_EXTENSION: &str = ".scss";

/// Name of the rendered site page.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Name of the rendered stylesheet.
pub const INDEX_CSS_FILE_NAME: &str = "index.css";

/// Fixed extension -> MIME type table for text artifacts.
///
/// Binary image/favicon artifacts are not listed here; they keep the content
/// type supplied by the original upload.
pub const EXT_TO_CONTENT_TYPE: &[(&str, &str)] = &[
    (".json", "application/json"),
    (MARKDOWN_FILE_EXTENSION, "text/markdown"),
    (".css", "text/css"),
    (HTML_FILE_EXTENSION, "text/html"),
    (SASS_FILE_EXTENSION, "text/x-scss"),
];

/// Look up the content type for a file name by its extension.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let dot = name.rfind('.')?;
    let ext = &name[dot..];
    EXT_TO_CONTENT_TYPE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
}

/// A named immutable byte payload, the unit of storage and transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Relative path segment, unique within its artifact set
    pub name: String,
    /// Raw content bytes
    pub content: Vec<u8>,
    /// MIME type
    pub content_type: String,
    /// Opaque content-equality token, populated only for artifacts read
    /// back from storage
    pub fingerprint: Option<String>,
}

impl Artifact {
    /// Create a text artifact; the content type is derived from the name's
    /// extension, falling back to `text/plain`.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).unwrap_or("text/plain").to_string();
        Self {
            name,
            content: content.into().into_bytes(),
            content_type,
            fingerprint: None,
        }
    }

    /// Create a binary artifact with an explicitly supplied content type
    /// (images, favicons).
    pub fn binary(
        name: impl Into<String>,
        content: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content,
            content_type: content_type.into(),
            fingerprint: None,
        }
    }

    /// Attach the fingerprint reported by the store this artifact was read
    /// from.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Content bytes as UTF-8 text.
    pub fn text_content(&self) -> crate::error::Result<String> {
        Ok(String::from_utf8(self.content.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(content_type_for("content.json"), Some("application/json"));
        assert_eq!(content_type_for("en.md"), Some("text/markdown"));
        assert_eq!(content_type_for("index.css"), Some("text/css"));
        assert_eq!(content_type_for("main.html"), Some("text/html"));
        assert_eq!(content_type_for("layout.theme.scss"), Some("text/x-scss"));
        assert_eq!(content_type_for("photo.png"), None);
        assert_eq!(content_type_for("noextension"), None);
    }

    #[test]
    fn test_text_artifact_derives_content_type() {
        let a = Artifact::text("en.md", "# hello");
        assert_eq!(a.content_type, "text/markdown");
        assert_eq!(a.text_content().unwrap(), "# hello");
        assert!(a.fingerprint.is_none());
    }

    #[test]
    fn test_binary_artifact_keeps_supplied_type() {
        let a = Artifact::binary("bg.png", vec![1, 2, 3], "image/png");
        assert_eq!(a.content_type, "image/png");
        assert_eq!(a.content, vec![1, 2, 3]);
    }

    #[test]
    fn test_with_fingerprint() {
        let a = Artifact::text("x.css", "body{}").with_fingerprint("abc");
        assert_eq!(a.fingerprint.as_deref(), Some("abc"));
    }
}
