//! Theme aggregate: template source files plus favicon assets.

use crate::artifact::{Artifact, content_type_for, HTML_FILE_EXTENSION, SASS_FILE_EXTENSION};
use crate::content::{apply_op, ImageOp};
use crate::error::{Result, SiteError};

/// A named template source file (one HTML template or a Sass partial).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeFile {
    /// File name; the extension decides the role
    pub name: String,
    /// Source text
    pub content: String,
}

impl ThemeFile {
    /// Create a theme file.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// The set of template source files plus favicon assets.
///
/// Exactly one file should carry the `.html` extension; the remaining
/// `.scss` partials are concatenated in listed order before compilation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Theme {
    /// Ordered template sources
    pub files: Vec<ThemeFile>,
    /// Pending favicon uploads
    pub favicon_files: Vec<Artifact>,
    /// Favicons already persisted, supplied once at load
    pub initial_favicon_files: Vec<Artifact>,
}

impl Theme {
    /// The single HTML template file, if present.
    pub fn html_template(&self) -> Option<&ThemeFile> {
        self.files
            .iter()
            .find(|f| f.name.ends_with(HTML_FILE_EXTENSION))
    }

    /// All Sass partials in listed order.
    pub fn sass_files(&self) -> impl Iterator<Item = &ThemeFile> {
        self.files
            .iter()
            .filter(|f| f.name.ends_with(SASS_FILE_EXTENSION))
    }

    /// All favicon artifacts, persisted first, then pending.
    pub fn all_favicons(&self) -> Vec<Artifact> {
        let mut all = self.initial_favicon_files.clone();
        all.extend(self.favicon_files.iter().cloned());
        all
    }

    /// Replace the source text of the file at `index`.
    pub fn set_file_content(&mut self, index: usize, content: impl Into<String>) -> Result<()> {
        let max = match self.files.len() {
            0 => return Err(SiteError::validation("theme has no files")),
            n => n - 1,
        };
        if index > max {
            return Err(SiteError::IndexOutOfRange { index, max });
        }
        self.files[index].content = content.into();
        Ok(())
    }

    /// Apply an [`ImageOp`] to the favicon collection.
    pub fn apply_favicon_op(&mut self, op: ImageOp) -> Result<()> {
        apply_op(&mut self.favicon_files, &mut self.initial_favicon_files, op)
    }

    /// Encode the template sources as persistable artifacts.
    pub fn encode_files(&self) -> Vec<Artifact> {
        self.files
            .iter()
            .map(|f| {
                let content_type = content_type_for(&f.name).unwrap_or("text/plain");
                Artifact::binary(f.name.clone(), f.content.clone().into_bytes(), content_type)
            })
            .collect()
    }

    /// Rebuild a theme from artifacts read back from storage.
    pub fn decode(theme_files: &[Artifact], favicons: Vec<Artifact>) -> Result<Self> {
        let mut files = Vec::with_capacity(theme_files.len());
        for artifact in theme_files {
            files.push(ThemeFile::new(
                artifact.name.clone(),
                artifact.text_content()?,
            ));
        }
        Ok(Self {
            files,
            favicon_files: Vec::new(),
            initial_favicon_files: favicons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme {
            files: vec![
                ThemeFile::new("main.html", "<html></html>"),
                ThemeFile::new("config.theme.scss", "$bg: #fff;"),
                ThemeFile::new("layout.theme.scss", "body { color: $bg; }"),
            ],
            ..Theme::default()
        }
    }

    #[test]
    fn test_html_template_selection() {
        let theme = theme();
        assert_eq!(theme.html_template().unwrap().name, "main.html");
        let sass: Vec<_> = theme.sass_files().map(|f| f.name.as_str()).collect();
        assert_eq!(sass, vec!["config.theme.scss", "layout.theme.scss"]);
    }

    #[test]
    fn test_set_file_content_bounds() {
        let mut theme = theme();
        theme.set_file_content(1, "$bg: #000;").unwrap();
        assert_eq!(theme.files[1].content, "$bg: #000;");
        assert!(matches!(
            theme.set_file_content(3, "x"),
            Err(SiteError::IndexOutOfRange { index: 3, max: 2 })
        ));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let theme = theme();
        let artifacts = theme.encode_files();
        assert_eq!(artifacts[0].content_type, "text/html");
        assert_eq!(artifacts[1].content_type, "text/x-scss");
        let decoded = Theme::decode(&artifacts, Vec::new()).unwrap();
        assert_eq!(decoded.files, theme.files);
    }
}
