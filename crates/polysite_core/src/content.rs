//! Content aggregate: ordered translations, shared fields and images.
//!
//! Edits are pure operations returning `Result`; validation failures abort
//! before any state changes. The first translation is the "main" one and is
//! pinned: it can neither be removed nor moved.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::error::{Result, SiteError};

/// Separator between locale codes inside [`Translation::codes`].
pub const LANG_CODE_SEPARATOR: char = ',';

/// One language variant of the site content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    /// Unique language key (ISO-like short code)
    pub lang: String,
    /// Comma-separated locale codes that resolve to this language
    pub codes: String,
    /// Contents of the page `<title>` tag
    pub html_title: String,
    /// Display title
    pub title: String,
    /// Display subtitle
    pub subtitle: String,
    /// Body content in markdown
    #[serde(default)]
    pub markdown: String,
}

impl Translation {
    /// A fresh translation: every display field empty, `codes` preset to the
    /// language key itself.
    pub fn new(lang: impl Into<String>) -> Self {
        let lang = lang.into();
        Self {
            codes: lang.clone(),
            lang,
            html_title: String::new(),
            title: String::new(),
            subtitle: String::new(),
            markdown: String::new(),
        }
    }

    /// Locale codes this translation owns.
    pub fn locale_codes(&self) -> impl Iterator<Item = &str> {
        self.codes
            .split(LANG_CODE_SEPARATOR)
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Tagged image (or favicon) collection operation.
///
/// Consumed by [`Content::apply_image_op`] and
/// [`crate::theme::Theme::apply_favicon_op`].
#[derive(Debug, Clone)]
pub enum ImageOp {
    /// Add a pending upload
    Add(Artifact),
    /// Remove a file by name (pending or already persisted)
    Remove(String),
}

/// The full multi-language site content aggregate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Content {
    /// Ordered translations; the first entry is the main translation
    pub translations: Vec<Translation>,
    /// Flat key -> value fields shared across languages
    /// (e.g. `backgroundImage`)
    pub shared: IndexMap<String, String>,
    /// Pending image uploads, not yet persisted
    pub images: Vec<Artifact>,
    /// Images already persisted, supplied once at load
    pub initial_images: Vec<Artifact>,
}

impl Content {
    /// All image artifacts, persisted first, then pending.
    pub fn all_images(&self) -> Vec<Artifact> {
        let mut all = self.initial_images.clone();
        all.extend(self.images.iter().cloned());
        all
    }

    /// Append a fresh translation for `lang`.
    ///
    /// Rejects blank and duplicate language keys before mutating anything.
    pub fn add_translation(&mut self, lang: &str) -> Result<()> {
        let lang = lang.trim();
        if lang.is_empty() {
            return Err(SiteError::validation("lang is empty"));
        }
        if self.translations.iter().any(|t| t.lang == lang) {
            return Err(SiteError::validation(format!(
                "lang ({lang}) already exists"
            )));
        }
        self.translations.push(Translation::new(lang));
        Ok(())
    }

    /// Move a non-main translation from one position to another.
    ///
    /// Indices are offsets into the tail after the pinned main translation:
    /// 0 addresses the second translation overall.
    pub fn move_translation(&mut self, from: usize, to: usize) -> Result<()> {
        let max = match self.translations.len() {
            0 | 1 => return Err(SiteError::validation("no translations to reorder")),
            n => n - 2,
        };
        if from > max {
            return Err(SiteError::IndexOutOfRange { index: from, max });
        }
        if to > max {
            return Err(SiteError::IndexOutOfRange { index: to, max });
        }
        if from == to {
            return Ok(());
        }
        let translation = self.translations.remove(from + 1);
        self.translations.insert(to + 1, translation);
        Ok(())
    }

    /// Remove the translation at `index` (whole-sequence index).
    ///
    /// The main translation (index 0) is never removable.
    pub fn remove_translation(&mut self, index: usize) -> Result<Translation> {
        if self.translations.is_empty() {
            return Err(SiteError::validation("no translations to remove"));
        }
        let max = self.translations.len() - 1;
        if index > max {
            return Err(SiteError::IndexOutOfRange { index, max });
        }
        if index == 0 {
            return Err(SiteError::validation(
                "the main translation cannot be removed",
            ));
        }
        Ok(self.translations.remove(index))
    }

    /// Apply an [`ImageOp`] to the pending image collection.
    ///
    /// Adding a file whose name already exists in the combined
    /// pending+persisted set is rejected.
    pub fn apply_image_op(&mut self, op: ImageOp) -> Result<()> {
        apply_op(&mut self.images, &mut self.initial_images, op)
    }
}

/// Shared add/remove reducer for image-like collections (images, favicons).
pub(crate) fn apply_op(
    pending: &mut Vec<Artifact>,
    initial: &mut Vec<Artifact>,
    op: ImageOp,
) -> Result<()> {
    match op {
        ImageOp::Add(file) => {
            let duplicate = pending
                .iter()
                .chain(initial.iter())
                .any(|a| a.name == file.name);
            if duplicate {
                return Err(SiteError::validation(format!(
                    "a file named {} already exists",
                    file.name
                )));
            }
            pending.push(file);
            Ok(())
        }
        ImageOp::Remove(name) => {
            pending.retain(|a| a.name != name);
            initial.retain(|a| a.name != name);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_with(langs: &[&str]) -> Content {
        let mut content = Content::default();
        for lang in langs {
            content.add_translation(lang).unwrap();
        }
        content
    }

    #[test]
    fn test_new_translation_presets_codes() {
        let t = Translation::new("fr");
        assert_eq!(t.codes, "fr");
        assert!(t.title.is_empty());
        assert!(t.markdown.is_empty());
    }

    #[test]
    fn test_locale_codes_split() {
        let mut t = Translation::new("en");
        t.codes = "en,en-US, en-GB".to_string();
        let codes: Vec<_> = t.locale_codes().collect();
        assert_eq!(codes, vec!["en", "en-US", "en-GB"]);
    }

    #[test]
    fn test_add_translation_rejects_duplicate_lang() {
        let mut content = content_with(&["en"]);
        let err = content.add_translation("en").unwrap_err();
        assert!(matches!(err, SiteError::Validation(_)));
        assert_eq!(content.translations.len(), 1);
    }

    #[test]
    fn test_add_translation_rejects_blank_lang() {
        let mut content = content_with(&["en"]);
        assert!(content.add_translation("  ").is_err());
    }

    #[test]
    fn test_move_translation_reorders_tail() {
        let mut content = content_with(&["en", "fr", "de", "es"]);
        content.move_translation(0, 2).unwrap();
        let langs: Vec<_> = content.translations.iter().map(|t| &t.lang).collect();
        assert_eq!(langs, vec!["en", "de", "es", "fr"]);
    }

    #[test]
    fn test_move_translation_bounds_checked() {
        let mut content = content_with(&["en", "fr", "de"]);
        let err = content.move_translation(0, 2).unwrap_err();
        assert!(matches!(
            err,
            SiteError::IndexOutOfRange { index: 2, max: 1 }
        ));
    }

    #[test]
    fn test_move_translation_same_index_is_noop() {
        let mut content = content_with(&["en", "fr", "de"]);
        let before = content.clone();
        content.move_translation(1, 1).unwrap();
        assert_eq!(content, before);
    }

    #[test]
    fn test_remove_translation_keeps_main() {
        let mut content = content_with(&["en", "fr"]);
        assert!(content.remove_translation(0).is_err());
        let removed = content.remove_translation(1).unwrap();
        assert_eq!(removed.lang, "fr");
        assert_eq!(content.translations.len(), 1);
    }

    #[test]
    fn test_image_add_rejects_duplicate_across_initial() {
        let mut content = Content::default();
        content.initial_images = vec![Artifact::binary("bg.png", vec![1], "image/png")];
        let err = content
            .apply_image_op(ImageOp::Add(Artifact::binary("bg.png", vec![2], "image/png")))
            .unwrap_err();
        assert!(matches!(err, SiteError::Validation(_)));
    }

    #[test]
    fn test_image_remove_hits_both_collections() {
        let mut content = Content::default();
        content.initial_images = vec![Artifact::binary("a.png", vec![1], "image/png")];
        content
            .apply_image_op(ImageOp::Add(Artifact::binary("b.png", vec![2], "image/png")))
            .unwrap();
        content
            .apply_image_op(ImageOp::Remove("a.png".to_string()))
            .unwrap();
        content
            .apply_image_op(ImageOp::Remove("b.png".to_string()))
            .unwrap();
        assert!(content.all_images().is_empty());
    }
}
