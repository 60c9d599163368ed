//! Content codec: lossless round-trip between [`Content`] and a named
//! artifact set.
//!
//! `content.json` carries the structured fields; each translation's prose
//! body is a separate `<lang>.md` artifact so the reconciler can skip
//! unchanged bodies independently of unrelated field edits. Image artifacts
//! are excluded entirely; they are persisted under their own prefix.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::artifact::{Artifact, CONTENT_FILE_NAME, MARKDOWN_FILE_EXTENSION};
use crate::content::{Content, Translation};
use crate::error::{Result, SiteError};

/// Wire form of a translation inside `content.json` (no markdown body).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationDoc {
    lang: String,
    codes: String,
    html_title: String,
    title: String,
    subtitle: String,
}

/// Wire form of `content.json`.
#[derive(Debug, Serialize, Deserialize)]
struct ContentDoc {
    translations: Vec<TranslationDoc>,
    shared: IndexMap<String, String>,
}

impl From<&Translation> for TranslationDoc {
    fn from(t: &Translation) -> Self {
        Self {
            lang: t.lang.clone(),
            codes: t.codes.clone(),
            html_title: t.html_title.clone(),
            title: t.title.clone(),
            subtitle: t.subtitle.clone(),
        }
    }
}

/// Serialize content into its persistable artifact set: one `content.json`
/// plus one `<lang>.md` per translation.
pub fn encode(content: &Content) -> Result<Vec<Artifact>> {
    let doc = ContentDoc {
        translations: content.translations.iter().map(Into::into).collect(),
        shared: content.shared.clone(),
    };
    let json = serde_json::to_string_pretty(&doc)?;

    let mut artifacts = vec![Artifact::text(CONTENT_FILE_NAME, json)];
    for translation in &content.translations {
        artifacts.push(Artifact::text(
            format!("{}{}", translation.lang, MARKDOWN_FILE_EXTENSION),
            translation.markdown.clone(),
        ));
    }
    Ok(artifacts)
}

/// Rebuild content from an artifact set produced by [`encode`].
///
/// Fails with [`SiteError::MissingTranslationBody`] when `content.json`
/// references a language with no matching markdown artifact; a load without
/// every body present is unusable.
pub fn decode(artifacts: &[Artifact]) -> Result<Content> {
    let manifest = artifacts
        .iter()
        .find(|a| a.name == CONTENT_FILE_NAME)
        .ok_or(SiteError::MissingContentManifest)?;
    let doc: ContentDoc = serde_json::from_slice(&manifest.content)?;

    let mut translations = Vec::with_capacity(doc.translations.len());
    for t in doc.translations {
        let body_name = format!("{}{}", t.lang, MARKDOWN_FILE_EXTENSION);
        let body = artifacts
            .iter()
            .find(|a| a.name == body_name)
            .ok_or_else(|| SiteError::MissingTranslationBody {
                lang: t.lang.clone(),
            })?;
        translations.push(Translation {
            lang: t.lang,
            codes: t.codes,
            html_title: t.html_title,
            title: t.title,
            subtitle: t.subtitle,
            markdown: body.text_content()?,
        });
    }

    Ok(Content {
        translations,
        shared: doc.shared,
        images: Vec::new(),
        initial_images: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> Content {
        let mut content = Content::default();
        content.add_translation("en").unwrap();
        content.add_translation("fr").unwrap();
        content.translations[0].codes = "en,en-US".to_string();
        content.translations[0].html_title = "Home".to_string();
        content.translations[0].title = "Welcome".to_string();
        content.translations[0].subtitle = "hello".to_string();
        content.translations[0].markdown = "# Welcome\n\nbody".to_string();
        content.translations[1].markdown = "# Bienvenue".to_string();
        content
            .shared
            .insert("backgroundImage".to_string(), "bg.png".to_string());
        content
    }

    #[test]
    fn test_encode_layout() {
        let artifacts = encode(&sample_content()).unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["content.json", "en.md", "fr.md"]);
        assert_eq!(artifacts[0].content_type, "application/json");
        assert_eq!(artifacts[1].content_type, "text/markdown");
    }

    #[test]
    fn test_content_json_excludes_markdown() {
        let artifacts = encode(&sample_content()).unwrap();
        let json = artifacts[0].text_content().unwrap();
        assert!(json.contains("\"htmlTitle\": \"Home\""));
        assert!(json.contains("\"backgroundImage\": \"bg.png\""));
        assert!(!json.contains("markdown"));
    }

    #[test]
    fn test_round_trip() {
        let content = sample_content();
        let decoded = decode(&encode(&content).unwrap()).unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn test_decode_missing_manifest() {
        let err = decode(&[Artifact::text("en.md", "x")]).unwrap_err();
        assert!(matches!(err, SiteError::MissingContentManifest));
    }

    #[test]
    fn test_decode_missing_translation_body() {
        let content = sample_content();
        let artifacts: Vec<_> = encode(&content)
            .unwrap()
            .into_iter()
            .filter(|a| a.name != "fr.md")
            .collect();
        let err = decode(&artifacts).unwrap_err();
        match err {
            SiteError::MissingTranslationBody { lang } => assert_eq!(lang, "fr"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
