//! Site renderer: (theme files, content) -> deployable artifacts.
//!
//! Produces exactly two artifacts, `index.html` and `index.css`. Markdown
//! conversion, template substitution and Sass compilation are external
//! collaborators behind traits so the renderer stays a pure function of its
//! inputs.

use serde_json::{json, Map, Value};

use crate::artifact::{Artifact, INDEX_CSS_FILE_NAME, INDEX_FILE_NAME};
use crate::content::Content;
use crate::error::{Result, SiteError};
use crate::theme::Theme;

/// Markdown-to-HTML collaborator.
pub trait MarkdownRenderer: Send + Sync {
    /// Convert a markdown body to HTML.
    fn to_html(&self, markdown: &str) -> String;
}

/// Logic-less template render collaborator.
///
/// Must support nested object/array variable lookup and loops over arrays;
/// see [`crate::template::Renderer`] for the shipped implementation.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with the given variables.
    fn render(&self, template: &str, vars: &Value) -> Result<String>;
}

/// Output of the style-compile collaborator; status 0 means success.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Compiler exit status
    pub status: i32,
    /// Compiled CSS on success, diagnostics on failure
    pub text: String,
}

/// Style-compile collaborator (concatenated Sass source -> CSS).
pub trait StyleCompiler: Send + Sync {
    /// Compile the concatenated source.
    fn compile(&self, source: &str) -> Result<CompileOutput>;
}

/// Markdown renderer backed by comrak.
#[cfg(feature = "markdown")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ComrakRenderer;

#[cfg(feature = "markdown")]
impl MarkdownRenderer for ComrakRenderer {
    fn to_html(&self, markdown: &str) -> String {
        comrak::markdown_to_html(markdown, &comrak::Options::default())
    }
}

/// Render the deployable site bundle: `index.html` and `index.css`.
///
/// Fails with [`SiteError::TemplateCompile`] when the style compiler reports
/// a non-zero status; no artifacts are produced in that case.
pub fn render_site(
    theme: &Theme,
    content: &Content,
    markdown: &dyn MarkdownRenderer,
    engine: &dyn TemplateEngine,
    styles: &dyn StyleCompiler,
) -> Result<Vec<Artifact>> {
    let vars = render_vars(content, markdown)?;

    let template = theme.html_template().ok_or(SiteError::MissingHtmlTemplate)?;
    let html = engine.render(&template.content, &vars)?;

    let source = theme
        .sass_files()
        .map(|f| f.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let output = styles.compile(&source)?;
    if output.status != 0 {
        return Err(SiteError::TemplateCompile {
            status: output.status,
            message: output.text,
        });
    }

    Ok(vec![
        Artifact::text(INDEX_FILE_NAME, html),
        Artifact::text(INDEX_CSS_FILE_NAME, output.text),
    ])
}

/// Build the render variables consumed by the theme template.
///
/// The `json.*` entries are pre-serialized strings embedded in the page for
/// client-side language switching; they are opaque to the template itself.
fn render_vars(content: &Content, markdown: &dyn MarkdownRenderer) -> Result<Value> {
    let mut lang_code_to_lang = Map::new();
    for translation in &content.translations {
        for code in translation.locale_codes() {
            lang_code_to_lang.insert(code.to_string(), Value::String(translation.lang.clone()));
        }
    }
    let lang_codes: Vec<Value> = lang_code_to_lang.values().cloned().collect();

    let mut translations = Map::new();
    for translation in &content.translations {
        let mut value = serde_json::to_value(translation)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "markdownHtml".to_string(),
                Value::String(markdown.to_html(&translation.markdown)),
            );
        }
        translations.insert(translation.lang.clone(), value);
    }

    let background_image = content
        .shared
        .get("backgroundImage")
        .cloned()
        .unwrap_or_default();
    let languages: Vec<&str> = content
        .translations
        .iter()
        .map(|t| t.lang.as_str())
        .collect();

    Ok(json!({
        "backgroundImage": background_image,
        "languages": languages,
        "json": {
            "langCodeToLang": serde_json::to_string(&lang_code_to_lang)?,
            "langCodes": serde_json::to_string(&lang_codes)?,
            "translations": serde_json::to_string(&translations)?,
        },
    }))
}
