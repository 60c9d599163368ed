//! Logic-less template engine for theme HTML files.
//!
//! Supports variable substitution with `{{path.to.var}}` syntax (nested
//! object and array lookup) and array sections:
//!
//! ```text
//! {{#languages}}<li>{{.}}</li>{{/languages}}
//! ```
//!
//! Values are substituted verbatim, without HTML escaping: rendered
//! variables include pre-serialized JSON blobs consumed by client-side
//! script, which must survive untouched.

use serde_json::Value;

use crate::error::{Result, SiteError};
use crate::render::TemplateEngine;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// The template engine shipped with the crate.
///
/// Implements [`TemplateEngine`] over a [`serde_json::Value`] context.
#[derive(Debug, Default, Clone, Copy)]
pub struct Renderer;

impl TemplateEngine for Renderer {
    fn render(&self, template: &str, vars: &Value) -> Result<String> {
        render_scope(template, &[vars])
    }
}

/// Render `template` against a stack of contexts, innermost last.
fn render_scope(template: &str, stack: &[&Value]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(OPEN) {
        out.push_str(&rest[..open]);
        rest = &rest[open + OPEN.len()..];
        let close = rest
            .find(CLOSE)
            .ok_or_else(|| SiteError::Render("unterminated {{ tag".to_string()))?;
        let tag = rest[..close].trim();
        rest = &rest[close + CLOSE.len()..];

        if let Some(name) = tag.strip_prefix('#') {
            let (inner, after) = split_section(rest, name)?;
            let value = lookup(stack, name);
            match value {
                Some(Value::Array(items)) => {
                    for item in items {
                        let mut scope: Vec<&Value> = stack.to_vec();
                        scope.push(item);
                        out.push_str(&render_scope(inner, &scope)?);
                    }
                }
                Some(Value::Bool(false)) | Some(Value::Null) | None => {}
                Some(other) => {
                    let mut scope: Vec<&Value> = stack.to_vec();
                    scope.push(other);
                    out.push_str(&render_scope(inner, &scope)?);
                }
            }
            rest = after;
        } else if let Some(name) = tag.strip_prefix('/') {
            return Err(SiteError::Render(format!(
                "unexpected closing tag {{{{/{name}}}}}"
            )));
        } else if let Some(value) = lookup(stack, tag) {
            push_value(&mut out, value);
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Split `rest` at the closing tag for section `name`, returning
/// (section body, remainder after the closing tag).
fn split_section<'a>(rest: &'a str, name: &str) -> Result<(&'a str, &'a str)> {
    let closing = format!("{OPEN}/{name}{CLOSE}");
    let at = rest.find(&closing).ok_or_else(|| {
        SiteError::Render(format!("section {{{{#{name}}}}} is never closed"))
    })?;
    Ok((&rest[..at], &rest[at + closing.len()..]))
}

/// Resolve a dotted path against the context stack, innermost context first.
fn lookup<'a>(stack: &[&'a Value], path: &str) -> Option<&'a Value> {
    if path == "." {
        return stack.last().copied();
    }
    for context in stack.iter().rev() {
        let mut current = *context;
        let mut matched = true;
        for segment in path.split('.') {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some(current);
        }
    }
    None
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, vars: &Value) -> String {
        Renderer.render(template, vars).unwrap()
    }

    #[test]
    fn test_simple_substitution() {
        let vars = json!({ "title": "Hello" });
        assert_eq!(render("<h1>{{title}}</h1>", &vars), "<h1>Hello</h1>");
    }

    #[test]
    fn test_nested_lookup() {
        let vars = json!({ "json": { "langCodes": "[\"en\"]" } });
        assert_eq!(render("{{json.langCodes}}", &vars), "[\"en\"]");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let vars = json!({});
        assert_eq!(render("a{{nope}}b", &vars), "ab");
    }

    #[test]
    fn test_array_section_loops() {
        let vars = json!({ "languages": ["en", "fr"] });
        assert_eq!(
            render("{{#languages}}<li>{{.}}</li>{{/languages}}", &vars),
            "<li>en</li><li>fr</li>"
        );
    }

    #[test]
    fn test_section_over_objects() {
        let vars = json!({ "items": [{ "name": "a" }, { "name": "b" }] });
        assert_eq!(render("{{#items}}{{name}};{{/items}}", &vars), "a;b;");
    }

    #[test]
    fn test_falsy_section_skipped() {
        let vars = json!({ "flag": false });
        assert_eq!(render("x{{#flag}}hidden{{/flag}}y", &vars), "xy");
    }

    #[test]
    fn test_no_html_escaping() {
        let vars = json!({ "blob": "{\"a\":\"<b>\"}" });
        assert_eq!(render("{{blob}}", &vars), "{\"a\":\"<b>\"}");
    }

    #[test]
    fn test_unclosed_section_errors() {
        let vars = json!({ "xs": [] });
        assert!(Renderer.render("{{#xs}}...", &vars).is_err());
    }

    #[test]
    fn test_array_index_lookup() {
        let vars = json!({ "xs": ["zero", "one"] });
        assert_eq!(render("{{xs.1}}", &vars), "one");
    }
}
