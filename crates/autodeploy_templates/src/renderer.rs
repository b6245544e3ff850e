//! Placeholder substitution.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{TemplateError, TemplateResult};

/// Values available to a template, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Match {{variable_name}} pattern
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").expect("placeholder pattern is valid")
    })
}

/// Substitutes `{{name}}` placeholders in template text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render `content`, failing on the first placeholder without a value.
    pub fn render(
        &self,
        template: &str,
        content: &str,
        variables: &Variables,
    ) -> TemplateResult<String> {
        if let Some(field) = self.missing(content, variables).into_iter().next() {
            return Err(TemplateError::Render {
                template: template.to_string(),
                field,
            });
        }

        Ok(placeholder_pattern()
            .replace_all(content, |caps: &Captures| {
                variables.get(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned())
    }

    /// Placeholders in `content` with no value, in order of appearance.
    pub fn missing(&self, content: &str, variables: &Variables) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for caps in placeholder_pattern().captures_iter(content) {
            let name = &caps[1];
            if !variables.contains(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    /// Placeholder names referenced by `content`.
    pub fn placeholders(&self, content: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in placeholder_pattern().captures_iter(content) {
            if !names.iter().any(|n| n == &caps[1]) {
                names.push(caps[1].to_string());
            }
        }
        names
    }
}
