//! Prompt templates with `{{name}}` placeholders

use crate::{KisanError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([a-z_][a-z0-9_]*)\s*\}\}").expect("placeholder pattern is a valid regex")
    })
}

/// A fixed instruction text with named placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// Placeholder names in order of first appearance, without duplicates
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut seen = BTreeSet::new();
        placeholder_regex()
            .captures_iter(self.text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Substitute every placeholder; a placeholder without a value is an error
    pub fn render(&self, vars: &[(&str, String)]) -> Result<String> {
        let mut missing: Option<String> = None;
        let rendered = placeholder_regex().replace_all(self.text, |caps: &regex::Captures| {
            let key = &caps[1];
            match vars.iter().find(|(name, _)| *name == key) {
                Some((_, value)) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| key.to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(key) => Err(KisanError::template(format!(
                "template '{}' has no value for placeholder '{}'",
                self.name, key
            ))),
            None => Ok(rendered.into_owned()),
        }
    }
}
