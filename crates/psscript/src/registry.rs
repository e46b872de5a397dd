//! Template registry.

use crate::error::{Error, Result};
use crate::hyperv;
use crate::template::{Script, ScriptTemplate, Verb};
use serde::Serialize;
use std::collections::HashMap;

/// The set of templates available to a client, keyed by verb.
///
/// Registries are built explicitly and passed to whoever renders scripts.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<Verb, ScriptTemplate>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the Hyper-V virtual disk templates.
    pub fn hyperv() -> Self {
        let mut registry = Self::new();
        for template in hyperv::ALL {
            registry.register(template);
        }
        registry
    }

    /// Register a template, returning the one it replaces, if any.
    pub fn register(&mut self, template: ScriptTemplate) -> Option<ScriptTemplate> {
        self.templates.insert(template.verb(), template)
    }

    /// Look up the template for a verb.
    pub fn get(&self, verb: Verb) -> Result<&ScriptTemplate> {
        self.templates.get(&verb).ok_or(Error::MissingTemplate(verb))
    }

    /// Render the template registered for `verb`.
    pub fn render<A: Serialize + ?Sized>(&self, verb: Verb, args: &A) -> Result<Script> {
        self.get(verb)?.render(args)
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if no template is registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
