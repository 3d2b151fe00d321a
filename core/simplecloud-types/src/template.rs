//! Templates: file trees copied into a service before it starts.

use crate::ids::NameKey;
use crate::value::{CacheValue, Updater};
use serde::{Deserialize, Serialize};

/// A template definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Templates whose files are copied first, in order.
    #[serde(default)]
    pub inherited_template_names: Vec<String>,
    /// Cloud modules copied into services using this template.
    #[serde(default)]
    pub module_names_to_copy: Vec<String>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherited_template_names: Vec::new(),
            module_names_to_copy: Vec::new(),
        }
    }

    #[must_use]
    pub fn updater(&self) -> TemplateUpdater {
        TemplateUpdater::new(self.clone())
    }
}

impl CacheValue for Template {
    type Key = NameKey;

    const TYPE_NAME: &'static str = "template";

    fn cache_key(&self) -> NameKey {
        NameKey::new(&self.name)
    }
}

/// Staged changes to a [`Template`].
///
/// Names are compared case-insensitively; adding a name that is already
/// present replaces the old spelling and moves it to the end.
#[derive(Debug, Clone)]
pub struct TemplateUpdater {
    baseline: Template,
    inherited_template_names: Option<Vec<String>>,
    module_names_to_copy: Option<Vec<String>>,
}

impl TemplateUpdater {
    pub fn new(baseline: Template) -> Self {
        Self {
            baseline,
            inherited_template_names: None,
            module_names_to_copy: None,
        }
    }

    pub fn add_inherited_template(mut self, name: impl Into<String>) -> Self {
        let names = self
            .inherited_template_names
            .get_or_insert_with(|| self.baseline.inherited_template_names.clone());
        replace_name(names, name.into());
        self
    }

    pub fn remove_inherited_template(mut self, name: &str) -> Self {
        let names = self
            .inherited_template_names
            .get_or_insert_with(|| self.baseline.inherited_template_names.clone());
        remove_name(names, name);
        self
    }

    pub fn add_module_to_copy(mut self, name: impl Into<String>) -> Self {
        let names = self
            .module_names_to_copy
            .get_or_insert_with(|| self.baseline.module_names_to_copy.clone());
        replace_name(names, name.into());
        self
    }

    pub fn remove_module_to_copy(mut self, name: &str) -> Self {
        let names = self
            .module_names_to_copy
            .get_or_insert_with(|| self.baseline.module_names_to_copy.clone());
        remove_name(names, name);
        self
    }
}

fn replace_name(names: &mut Vec<String>, name: String) {
    remove_name(names, &name);
    names.push(name);
}

fn remove_name(names: &mut Vec<String>, name: &str) {
    names.retain(|existing| !existing.eq_ignore_ascii_case(name));
}

impl Updater for TemplateUpdater {
    type Value = Template;

    fn baseline(&self) -> &Template {
        &self.baseline
    }

    fn merge(&self) -> Template {
        Template {
            name: self.baseline.name.clone(),
            inherited_template_names: self
                .inherited_template_names
                .clone()
                .unwrap_or_else(|| self.baseline.inherited_template_names.clone()),
            module_names_to_copy: self
                .module_names_to_copy
                .clone()
                .unwrap_or_else(|| self.baseline.module_names_to_copy.clone()),
        }
    }

    fn has_changes(&self) -> bool {
        self.inherited_template_names.is_some() || self.module_names_to_copy.is_some()
    }
}
