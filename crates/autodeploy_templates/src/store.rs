//! Template text lookup.
//!
//! Built-in templates are compiled into the binary. An override directory
//! laid out as `<family>/<file>.tmpl` replaces individual templates when the
//! store is built; rendering itself never touches the filesystem.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};

/// Directory holding templates shared by every family.
pub const COMMON: &str = "common";

/// Directory holding partial templates spliced into artifacts.
pub const PARTIALS: &str = "partials";

const BUILTIN: &[(&str, &str)] = &[
    ("common/provider.tf", include_str!("../templates/common/provider.tf.tmpl")),
    ("common/network.tf", include_str!("../templates/common/network.tf.tmpl")),
    ("common/variables.tf", include_str!("../templates/common/variables.tf.tmpl")),
    ("partials/database", include_str!("../templates/partials/database.tmpl")),
    ("partials/encryption", include_str!("../templates/partials/encryption.tmpl")),
    ("vm/compute.tf", include_str!("../templates/vm/compute.tf.tmpl")),
    ("vm/security.tf", include_str!("../templates/vm/security.tf.tmpl")),
    ("vm/outputs.tf", include_str!("../templates/vm/outputs.tf.tmpl")),
    ("serverless/compute.tf", include_str!("../templates/serverless/compute.tf.tmpl")),
    ("serverless/security.tf", include_str!("../templates/serverless/security.tf.tmpl")),
    ("serverless/outputs.tf", include_str!("../templates/serverless/outputs.tf.tmpl")),
    ("container/compute.tf", include_str!("../templates/container/compute.tf.tmpl")),
    ("container/security.tf", include_str!("../templates/container/security.tf.tmpl")),
    ("container/outputs.tf", include_str!("../templates/container/outputs.tf.tmpl")),
    ("static/compute.tf", include_str!("../templates/static/compute.tf.tmpl")),
    ("static/network.tf", include_str!("../templates/static/network.tf.tmpl")),
    ("static/security.tf", include_str!("../templates/static/security.tf.tmpl")),
    ("static/outputs.tf", include_str!("../templates/static/outputs.tf.tmpl")),
];

/// Template texts keyed by `<family>/<file>`.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: BTreeMap<String, String>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateStore {
    /// Create a store with no templates.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Create a store holding the built-in templates.
    pub fn builtin() -> Self {
        let templates = BUILTIN
            .iter()
            .map(|(key, text)| (key.to_string(), text.to_string()))
            .collect();
        Self { templates }
    }

    /// Replace templates with the `*.tmpl` files found under `dir`.
    pub fn with_override_dir(mut self, dir: &Path) -> TemplateResult<Self> {
        if !dir.is_dir() {
            return Err(TemplateError::InvalidOverride {
                path: dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let mut replaced = 0;
        for entry in WalkDir::new(dir)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(key) = override_key(dir, path) else {
                debug!("Skipping non-template file {:?}", path);
                continue;
            };
            let content = std::fs::read_to_string(path)?;
            debug!("Template override {} from {:?}", key, path);
            self.templates.insert(key, content);
            replaced += 1;
        }

        info!("Loaded {} template override(s) from {:?}", replaced, dir);
        Ok(self)
    }

    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) {
        self.templates.insert(key.into(), content.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Find `file` for `family`, falling back to the common template.
    pub fn resolve(&self, family: &str, file: &str) -> Option<(String, &str)> {
        [format!("{}/{}", family, file), format!("{}/{}", COMMON, file)]
            .into_iter()
            .find_map(|key| self.get(&key).map(|text| (key.clone(), text)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

/// `<dir>/<family>/<file>.tmpl` maps to `<family>/<file>`.
fn override_key(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let mut parts = relative.iter().map(|p| p.to_string_lossy());
    let family = parts.next()?;
    let file = parts.next()?;
    let file = file.strip_suffix(".tmpl")?;
    Some(format!("{}/{}", family, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_resolution_falls_back_to_common() {
        let store = TemplateStore::builtin();

        let (key, _) = store.resolve("vm", "network.tf").unwrap();
        assert_eq!(key, "common/network.tf");

        let (key, _) = store.resolve("static", "network.tf").unwrap();
        assert_eq!(key, "static/network.tf");

        assert!(store.resolve("vm", "main.tf").is_none());
    }

    #[test]
    fn test_override_dir_replaces_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vm")).unwrap();
        std::fs::write(dir.path().join("vm/outputs.tf.tmpl"), "# custom {{name_prefix}}").unwrap();
        std::fs::write(dir.path().join("vm/README.md"), "ignored").unwrap();

        let store = TemplateStore::builtin()
            .with_override_dir(dir.path())
            .unwrap();
        assert_eq!(store.get("vm/outputs.tf"), Some("# custom {{name_prefix}}"));
        assert!(store.get("vm/README.md").is_none());
    }

    #[test]
    fn test_missing_override_dir() {
        let result = TemplateStore::builtin().with_override_dir(Path::new("/nonexistent/templates"));
        assert!(matches!(result, Err(TemplateError::InvalidOverride { .. })));
    }
}
