//! Form catalog for the Formgate Server
//!
//! The catalog is built once from a declarative YAML document listing
//! domains and their forms, reading each form's template body from disk.
//! Lookups resolve a requested identifier (either `domain/url` or a bare
//! `url`) against the catalog in insertion order. The catalog can be
//! rebuilt on demand; readers always observe a fully-built snapshot.

use arc_swap::ArcSwap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};

/// Catalog-declared hint controlling response content-type handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderType {
    /// Served via standard HTML type negotiation
    Static,
    /// Served with an explicit HTML content type header
    Dynamic,
}

impl RenderType {
    fn parse(raw: &str, key: &str) -> Self {
        match raw {
            "dynamic" => RenderType::Dynamic,
            "static" | "" => RenderType::Static,
            other => {
                warn!("Unknown render type '{}' for form {}, using static", other, key);
                RenderType::Static
            }
        }
    }
}

/// A renderable form entry, immutable after catalog load
#[derive(Debug, Clone)]
pub struct FormDefinition {
    /// Catalog key, `<domain>/<url>`
    pub key: String,
    /// Bare form URL within its domain
    pub url: String,
    /// Raw template body
    pub content: String,
    /// Render type hint
    pub render_type: RenderType,
}

/// Root of the catalog YAML document
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    domains: Vec<DomainEntry>,
}

#[derive(Debug, Deserialize)]
struct DomainEntry {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    forms: Vec<FormEntry>,
}

#[derive(Debug, Deserialize)]
struct FormEntry {
    name: String,
    url: String,
    path: String,
    #[serde(default, rename = "type")]
    form_type: String,
}

/// In-memory mapping from `domain/url` to form definitions
#[derive(Debug, Default)]
pub struct FormCatalog {
    /// Entries in catalog document order; lookup is a first-match scan
    forms: Vec<FormDefinition>,
    /// Domain name -> declared version
    versions: HashMap<String, String>,
}

impl FormCatalog {
    /// Build a catalog from a YAML document on disk
    ///
    /// Template paths are resolved relative to the document's directory and
    /// read from `<path>/form.html`. A template that cannot be read is
    /// logged and registered with an empty body so unrelated forms stay
    /// available; a document that cannot be read or parsed is fatal.
    pub async fn load(path: &Path) -> ServerResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ServerError::ConfigError(format!(
                "Failed to read catalog document {}: {}",
                path.display(),
                e
            ))
        })?;
        let document: CatalogDocument = serde_yaml::from_str(&raw)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut catalog = FormCatalog::default();

        for domain in &document.domains {
            if !domain.version.is_empty() {
                catalog
                    .versions
                    .insert(domain.name.clone(), domain.version.clone());
            }

            for form in &domain.forms {
                let key = format!("{}/{}", domain.name, form.url);
                let template_path = base_dir.join(&form.path).join("form.html");

                let content = match tokio::fs::read_to_string(&template_path).await {
                    Ok(content) => content,
                    Err(err) => {
                        warn!(
                            "Error loading form content for {}: {}",
                            template_path.display(),
                            err
                        );
                        String::new()
                    }
                };

                let definition = FormDefinition {
                    render_type: RenderType::parse(&form.form_type, &key),
                    url: form.url.clone(),
                    content,
                    key: key.clone(),
                };

                debug!("Registered form {} ({})", key, form.name);

                // Duplicate keys keep their original position, last value wins
                match catalog.forms.iter_mut().find(|f| f.key == key) {
                    Some(existing) => *existing = definition,
                    None => catalog.forms.push(definition),
                }
            }
        }

        info!(
            "Loaded form catalog with {} forms from {}",
            catalog.forms.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Resolve a requested identifier to a form definition
    ///
    /// Matches entries whose key equals the identifier, or whose key ends
    /// with `/` + the bare identifier. First match in document order wins.
    pub fn lookup(&self, requested: &str) -> Option<&FormDefinition> {
        let suffix = format!("/{}", requested);
        self.forms
            .iter()
            .find(|form| form.key == requested || form.key.ends_with(&suffix))
    }

    /// Declared version for a domain, if any
    pub fn domain_version(&self, domain: &str) -> Option<&str> {
        self.versions.get(domain).map(String::as_str)
    }

    /// Number of registered forms
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Whether the catalog holds no forms
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Shared handle to the current catalog snapshot
///
/// Reload rebuilds a complete catalog from the same document and swaps it
/// in atomically; readers in flight keep whatever snapshot they loaded.
#[derive(Debug)]
pub struct CatalogHandle {
    current: ArcSwap<FormCatalog>,
    path: PathBuf,
}

impl CatalogHandle {
    /// Wrap an initial catalog built from `path`
    pub fn new(catalog: FormCatalog, path: PathBuf) -> Self {
        Self {
            current: ArcSwap::from_pointee(catalog),
            path,
        }
    }

    /// Current catalog snapshot
    pub fn snapshot(&self) -> Arc<FormCatalog> {
        self.current.load_full()
    }

    /// Rebuild the catalog from its document and swap it in
    pub async fn reload(&self) -> ServerResult<usize> {
        let rebuilt = FormCatalog::load(&self.path).await?;
        let count = rebuilt.len();
        self.current.store(Arc::new(rebuilt));
        info!("Reloaded form catalog: {} forms", count);
        Ok(count)
    }
}
