//! Asset manifest

use url::Url;

use crate::error::CoreError;

/// Static, ordered list of URLs to pre-populate into a cache generation.
///
/// Entries mix same-origin relative paths ("products.json", "/index.html")
/// and absolute cross-origin URLs (web fonts, icon stylesheets). The list
/// is fixed at construction; there is no runtime mutation.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    urls: Vec<String>,
}

impl AssetManifest {
    /// Build a manifest, dropping duplicates while keeping declaration order
    pub fn new(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut seen = Vec::new();
        for url in urls {
            let url = url.into();
            if !seen.contains(&url) {
                seen.push(url);
            }
        }
        Self { urls: seen }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Resolve every entry to an absolute URL against the given base origin
    pub fn resolve(&self, base: &Url) -> Result<Vec<Url>, CoreError> {
        self.urls
            .iter()
            .map(|entry| resolve_entry(base, entry))
            .collect()
    }
}

/// Resolve a manifest entry or intercepted request path to an absolute URL.
///
/// Absolute entries are parsed as-is, relative ones are joined against the
/// base. The fragment is dropped so that keys match the way the underlying
/// match primitive does.
pub fn resolve_entry(base: &Url, entry: &str) -> Result<Url, CoreError> {
    let mut url = if entry.starts_with("http://") || entry.starts_with("https://") {
        Url::parse(entry).map_err(|e| CoreError::Manifest(format!("{}: {}", entry, e)))?
    } else {
        base.join(entry)
            .map_err(|e| CoreError::Manifest(format!("{}: {}", entry, e)))?
    };
    url.set_fragment(None);
    Ok(url)
}
