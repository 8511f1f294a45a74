//! Icon resolution seam
//!
//! Rasterization itself belongs to the embedder; this module owns the trait
//! seam, the idempotence-guaranteeing cache, and the pixel-density path
//! convention. Resolution failures never propagate: a missing asset degrades
//! to placeholder rendering.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

use mirrorview_core::prelude::*;
use mirrorview_core::{IconSpec, RenderedIcon};

/// Resolves an icon spec to rendered bytes.
///
/// Implementations must be idempotent for a given spec; wrap a
/// non-idempotent resolver in [`CachingResolver`] to get that guarantee.
#[cfg_attr(test, automock)]
pub trait IconResolver: Send + Sync {
    fn resolve(&self, spec: &IconSpec) -> Result<RenderedIcon>;
}

/// Caches resolutions by spec identity so the inner resolver runs at most
/// once per distinct spec.
pub struct CachingResolver<R> {
    inner: R,
    cache: Mutex<HashMap<String, RenderedIcon>>,
}

impl<R: IconResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve through the cache, degrading to a placeholder on failure.
    ///
    /// Failures are not cached: a later resolve of the same spec retries
    /// the inner resolver (the asset may appear after a hot reload).
    pub fn resolve(&self, spec: &IconSpec) -> RenderedIcon {
        let key = match serde_json::to_string(&spec.proxy()) {
            Ok(key) => key,
            Err(e) => {
                warn!("Unkeyable icon spec: {}", e);
                return self.resolve_uncached(spec);
            }
        };

        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        match self.inner.resolve(spec) {
            Ok(rendered) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(key, rendered.clone());
                }
                rendered
            }
            Err(e) => {
                warn!("Icon resolution failed ({}), using placeholder", e);
                RenderedIcon::placeholder(spec)
            }
        }
    }

    fn resolve_uncached(&self, spec: &IconSpec) -> RenderedIcon {
        match self.inner.resolve(spec) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Icon resolution failed ({}), using placeholder", e);
                RenderedIcon::placeholder(spec)
            }
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

/// Rewrite an asset path for a pixel density scale.
///
/// `icons/home.png` at density 2 becomes `icons/home@2x.png`. Density 1 (or
/// anything the path cannot express, like a missing file stem) falls back to
/// the base path; the lookup itself is the embedder's job and a miss there
/// degrades the same way.
pub fn resolve_pixel_density_variant(path: &str, density: u32) -> String {
    if density <= 1 {
        return path.to_string();
    }

    let p = Path::new(path);
    let (Some(stem), Some(ext)) = (
        p.file_stem().and_then(|s| s.to_str()),
        p.extension().and_then(|e| e.to_str()),
    ) else {
        debug!("Cannot derive density variant for {:?}, using base path", path);
        return path.to_string();
    };

    let variant = format!("{}@{}x.{}", stem, density, ext);
    match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.join(variant).to_string_lossy().into_owned()
        }
        _ => variant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorview_core::Error;

    #[test]
    fn test_density_variant_basic() {
        assert_eq!(
            resolve_pixel_density_variant("icons/home.png", 2),
            "icons/home@2x.png"
        );
        assert_eq!(
            resolve_pixel_density_variant("icons/home.png", 3),
            "icons/home@3x.png"
        );
    }

    #[test]
    fn test_density_one_is_base_path() {
        assert_eq!(resolve_pixel_density_variant("icons/home.png", 1), "icons/home.png");
        assert_eq!(resolve_pixel_density_variant("icons/home.png", 0), "icons/home.png");
    }

    #[test]
    fn test_density_variant_falls_back_on_unusable_path() {
        // No extension to splice the suffix before
        assert_eq!(resolve_pixel_density_variant("noext", 2), "noext");
    }

    #[test]
    fn test_density_variant_bare_filename() {
        assert_eq!(resolve_pixel_density_variant("home.png", 2), "home@2x.png");
    }

    #[test]
    fn test_caching_resolver_calls_inner_once_per_spec() {
        let mut mock = MockIconResolver::new();
        mock.expect_resolve()
            .times(1)
            .returning(|spec| Ok(RenderedIcon::placeholder(spec)));

        let resolver = CachingResolver::new(mock);
        let spec = IconSpec::symbol("house");

        let first = resolver.resolve(&spec);
        let second = resolver.resolve(&spec);
        assert_eq!(first.proxy, second.proxy);
        assert_eq!(resolver.cached_count(), 1);
    }

    #[test]
    fn test_distinct_specs_resolve_separately() {
        let mut mock = MockIconResolver::new();
        mock.expect_resolve()
            .times(2)
            .returning(|spec| Ok(RenderedIcon::placeholder(spec)));

        let resolver = CachingResolver::new(mock);
        resolver.resolve(&IconSpec::symbol("house"));
        resolver.resolve(&IconSpec::symbol("gear"));
        assert_eq!(resolver.cached_count(), 2);
    }

    #[test]
    fn test_missing_asset_degrades_to_placeholder() {
        let mut mock = MockIconResolver::new();
        mock.expect_resolve()
            .returning(|_| Err(Error::asset_not_found("icons/missing.png")));

        let resolver = CachingResolver::new(mock);
        let rendered = resolver.resolve(&IconSpec::asset("icons/missing.png"));
        assert!(rendered.data.is_none());
        // Failures are not cached
        assert_eq!(resolver.cached_count(), 0);
    }

    #[test]
    fn test_failure_then_success_retries_inner() {
        let mut mock = MockIconResolver::new();
        let mut first = true;
        mock.expect_resolve().times(2).returning(move |spec| {
            if std::mem::take(&mut first) {
                Err(Error::asset_not_found("icons/late.png"))
            } else {
                Ok(RenderedIcon::placeholder(spec))
            }
        });

        let resolver = CachingResolver::new(mock);
        let spec = IconSpec::asset("icons/late.png");
        resolver.resolve(&spec);
        resolver.resolve(&spec);
        assert_eq!(resolver.cached_count(), 1);
    }
}
