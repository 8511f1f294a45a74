//! Icon specifications and cheap content proxies
//!
//! An icon comes from exactly one of three sources: a named platform symbol,
//! raw glyph bytes, or an image asset path. The source is modeled as a sum
//! type so that switching away from one kind and back is always observable
//! as a change (three nullable fields compared in sequence would skip the
//! re-send when only the dominant field was compared).
//!
//! Binary payloads are never compared by identity: [`GlyphData`] carries a
//! `(length, hash)` content key computed once at construction, so snapshot
//! equality stays O(1) no matter how large the glyph is.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// RGBA tint applied to an icon before handing it to the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Tint {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Pack as 0xAARRGGBB for the wire
    pub fn argb32(&self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// Rendering mode for layered platform symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
    Monochrome,
    Hierarchical,
    Palette,
    Multicolor,
}

impl RenderMode {
    pub fn wire_name(&self) -> &'static str {
        match self {
            RenderMode::Monochrome => "monochrome",
            RenderMode::Hierarchical => "hierarchical",
            RenderMode::Palette => "palette",
            RenderMode::Multicolor => "multicolor",
        }
    }
}

/// Raw glyph bytes with a precomputed content key
///
/// Equality is by `(len, hash)`, never by pointer identity, so two glyphs
/// decoded from the same source compare equal even across rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphData {
    #[serde(skip, default = "empty_bytes")]
    bytes: Arc<[u8]>,
    len: usize,
    hash: u64,
}

fn empty_bytes() -> Arc<[u8]> {
    Arc::from(Vec::new())
}

impl GlyphData {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            len: bytes.len(),
            hash: hasher.finish(),
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn content_hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for GlyphData {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.hash == other.hash
    }
}

impl Eq for GlyphData {}

impl Hash for GlyphData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.hash.hash(state);
    }
}

/// Which of the three icon sources a spec uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IconKind {
    Symbol,
    Glyph,
    Asset,
}

impl IconKind {
    pub fn wire_name(&self) -> &'static str {
        match self {
            IconKind::Symbol => "symbol",
            IconKind::Glyph => "glyph",
            IconKind::Asset => "asset",
        }
    }
}

/// Declarative icon source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IconSpec {
    /// Named platform symbol (resolved by the host OS)
    Symbol {
        name: String,
        #[serde(default)]
        size: Option<f64>,
        #[serde(default)]
        tint: Option<Tint>,
        #[serde(default)]
        mode: Option<RenderMode>,
    },
    /// Pre-rendered glyph bytes
    Glyph {
        data: GlyphData,
        #[serde(default)]
        size: Option<f64>,
        #[serde(default)]
        tint: Option<Tint>,
    },
    /// Image asset looked up through the asset resolver
    Asset {
        path: String,
        #[serde(default)]
        size: Option<f64>,
        #[serde(default)]
        tint: Option<Tint>,
    },
}

impl IconSpec {
    pub fn symbol(name: impl Into<String>) -> Self {
        IconSpec::Symbol {
            name: name.into(),
            size: None,
            tint: None,
            mode: None,
        }
    }

    pub fn asset(path: impl Into<String>) -> Self {
        IconSpec::Asset {
            path: path.into(),
            size: None,
            tint: None,
        }
    }

    pub fn glyph(bytes: impl Into<Vec<u8>>) -> Self {
        IconSpec::Glyph {
            data: GlyphData::new(bytes),
            size: None,
            tint: None,
        }
    }

    pub fn kind(&self) -> IconKind {
        match self {
            IconSpec::Symbol { .. } => IconKind::Symbol,
            IconSpec::Glyph { .. } => IconKind::Glyph,
            IconSpec::Asset { .. } => IconKind::Asset,
        }
    }

    pub fn size(&self) -> Option<f64> {
        match self {
            IconSpec::Symbol { size, .. }
            | IconSpec::Glyph { size, .. }
            | IconSpec::Asset { size, .. } => *size,
        }
    }

    pub fn tint(&self) -> Option<Tint> {
        match self {
            IconSpec::Symbol { tint, .. }
            | IconSpec::Glyph { tint, .. }
            | IconSpec::Asset { tint, .. } => *tint,
        }
    }

    /// Cheap comparable form captured into snapshots
    pub fn proxy(&self) -> IconProxy {
        match self {
            IconSpec::Symbol {
                name,
                size,
                tint,
                mode,
            } => IconProxy {
                kind: IconKind::Symbol,
                identity: name.clone(),
                byte_len: None,
                content_hash: None,
                size: *size,
                tint: *tint,
                mode: *mode,
            },
            IconSpec::Glyph { data, size, tint } => IconProxy {
                kind: IconKind::Glyph,
                identity: String::new(),
                byte_len: Some(data.len()),
                content_hash: Some(data.content_hash()),
                size: *size,
                tint: *tint,
                mode: None,
            },
            IconSpec::Asset { path, size, tint } => IconProxy {
                kind: IconKind::Asset,
                identity: path.clone(),
                byte_len: None,
                content_hash: None,
                size: *size,
                tint: *tint,
                mode: None,
            },
        }
    }

    /// Build the wire params describing this icon to the peer
    pub fn wire_params(&self) -> Value {
        match self {
            IconSpec::Symbol {
                name,
                size,
                tint,
                mode,
            } => json!({
                "kind": "symbol",
                "name": name,
                "size": size,
                "tint": tint.map(|t| t.argb32()),
                "mode": mode.map(|m| m.wire_name()),
            }),
            IconSpec::Glyph { data, size, tint } => json!({
                "kind": "glyph",
                "byteLength": data.len(),
                "contentHash": data.content_hash(),
                "size": size,
                "tint": tint.map(|t| t.argb32()),
            }),
            IconSpec::Asset { path, size, tint } => json!({
                "kind": "asset",
                "path": path,
                "size": size,
                "tint": tint.map(|t| t.argb32()),
            }),
        }
    }
}

/// Flat, cheaply comparable description of an icon
///
/// This is what snapshots store instead of rendered bytes, keeping diff
/// comparisons O(1) even during per-frame rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconProxy {
    pub kind: IconKind,
    pub identity: String,
    pub byte_len: Option<usize>,
    pub content_hash: Option<u64>,
    pub size: Option<f64>,
    pub tint: Option<Tint>,
    pub mode: Option<RenderMode>,
}

/// Resolver output: the proxy plus (optionally) the rendered payload
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedIcon {
    pub proxy: IconProxy,
    pub data: Option<GlyphData>,
}

impl RenderedIcon {
    /// Placeholder used when asset resolution fails (degraded rendering)
    pub fn placeholder(spec: &IconSpec) -> Self {
        Self {
            proxy: spec.proxy(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_equality_is_by_content() {
        let a = GlyphData::new(vec![1, 2, 3, 4]);
        let b = GlyphData::new(vec![1, 2, 3, 4]);
        let c = GlyphData::new(vec![1, 2, 3, 5]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_glyph_equality_ignores_allocation() {
        let original = vec![9u8; 1024];
        let a = GlyphData::new(original.clone());
        let b = GlyphData::new(original);
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_icon_spec_kind() {
        assert_eq!(IconSpec::symbol("house").kind(), IconKind::Symbol);
        assert_eq!(IconSpec::asset("icons/a.png").kind(), IconKind::Asset);
        assert_eq!(IconSpec::glyph(vec![0u8; 8]).kind(), IconKind::Glyph);
    }

    #[test]
    fn test_icon_spec_structural_equality() {
        let a = IconSpec::symbol("house");
        let b = IconSpec::symbol("house");
        let c = IconSpec::symbol("gear");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_proxy_differs_across_kinds() {
        // Same nominal identity, different source kind: must not compare equal
        let symbol = IconSpec::symbol("house").proxy();
        let asset = IconSpec::asset("house").proxy();
        assert_ne!(symbol, asset);
    }

    #[test]
    fn test_glyph_proxy_carries_content_key() {
        let spec = IconSpec::glyph(vec![7u8; 32]);
        let proxy = spec.proxy();
        assert_eq!(proxy.byte_len, Some(32));
        assert!(proxy.content_hash.is_some());
    }

    #[test]
    fn test_tint_argb32_packing() {
        let tint = Tint {
            r: 0x11,
            g: 0x22,
            b: 0x33,
            a: 0xff,
        };
        assert_eq!(tint.argb32(), 0xff112233);
    }

    #[test]
    fn test_symbol_wire_params() {
        let spec = IconSpec::Symbol {
            name: "magnifyingglass".into(),
            size: Some(17.0),
            tint: Some(Tint::rgb(0, 0, 0)),
            mode: Some(RenderMode::Hierarchical),
        };
        let params = spec.wire_params();
        assert_eq!(params["kind"], "symbol");
        assert_eq!(params["name"], "magnifyingglass");
        assert_eq!(params["mode"], "hierarchical");
        assert_eq!(params["size"], 17.0);
    }

    #[test]
    fn test_glyph_wire_params_use_proxy_not_bytes() {
        let spec = IconSpec::glyph(vec![1u8; 2048]);
        let params = spec.wire_params();
        assert_eq!(params["byteLength"], 2048);
        assert!(params.get("bytes").is_none());
    }
}
