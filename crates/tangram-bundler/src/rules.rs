/*
 * rules.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Table of scene fields that reference external asset files.
 */

//! Asset-bearing scene fields.
//!
//! Scene files reference external files from a fixed set of places. Each
//! place is described by an [`AssetRule`]: a field pattern plus the
//! [`AssetKind`] of the value found there. Layers nest arbitrarily deep, so
//! draw-rule textures are found by a dedicated recursive walk instead of a
//! pattern.
//!
//! [`visit_asset_fields`] drives both and hands every matching string value
//! to a callback together with its dotted field name, so merging (which
//! rewrites paths) and dependency collection (which records them) share one
//! traversal.

use tangram_scene::{SceneMap, SceneValue};

/// What a matched field refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// `fonts.<name>.url`, or `fonts.<name>[*].url` for weighted faces
    FontUrl,
    /// `textures.<name>.url`
    TextureUrl,
    /// `styles.<name>.texture`
    StyleTexture,
    /// `styles.<name>.material.<property>.texture`
    MaterialTexture,
    /// `styles.<name>.shaders.uniforms.<uniform>`
    ShaderUniform,
    /// `layers.<layer>...draw.<rule>.texture`
    DrawTexture,
}

impl AssetKind {
    /// Texture slots may hold either a file path or the name of an entry in
    /// the top-level `textures` map. `url` fields are always paths.
    pub fn is_texture_slot(&self) -> bool {
        !matches!(self, AssetKind::FontUrl | AssetKind::TextureUrl)
    }

    /// Whether an unresolved value (neither an existing file nor a texture
    /// name) is still reported as a missing dependency.
    ///
    /// Uniform strings that resolve to nothing are dropped.
    pub fn reports_unresolved(&self) -> bool {
        !matches!(self, AssetKind::ShaderUniform)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::FontUrl => "font",
            AssetKind::TextureUrl => "texture",
            AssetKind::StyleTexture => "style texture",
            AssetKind::MaterialTexture => "material texture",
            AssetKind::ShaderUniform => "shader uniform",
            AssetKind::DrawTexture => "draw texture",
        }
    }
}

/// One step of a field pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A fixed map key
    Key(&'static str),
    /// Every key of a map
    AnyKey,
    /// Any of a fixed set of map keys
    OneOf(&'static [&'static str]),
    /// Every item of a sequence; a non-sequence node matches as itself
    EachItem,
}

/// A field pattern and the kind of asset it locates.
#[derive(Debug, Clone, Copy)]
pub struct AssetRule {
    pub kind: AssetKind,
    pub pattern: &'static [Segment],
}

/// Material properties that can carry a texture.
pub const MATERIAL_PROPERTIES: &[&str] = &["emission", "ambient", "diffuse", "specular", "normal"];

/// Layer keys that never contain sublayers or draw rules.
pub const STRUCTURAL_LAYER_KEYS: &[&str] = &["data", "filter", "visible", "enabled"];

pub const LAYERS_KEY: &str = "layers";
pub const DRAW_KEY: &str = "draw";
pub const TEXTURE_KEY: &str = "texture";
pub const TEXTURES_KEY: &str = "textures";
pub const URL_KEY: &str = "url";

use Segment::{AnyKey, EachItem, Key, OneOf};

/// Asset fields outside of `layers`.
pub const ASSET_RULES: &[AssetRule] = &[
    AssetRule {
        kind: AssetKind::FontUrl,
        pattern: &[Key("fonts"), AnyKey, EachItem, Key(URL_KEY)],
    },
    AssetRule {
        kind: AssetKind::TextureUrl,
        pattern: &[Key(TEXTURES_KEY), AnyKey, Key(URL_KEY)],
    },
    AssetRule {
        kind: AssetKind::StyleTexture,
        pattern: &[Key("styles"), AnyKey, Key(TEXTURE_KEY)],
    },
    AssetRule {
        kind: AssetKind::MaterialTexture,
        pattern: &[
            Key("styles"),
            AnyKey,
            Key("material"),
            OneOf(MATERIAL_PROPERTIES),
            Key(TEXTURE_KEY),
        ],
    },
    AssetRule {
        kind: AssetKind::ShaderUniform,
        pattern: &[Key("styles"), AnyKey, Key("shaders"), Key("uniforms"), AnyKey],
    },
];

/// A string field that references an asset.
#[derive(Debug)]
pub struct AssetSite<'a> {
    /// Dotted field name, e.g. `fonts.sans[0].url`
    pub field: String,
    pub kind: AssetKind,
    /// The string scalar holding the reference
    pub value: &'a mut SceneValue,
}

impl AssetSite<'_> {
    /// The referenced path or texture name.
    pub fn reference(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }

    /// Replace the reference in place.
    pub fn set_reference(&mut self, reference: impl Into<String>) {
        *self.value = SceneValue::from(reference.into());
    }
}

/// Call `f` for every asset-referencing string in `scene`.
///
/// Fields are visited in rule order, then layers. Non-string values at a
/// matching position are skipped; a uniform holding a list visits each
/// string item.
pub fn visit_asset_fields<F>(scene: &mut SceneValue, mut f: F)
where
    F: FnMut(AssetSite<'_>),
{
    let mut field = Vec::new();
    for rule in ASSET_RULES {
        visit_pattern(scene, rule.pattern, rule.kind, &mut field, &mut f);
    }

    if let Some(SceneValue::Map(layers)) = scene.get_mut(LAYERS_KEY) {
        field.push(LAYERS_KEY.to_string());
        for (name, layer) in layers.iter_mut() {
            if let SceneValue::Map(layer) = layer {
                field.push(name.clone());
                visit_layer(layer, &mut field, &mut f);
                field.pop();
            }
        }
        field.pop();
    }
}

fn visit_pattern<F>(
    node: &mut SceneValue,
    pattern: &[Segment],
    kind: AssetKind,
    field: &mut Vec<String>,
    f: &mut F,
) where
    F: FnMut(AssetSite<'_>),
{
    let Some((head, rest)) = pattern.split_first() else {
        visit_leaf(node, kind, field, f);
        return;
    };

    match head {
        Key(key) => visit_key(node, key, rest, kind, field, f),
        OneOf(keys) => {
            for key in keys.iter() {
                visit_key(node, key, rest, kind, field, f);
            }
        }
        AnyKey => {
            if let SceneValue::Map(map) = node {
                for (key, child) in map.iter_mut() {
                    field.push(key.clone());
                    visit_pattern(child, rest, kind, field, f);
                    field.pop();
                }
            }
        }
        EachItem => match node {
            SceneValue::Sequence(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    field.push(format!("[{}]", i));
                    visit_pattern(item, rest, kind, field, f);
                    field.pop();
                }
            }
            other => visit_pattern(other, rest, kind, field, f),
        },
    }
}

fn visit_key<F>(
    node: &mut SceneValue,
    key: &str,
    rest: &[Segment],
    kind: AssetKind,
    field: &mut Vec<String>,
    f: &mut F,
) where
    F: FnMut(AssetSite<'_>),
{
    if let Some(child) = node.get_mut(key) {
        field.push(key.to_string());
        visit_pattern(child, rest, kind, field, f);
        field.pop();
    }
}

fn visit_leaf<F>(node: &mut SceneValue, kind: AssetKind, field: &mut Vec<String>, f: &mut F)
where
    F: FnMut(AssetSite<'_>),
{
    if let Some(blank) = is_blank(node) {
        if blank {
            return;
        }
        f(AssetSite {
            field: field_name(field),
            kind,
            value: node,
        });
        return;
    }

    // Uniforms may hold a list of textures
    if kind != AssetKind::ShaderUniform {
        return;
    }
    if let SceneValue::Sequence(items) = node {
        for (i, item) in items.iter_mut().enumerate() {
            if is_blank(item) == Some(false) {
                field.push(format!("[{}]", i));
                f(AssetSite {
                    field: field_name(field),
                    kind,
                    value: item,
                });
                field.pop();
            }
        }
    }
}

/// `None` for a non-string node, else whether the string is empty or whitespace.
fn is_blank(node: &SceneValue) -> Option<bool> {
    node.as_str().map(|s| s.trim().is_empty())
}

/// Walk one layer: its draw rules, then its sublayers.
fn visit_layer<F>(layer: &mut SceneMap, field: &mut Vec<String>, f: &mut F)
where
    F: FnMut(AssetSite<'_>),
{
    for (key, value) in layer.iter_mut() {
        if STRUCTURAL_LAYER_KEYS.contains(&key.as_str()) {
            continue;
        }
        let SceneValue::Map(child) = value else {
            continue;
        };

        field.push(key.clone());
        if key == DRAW_KEY {
            for (rule_name, rule) in child.iter_mut() {
                if let Some(texture) = rule.get_mut(TEXTURE_KEY) {
                    field.push(rule_name.clone());
                    field.push(TEXTURE_KEY.to_string());
                    visit_leaf(texture, AssetKind::DrawTexture, field, f);
                    field.pop();
                    field.pop();
                }
            }
        } else {
            visit_layer(child, field, f);
        }
        field.pop();
    }
}

/// Join field parts with dots, attaching `[i]` index parts directly.
fn field_name(parts: &[String]) -> String {
    let mut name = String::new();
    for part in parts {
        if !name.is_empty() && !part.starts_with('[') {
            name.push('.');
        }
        name.push_str(part);
    }
    name
}

/// Top-level `textures` entries that have a string `url`, as (name, url).
pub fn texture_urls(scene: &SceneValue) -> Vec<(String, String)> {
    scene
        .get(TEXTURES_KEY)
        .and_then(SceneValue::as_map)
        .map(|textures| {
            textures
                .iter()
                .filter_map(|(name, texture)| {
                    texture
                        .get(URL_KEY)
                        .and_then(SceneValue::as_str)
                        .filter(|url| !url.trim().is_empty())
                        .map(|url| (name.clone(), url.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}
