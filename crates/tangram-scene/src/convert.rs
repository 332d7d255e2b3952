//! Conversion between YAML text, `yaml_rust2::Yaml` and `SceneValue`.

use crate::value::{SceneMap, SceneValue};
use crate::{Error, Result};
use yaml_rust2::{Yaml, YamlEmitter, YamlLoader};

/// Parse a scene document from a string.
///
/// Only the first YAML document of the input is used. An input with no
/// document at all (empty file, only comments) yields an empty scene.
///
/// # Example
///
/// ```rust
/// use tangram_scene::parse;
///
/// let scene = parse("import: base.yaml").unwrap();
/// assert!(scene.is_map());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or if the root is not a mapping.
pub fn parse(content: &str) -> Result<SceneValue> {
    parse_impl(content, None)
}

/// Parse a scene document, recording `filename` in any error.
pub fn parse_file(content: &str, filename: &str) -> Result<SceneValue> {
    parse_impl(content, Some(filename))
}

fn parse_impl(content: &str, filename: Option<&str>) -> Result<SceneValue> {
    let documents =
        YamlLoader::load_from_str(content).map_err(|err| Error::parse(err, filename))?;

    let Some(root) = documents.into_iter().next() else {
        return Ok(SceneValue::new_map());
    };

    match scene_value_from_yaml(root) {
        value @ SceneValue::Map(_) => Ok(value),
        // A file holding only `---` or `~` is an empty scene
        SceneValue::Scalar(Yaml::Null) => Ok(SceneValue::new_map()),
        other => Err(Error::InvalidStructure {
            message: format!(
                "scene root must be a mapping, found {}",
                describe(&other)
            ),
            file: filename.map(str::to_string),
        }),
    }
}

fn describe(value: &SceneValue) -> &'static str {
    match value {
        SceneValue::Scalar(_) => "a scalar",
        SceneValue::Sequence(_) => "a sequence",
        SceneValue::Map(_) => "a mapping",
    }
}

/// Convert a `yaml_rust2::Yaml` tree to a `SceneValue` tree.
///
/// Scalar mapping keys are stringified; entries with sequence or mapping keys
/// are dropped since no scene field can address them.
pub fn scene_value_from_yaml(yaml: Yaml) -> SceneValue {
    match yaml {
        Yaml::Array(items) => {
            SceneValue::Sequence(items.into_iter().map(scene_value_from_yaml).collect())
        }
        Yaml::Hash(hash) => {
            let entries: SceneMap = hash
                .into_iter()
                .filter_map(|(key, value)| {
                    key_to_string(&key).map(|key| (key, scene_value_from_yaml(value)))
                })
                .collect();
            SceneValue::Map(entries)
        }
        // Aliases are resolved by the loader; anything left over carries no data
        Yaml::Alias(_) | Yaml::BadValue => SceneValue::Scalar(Yaml::Null),
        scalar => SceneValue::Scalar(scalar),
    }
}

fn key_to_string(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Real(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert a `SceneValue` tree back to a `yaml_rust2::Yaml` tree.
pub fn to_yaml(value: &SceneValue) -> Yaml {
    match value {
        SceneValue::Scalar(yaml) => yaml.clone(),
        SceneValue::Sequence(items) => Yaml::Array(items.iter().map(to_yaml).collect()),
        SceneValue::Map(map) => Yaml::Hash(
            map.iter()
                .map(|(key, value)| (Yaml::String(key.clone()), to_yaml(value)))
                .collect(),
        ),
    }
}

/// Serialize a scene to YAML text.
pub fn to_yaml_string(value: &SceneValue) -> Result<String> {
    let yaml = to_yaml(value);
    let mut out = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out);
        emitter
            .dump(&yaml)
            .map_err(|err| Error::Emit(err.to_string()))?;
    }
    out.push('\n');
    Ok(out)
}
