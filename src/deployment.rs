use crate::{
    config::ToolConfig,
    error::{PriorityError, PriorityResult},
    scan::list_subdirs,
};
use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

const REL_PATH_KEYS: [&str; 2] = ["relPath", "relpath"];
const SOURCE_KEYS: [&str; 3] = ["source", "Source", "mod"];
const FALLBACK_ENTRY_KEYS: [&str; 2] = ["files", "entries"];

/// Schemaless view of a MessagePack document. Map order is kept.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValue {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<ManifestValue>),
    Map(Vec<(String, ManifestValue)>),
}

impl ManifestValue {
    pub fn get(&self, key: &str) -> Option<&ManifestValue> {
        match self {
            ManifestValue::Map(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ManifestValue::Str(value) => Some(value),
            _ => None,
        }
    }

    fn into_key(self) -> String {
        match self {
            ManifestValue::Str(value) => value,
            ManifestValue::Int(value) => value.to_string(),
            ManifestValue::UInt(value) => value.to_string(),
            ManifestValue::Float(value) => value.to_string(),
            ManifestValue::Bool(value) => value.to_string(),
            ManifestValue::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            ManifestValue::Nil => String::new(),
            other => format!("{other:?}"),
        }
    }
}

impl<'de> Deserialize<'de> for ManifestValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ManifestVisitor)
    }
}

struct ManifestVisitor;

impl<'de> Visitor<'de> for ManifestVisitor {
    type Value = ManifestValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any MessagePack value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Int(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ManifestValue, E> {
        Ok(ManifestValue::UInt(value))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Str(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Str(value))
    }

    fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Bytes(value.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, value: Vec<u8>) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Bytes(value))
    }

    fn visit_none<E: de::Error>(self) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Nil)
    }

    fn visit_unit<E: de::Error>(self) -> Result<ManifestValue, E> {
        Ok(ManifestValue::Nil)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<ManifestValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        ManifestValue::deserialize(deserializer)
    }

    // MessagePack extension values arrive wrapped as a newtype.
    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<ManifestValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        ManifestValue::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ManifestValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element()? {
            values.push(value);
        }
        Ok(ManifestValue::Array(values))
    }

    fn visit_map<A>(self, mut map: A) -> Result<ManifestValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<ManifestValue, ManifestValue>()? {
            entries.push((key.into_key(), value));
        }
        Ok(ManifestValue::Map(entries))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEntry {
    pub rel_path: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentManifest {
    pub staging_path: Option<String>,
    pub target_path: Option<String>,
    pub entries: Vec<DeploymentEntry>,
}

pub fn load_deployment_manifest(path: &Path) -> PriorityResult<DeploymentManifest> {
    if !path.is_file() {
        return Err(PriorityError::not_found(path));
    }
    let bytes = fs::read(path).map_err(|err| PriorityError::decode(path, err))?;
    parse_deployment_manifest(&bytes).map_err(|err| PriorityError::decode(path, err))
}

/// The manifest layout shifts between manager versions, so the entries
/// array and path keys are located by shape rather than by key path.
pub fn parse_deployment_manifest(
    bytes: &[u8],
) -> Result<DeploymentManifest, rmp_serde::decode::Error> {
    let root: ManifestValue = rmp_serde::from_slice(bytes)?;

    let entries = find_entries_array(&root)
        .or_else(|| {
            FALLBACK_ENTRY_KEYS.iter().find_map(|key| match root.get(key) {
                Some(ManifestValue::Array(items)) => Some(items.as_slice()),
                _ => None,
            })
        })
        .unwrap_or_default()
        .iter()
        .filter_map(entry_from_value)
        .collect();

    Ok(DeploymentManifest {
        staging_path: find_key(&root, "stagingPath")
            .and_then(ManifestValue::as_str)
            .map(str::to_string),
        target_path: find_key(&root, "targetPath")
            .and_then(ManifestValue::as_str)
            .map(str::to_string),
        entries,
    })
}

fn find_entries_array(value: &ManifestValue) -> Option<&[ManifestValue]> {
    match value {
        ManifestValue::Array(items) => {
            let looks_like_entries = items
                .first()
                .map(|first| REL_PATH_KEYS.iter().any(|key| first.get(key).is_some()))
                .unwrap_or(false);
            if looks_like_entries {
                return Some(items.as_slice());
            }
            items.iter().find_map(find_entries_array)
        }
        ManifestValue::Map(entries) => entries
            .iter()
            .find_map(|(_, value)| find_entries_array(value)),
        _ => None,
    }
}

fn find_key<'a>(value: &'a ManifestValue, key: &str) -> Option<&'a ManifestValue> {
    match value {
        ManifestValue::Map(entries) => {
            if let Some(found) = value.get(key) {
                return Some(found);
            }
            entries.iter().find_map(|(_, child)| find_key(child, key))
        }
        ManifestValue::Array(items) => items.iter().find_map(|item| find_key(item, key)),
        _ => None,
    }
}

fn entry_from_value(value: &ManifestValue) -> Option<DeploymentEntry> {
    if !matches!(value, ManifestValue::Map(_)) {
        return None;
    }
    let rel_path = REL_PATH_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(ManifestValue::as_str))
        .unwrap_or_default()
        .to_string();
    let source = SOURCE_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(ManifestValue::as_str))
        .filter(|source| !source.is_empty())
        .map(str::to_string);
    Some(DeploymentEntry { rel_path, source })
}

/// Distinct sources touching either animation subsystem, in order of first
/// appearance.
pub fn extract_ordered_sources(entries: &[DeploymentEntry], config: &ToolConfig) -> Vec<String> {
    let modern = config.modern_marker.to_lowercase();
    let legacy = config.legacy_marker.to_lowercase();
    let mut seen: Vec<String> = Vec::new();
    for entry in entries {
        let Some(source) = &entry.source else {
            continue;
        };
        let rel = entry.rel_path.to_lowercase();
        if !rel.contains(&modern) && !rel.contains(&legacy) {
            continue;
        }
        if !seen.contains(source) {
            seen.push(source.clone());
        }
    }
    seen
}

/// Lowercase, runs of non-alphanumerics collapsed to one space, trimmed.
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for ch in name.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLayer {
    Exact,
    Contained,
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMatch {
    pub folder: String,
    pub layer: MatchLayer,
}

/// Best-effort: first folder (in listing order) satisfying the first layer
/// that yields anything.
pub fn match_folder(candidates: &[String], source_name: &str) -> Option<FolderMatch> {
    let found = |folder: Option<&String>, layer| {
        folder.map(|folder| FolderMatch {
            folder: folder.clone(),
            layer,
        })
    };
    found(match_exact(candidates, source_name), MatchLayer::Exact)
        .or_else(|| found(match_contained(candidates, source_name), MatchLayer::Contained))
        .or_else(|| found(match_prefix(candidates, source_name), MatchLayer::Prefix))
}

pub fn match_exact<'a>(candidates: &'a [String], source_name: &str) -> Option<&'a String> {
    let source = canonicalize_name(source_name);
    if source.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|candidate| canonicalize_name(candidate) == source)
}

pub fn match_contained<'a>(candidates: &'a [String], source_name: &str) -> Option<&'a String> {
    let source = canonicalize_name(source_name);
    if source.is_empty() {
        return None;
    }
    candidates.iter().find(|candidate| {
        let candidate = canonicalize_name(candidate);
        !candidate.is_empty() && (source.contains(&candidate) || candidate.contains(&source))
    })
}

/// Download names look like `Name-1234-2-0-1600000000`; match on `Name`.
pub fn match_prefix<'a>(candidates: &'a [String], source_name: &str) -> Option<&'a String> {
    let prefix = source_name.split('-').next().unwrap_or_default();
    let prefix = canonicalize_name(prefix);
    if prefix.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|candidate| canonicalize_name(candidate).contains(&prefix))
}

pub fn resolve_source_to_folder(staging_dir: &Path, source_name: &str) -> Option<String> {
    if !staging_dir.is_dir() {
        return None;
    }
    let candidates = list_subdirs(staging_dir);
    match_folder(&candidates, source_name).map(|found| found.folder)
}

/// User override first, then the manifest's staging path (its `mods`
/// subfolder when present).
pub fn resolve_staging_dir(
    user_override: Option<&Path>,
    staging_path: Option<&str>,
) -> Option<PathBuf> {
    if let Some(path) = user_override.filter(|path| path.is_dir()) {
        return Some(path.to_path_buf());
    }
    let staging = PathBuf::from(staging_path?);
    if !staging.is_dir() {
        return None;
    }
    let mods = staging.join("mods");
    Some(if mods.is_dir() { mods } else { staging })
}

#[derive(Debug, Clone)]
pub struct MappingProgress {
    pub current: usize,
    pub total: usize,
    pub label: String,
}

pub type ProgressCallback = Arc<dyn Fn(MappingProgress) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct SourceMapping {
    pub folders: BTreeMap<String, String>,
    pub unmapped: Vec<String>,
}

pub fn map_sources(
    staging_dir: &Path,
    sources: &[String],
    progress: Option<&ProgressCallback>,
) -> SourceMapping {
    let candidates = list_subdirs(staging_dir);
    let total = sources.len();
    let mut mapping = SourceMapping::default();
    for (index, source) in sources.iter().enumerate() {
        if let Some(callback) = progress {
            callback(MappingProgress {
                current: index + 1,
                total,
                label: format!("Scanning {}/{} sources...", index + 1, total),
            });
        }
        match match_folder(&candidates, source) {
            Some(found) => {
                tracing::debug!("mapped {source} -> {} ({:?})", found.folder, found.layer);
                mapping.folders.insert(source.clone(), found.folder);
            }
            None => mapping.unmapped.push(source.clone()),
        }
    }
    mapping
}
