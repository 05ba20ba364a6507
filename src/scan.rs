use crate::{
    config::ToolConfig,
    error::{PriorityError, PriorityResult},
    legacy, structured,
    record::{classify_dir, AddonKind, DirShape, PriorityRecord, RecordFormat},
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Resolves an add-on identifier to its directory on disk.
pub trait AddonLookup {
    fn addon_root(&self, addon_id: &str) -> Option<PathBuf>;
}

/// Add-ons stored as `<mods_dir>/<addon_id>`.
impl AddonLookup for Path {
    fn addon_root(&self, addon_id: &str) -> Option<PathBuf> {
        let path = self.join(addon_id);
        path.is_dir().then_some(path)
    }
}

impl AddonLookup for PathBuf {
    fn addon_root(&self, addon_id: &str) -> Option<PathBuf> {
        self.as_path().addon_root(addon_id)
    }
}

/// Logical sources mapped onto folders of a staging directory.
pub struct MappedFolders<'a> {
    pub mods_dir: &'a Path,
    pub folders: &'a BTreeMap<String, String>,
}

impl AddonLookup for MappedFolders<'_> {
    fn addon_root(&self, addon_id: &str) -> Option<PathBuf> {
        let folder = self.folders.get(addon_id)?;
        self.mods_dir.addon_root(folder)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ShapedDir {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub shape: DirShape,
}

/// Every directory under `root` (root included), classified once.
pub(crate) fn shaped_dirs(root: &Path, config: &ToolConfig) -> PriorityResult<Vec<ShapedDir>> {
    if !root.is_dir() {
        return Err(PriorityError::not_found(root));
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("walk skipped entry under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let shape = classify_dir(&relative, config);
        dirs.push(ShapedDir {
            path: entry.path().to_path_buf(),
            relative,
            shape,
        });
    }
    Ok(dirs)
}

/// Immediate files of a directory, sorted by name.
pub(crate) fn dir_files(dir: &Path) -> PriorityResult<Vec<PathBuf>> {
    let read = fs::read_dir(dir).map_err(|err| PriorityError::decode(dir, err))?;
    let mut files = Vec::new();
    for entry in read {
        let entry = entry.map_err(|err| PriorityError::decode(dir, err))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Immediate subdirectory names, sorted.
pub fn list_subdirs(dir: &Path) -> Vec<String> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Structured records first, then legacy ones when requested.
pub fn scan_addon(
    root: &Path,
    addon_id: &str,
    config: &ToolConfig,
    include_legacy: bool,
) -> PriorityResult<Vec<PriorityRecord>> {
    let mut records = structured::scan_structured(root, addon_id, config)?;
    if include_legacy {
        records.extend(legacy::scan_legacy(root, addon_id, config)?);
    }
    Ok(records)
}

pub fn detect_addon_kind(root: &Path, config: &ToolConfig) -> PriorityResult<AddonKind> {
    let structured = !structured::scan_structured(root, "", config)?.is_empty();
    let legacy = legacy::scan_legacy(root, "", config)?;
    let custom = legacy
        .iter()
        .any(|record| record.format == RecordFormat::LegacyCustomCondition);
    let actor_base = legacy
        .iter()
        .any(|record| record.format == RecordFormat::LegacyActorBase);
    Ok(AddonKind::from_flags(structured, custom, actor_base))
}

/// Cheap load-time filter: does either marker appear anywhere below `root`?
pub fn is_candidate_addon(root: &Path, config: &ToolConfig) -> bool {
    if !root.is_dir() {
        return false;
    }
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .any(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.eq_ignore_ascii_case(&config.modern_marker)
                || name.eq_ignore_ascii_case(&config.legacy_marker)
        })
}
