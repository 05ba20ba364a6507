use crate::{
    config::ToolConfig,
    error::{PriorityError, PriorityResult},
    record::{
        priority_from_dir_name, DirShape, Payload, PriorityRecord, RecordFormat, PRIORITY_KEY,
    },
    scan::{dir_files, shaped_dirs},
};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Placeholder record written next to each synthesized legacy output folder.
pub const PLACEHOLDER_FILE: &str = "_prioarity.json";
pub const LEGACY_FORMAT_TAG: &str = "dar";

/// Collects legacy folder-encoded records. Priority directories with a
/// non-numeric or zero name are skipped, as are folders without animations.
pub fn scan_legacy(
    root: &Path,
    addon_id: &str,
    config: &ToolConfig,
) -> PriorityResult<Vec<PriorityRecord>> {
    let mut records = Vec::new();
    for dir in shaped_dirs(root, config)? {
        let record = match &dir.shape {
            DirShape::LegacyCustom { priority_dir } => {
                let Some(priority) = priority_from_dir_name(priority_dir) else {
                    let err = PriorityError::invalid_priority(
                        priority_dir,
                        dir.relative.display().to_string(),
                    );
                    tracing::debug!("skipping legacy folder: {err}");
                    continue;
                };
                let animations = count_animation_files(&dir.path, config);
                if animations == 0 {
                    continue;
                }
                let condition_source = find_condition_file(&dir.path, config)?;
                let conditions = match &condition_source {
                    Some(path) => Some(read_condition_text(path)?),
                    None => None,
                };
                build_record(
                    &dir.relative,
                    addon_id,
                    RecordFormat::LegacyCustomCondition,
                    priority,
                    animations,
                    conditions,
                    condition_source,
                )
            }
            DirShape::LegacyActorBase { plugin, form_id } => {
                let animations = count_animation_files(&dir.path, config);
                if animations == 0 {
                    continue;
                }
                build_record(
                    &dir.relative,
                    addon_id,
                    RecordFormat::LegacyActorBase,
                    0,
                    animations,
                    Some(actor_base_condition(plugin, form_id)),
                    None,
                )
            }
            DirShape::Structured | DirShape::Unrecognized => continue,
        };
        records.push(record);
    }
    records.sort_by_key(|record| record.original_priority);
    Ok(records)
}

fn build_record(
    relative: &Path,
    addon_id: &str,
    format: RecordFormat,
    priority: i32,
    animations: usize,
    conditions: Option<String>,
    condition_source: Option<PathBuf>,
) -> PriorityRecord {
    let mut payload = Payload::new();
    payload.insert(PRIORITY_KEY.to_string(), Value::from(priority));
    payload.insert("format".to_string(), Value::from(LEGACY_FORMAT_TAG));
    payload.insert("shape".to_string(), Value::from(format.label()));
    payload.insert("animationFileCount".to_string(), Value::from(animations));
    if let Some(conditions) = conditions {
        payload.insert("conditions".to_string(), Value::from(conditions));
    }

    PriorityRecord {
        source_path: None,
        relative_path: relative.to_path_buf(),
        file_name: PLACEHOLDER_FILE.to_string(),
        payload,
        original_priority: Some(priority),
        format,
        owner_addon_id: addon_id.to_string(),
        condition_source,
    }
}

/// Joins non-blank, non-comment lines with a single space.
pub fn flatten_conditions(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_condition_text(path: &Path) -> PriorityResult<String> {
    let bytes = fs::read(path).map_err(|err| PriorityError::decode(path, err))?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(flatten_conditions(text))
}

fn find_condition_file(dir: &Path, config: &ToolConfig) -> PriorityResult<Option<PathBuf>> {
    Ok(dir_files(dir)?.into_iter().find(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().eq_ignore_ascii_case(&config.condition_file))
            .unwrap_or(false)
    }))
}

fn count_animation_files(dir: &Path, config: &ToolConfig) -> usize {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && config.is_animation_file(entry.path()))
        .count()
}

fn actor_base_condition(plugin: &str, form_id: &str) -> String {
    format!("IsActorBase(\"{plugin}\" | 0x{form_id})")
}
