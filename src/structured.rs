use crate::{
    config::ToolConfig,
    error::{PriorityError, PriorityResult},
    record::{priority_from_value, DirShape, PriorityRecord, RecordFormat, PRIORITY_KEY},
    scan::{dir_files, shaped_dirs},
};
use serde_json::Value;
use std::{fs, path::Path};

/// Collects every priority-bearing config file below the modern marker.
/// Files without a `priority` key are metadata and skipped; any file that
/// fails to read or parse fails the whole scan. A `priority` that is not a
/// usable number still yields a record so it is renumbered with the rest;
/// it sorts last and claims no value.
pub fn scan_structured(
    root: &Path,
    addon_id: &str,
    config: &ToolConfig,
) -> PriorityResult<Vec<PriorityRecord>> {
    let mut records = Vec::new();
    for dir in shaped_dirs(root, config)? {
        if dir.shape != DirShape::Structured {
            continue;
        }
        for path in dir_files(&dir.path)? {
            if !config.is_config_file(&path) {
                continue;
            }
            let Some(record) = read_record(&path, &dir.relative, addon_id)? else {
                continue;
            };
            records.push(record);
        }
    }
    records.sort_by_key(|record| (record.original_priority.is_none(), record.original_priority));
    Ok(records)
}

fn read_record(
    path: &Path,
    relative: &Path,
    addon_id: &str,
) -> PriorityResult<Option<PriorityRecord>> {
    let raw = fs::read_to_string(path).map_err(|err| PriorityError::decode(path, err))?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    let value: Value = serde_json::from_str(raw).map_err(|err| PriorityError::decode(path, err))?;
    let Value::Object(payload) = value else {
        tracing::debug!("skipping non-object config {}", path.display());
        return Ok(None);
    };
    let Some(raw_priority) = payload.get(PRIORITY_KEY) else {
        return Ok(None);
    };
    let original_priority = priority_from_value(raw_priority);
    if original_priority.is_none() {
        tracing::warn!("unusable priority {raw_priority} in {}", path.display());
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(PriorityRecord {
        source_path: Some(path.to_path_buf()),
        relative_path: relative.to_path_buf(),
        file_name,
        payload,
        original_priority,
        format: RecordFormat::Structured,
        owner_addon_id: addon_id.to_string(),
        condition_source: None,
    }))
}
