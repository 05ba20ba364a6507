use crate::{
    config::ToolConfig,
    error::{PriorityError, PriorityResult},
    legacy::scan_legacy,
    record::{Payload, PriorityRecord},
    scan::AddonLookup,
    structured::scan_structured,
};
use serde::Serialize;
use std::{
    collections::HashSet,
    fmt, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct RenumberOptions {
    pub output_root: PathBuf,
    pub start_priority: i32,
    pub include_legacy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    pub addon_id: String,
    pub source: String,
    pub old_priority: Option<i32>,
    /// Old value as logged; raw JSON text when it was not a usable number.
    pub old_value: String,
    pub new_priority: i32,
}

impl fmt::Display for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} : {} → {}",
            self.addon_id, self.source, self.old_value, self.new_priority
        )
    }
}

#[derive(Debug)]
pub struct AddonFailure {
    pub addon_id: String,
    pub error: PriorityError,
}

#[derive(Debug, Default)]
pub struct RenumberOutcome {
    /// Next unused priority; feed it back as a start value to chain runs.
    pub next_priority: i32,
    pub rewrites: Vec<Rewrite>,
    pub failures: Vec<AddonFailure>,
    pub processed: Vec<String>,
    pub files_written: usize,
}

impl RenumberOutcome {
    pub fn log_lines(&self) -> Vec<String> {
        self.rewrites.iter().map(Rewrite::to_string).collect()
    }
}

/// Walks `ordered_addon_ids`, processing only selected add-ons, and assigns
/// one consecutive priority per record starting at `start_priority`.
/// A failing add-on is recorded and the batch continues; slots it already
/// consumed stay consumed and its written files stay on disk.
pub fn renumber<L: AddonLookup + ?Sized>(
    lookup: &L,
    ordered_addon_ids: &[String],
    selected_addon_ids: &[String],
    options: &RenumberOptions,
    config: &ToolConfig,
) -> PriorityResult<RenumberOutcome> {
    fs::create_dir_all(&options.output_root)
        .map_err(|err| PriorityError::write(&options.output_root, err))?;

    let selected: HashSet<&str> = selected_addon_ids.iter().map(String::as_str).collect();
    let mut outcome = RenumberOutcome {
        next_priority: options.start_priority,
        ..RenumberOutcome::default()
    };

    for addon_id in ordered_addon_ids {
        if !selected.contains(addon_id.as_str()) {
            continue;
        }
        let Some(root) = lookup.addon_root(addon_id) else {
            outcome.failures.push(AddonFailure {
                addon_id: addon_id.clone(),
                error: PriorityError::not_found(addon_id),
            });
            continue;
        };
        tracing::info!("renumbering {addon_id} from {}", outcome.next_priority);
        let mut writer = AddonWriter {
            addon_id,
            output_root: &options.output_root,
            counter: &mut outcome.next_priority,
            rewrites: &mut outcome.rewrites,
            files_written: &mut outcome.files_written,
        };
        match writer.process(&root, options.include_legacy, config) {
            Ok(()) => outcome.processed.push(addon_id.clone()),
            Err(error) => {
                tracing::warn!("renumbering aborted for {addon_id}: {error}");
                outcome.failures.push(AddonFailure {
                    addon_id: addon_id.clone(),
                    error,
                });
            }
        }
    }

    Ok(outcome)
}

struct AddonWriter<'a> {
    addon_id: &'a str,
    output_root: &'a Path,
    counter: &'a mut i32,
    rewrites: &'a mut Vec<Rewrite>,
    files_written: &'a mut usize,
}

impl AddonWriter<'_> {
    fn process(
        &mut self,
        root: &Path,
        include_legacy: bool,
        config: &ToolConfig,
    ) -> PriorityResult<()> {
        for record in scan_structured(root, self.addon_id, config)? {
            let priority = self.take_slot(&record)?;
            let dest = self
                .output_root
                .join(&record.relative_path)
                .join(&record.file_name);
            self.write_payload(&dest, &record.payload_with_priority(priority))?;
        }

        if !include_legacy {
            return Ok(());
        }
        for record in scan_legacy(root, self.addon_id, config)? {
            if !record.format.consumes_slot() {
                let dir = self.output_root.join(&record.relative_path);
                self.write_legacy(&dir, &record, 0)?;
                continue;
            }
            let priority = self.take_slot(&record)?;
            let parent = record
                .relative_path
                .parent()
                .unwrap_or_else(|| Path::new(""));
            let dir = self.output_root.join(parent).join(priority.to_string());
            self.write_legacy(&dir, &record, priority)?;
        }
        Ok(())
    }

    fn take_slot(&mut self, record: &PriorityRecord) -> PriorityResult<i32> {
        let assigned = *self.counter;
        *self.counter = assigned.checked_add(1).ok_or_else(|| {
            PriorityError::invalid_priority(assigned, "priority counter overflow")
        })?;
        self.rewrites.push(Rewrite {
            addon_id: self.addon_id.to_string(),
            source: record.source_description(),
            old_priority: record.original_priority,
            old_value: record.priority_label(),
            new_priority: assigned,
        });
        Ok(assigned)
    }

    /// Legacy output: placeholder record plus the verbatim condition text.
    /// Animation files are left in the original add-on.
    fn write_legacy(
        &mut self,
        dir: &Path,
        record: &PriorityRecord,
        priority: i32,
    ) -> PriorityResult<()> {
        let payload = record.payload_with_priority(priority);
        self.write_payload(&dir.join(&record.file_name), &payload)?;
        if let Some(source) = &record.condition_source {
            let name = source.file_name().unwrap_or_default();
            let dest = dir.join(name);
            fs::copy(source, &dest).map_err(|err| PriorityError::write(&dest, err))?;
            *self.files_written += 1;
        }
        Ok(())
    }

    fn write_payload(&mut self, dest: &Path, payload: &Payload) -> PriorityResult<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|err| PriorityError::write(parent, err))?;
        }
        let raw =
            serde_json::to_string_pretty(payload).map_err(|err| PriorityError::write(dest, err))?;
        fs::write(dest, raw).map_err(|err| PriorityError::write(dest, err))?;
        *self.files_written += 1;
        Ok(())
    }
}
