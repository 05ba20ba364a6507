use crate::{
    config::ToolConfig,
    scan::{scan_addon, AddonLookup},
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityClaim {
    pub addon_id: String,
    pub file_name: String,
    pub priority: i32,
    pub load_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAddon {
    pub addon_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityRange {
    pub min: i32,
    pub max: i32,
}

impl fmt::Display for PriorityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConflictReport {
    /// Priority values claimed by two or more distinct add-ons.
    pub conflicts: BTreeMap<i32, BTreeSet<String>>,
    pub claims: Vec<PriorityClaim>,
    pub skipped: Vec<SkippedAddon>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn conflicting_addons(&self) -> BTreeSet<String> {
        self.conflicts.values().flatten().cloned().collect()
    }

    /// Used priority span per add-on, in scan order.
    pub fn ranges(&self) -> Vec<(String, PriorityRange)> {
        let mut out: Vec<(String, PriorityRange)> = Vec::new();
        for claim in &self.claims {
            match out.iter_mut().find(|(id, _)| *id == claim.addon_id) {
                Some((_, range)) => {
                    range.min = range.min.min(claim.priority);
                    range.max = range.max.max(claim.priority);
                }
                None => out.push((
                    claim.addon_id.clone(),
                    PriorityRange {
                        min: claim.priority,
                        max: claim.priority,
                    },
                )),
            }
        }
        out
    }
}

/// Value-collision check across add-ons. Load position is recorded on each
/// claim but never decides whether a value conflicts. Add-ons that are
/// missing or fail to scan are listed in `skipped`.
pub fn detect_conflicts<L: AddonLookup + ?Sized>(
    lookup: &L,
    ordered_addon_ids: &[String],
    include_legacy: bool,
    config: &ToolConfig,
) -> ConflictReport {
    let mut report = ConflictReport::default();
    let mut claimants: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();

    for (load_index, addon_id) in ordered_addon_ids.iter().enumerate() {
        let Some(root) = lookup.addon_root(addon_id) else {
            report.skipped.push(SkippedAddon {
                addon_id: addon_id.clone(),
                reason: "folder not found".to_string(),
            });
            continue;
        };
        let records = match scan_addon(&root, addon_id, config, include_legacy) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("conflict scan skipped {addon_id}: {err}");
                report.skipped.push(SkippedAddon {
                    addon_id: addon_id.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        for record in records {
            let Some(priority) = record.original_priority else {
                continue;
            };
            claimants
                .entry(priority)
                .or_default()
                .insert(addon_id.clone());
            report.claims.push(PriorityClaim {
                addon_id: addon_id.clone(),
                file_name: record.file_name,
                priority,
                load_index,
            });
        }
    }

    report.conflicts = claimants
        .into_iter()
        .filter(|(_, addons)| addons.len() > 1)
        .collect();
    report
}
