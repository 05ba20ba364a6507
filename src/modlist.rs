use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};

pub const MODLIST_FILE: &str = "modlist.txt";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModlistEntry {
    pub name: String,
    pub enabled: bool,
}

/// `+name` enabled, `-name` disabled. Comments, separators and unmanaged
/// `*name` lines are dropped.
pub fn parse_modlist(raw: &str) -> Vec<ModlistEntry> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    raw.lines()
        .map(str::trim)
        .filter_map(|line| {
            let (enabled, name) = match line.chars().next()? {
                '+' => (true, &line[1..]),
                '-' => (false, &line[1..]),
                _ => return None,
            };
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(ModlistEntry {
                name: name.to_string(),
                enabled,
            })
        })
        .collect()
}

pub fn read_modlist(profile_dir: &Path) -> Result<Vec<ModlistEntry>> {
    let path = profile_dir.join(MODLIST_FILE);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read modlist {}", path.display()))?;
    Ok(parse_modlist(&raw))
}

/// Enabled names with the first listed entry last, matching the order in
/// which the manager applies them.
pub fn enabled_load_order(entries: &[ModlistEntry]) -> Vec<String> {
    entries
        .iter()
        .rev()
        .filter(|entry| entry.enabled)
        .map(|entry| entry.name.clone())
        .collect()
}
