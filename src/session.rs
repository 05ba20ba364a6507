use crate::{
    config::ToolConfig,
    conflict::{detect_conflicts, ConflictReport, PriorityRange},
    deployment::{
        extract_ordered_sources, load_deployment_manifest, map_sources, resolve_staging_dir,
        ProgressCallback,
    },
    error::PriorityError,
    modlist::{enabled_load_order, read_modlist, MODLIST_FILE},
    record::AddonKind,
    renumber::{renumber, RenumberOptions, Rewrite},
    scan::{detect_addon_kind, is_candidate_addon, AddonLookup, MappedFolders},
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fs,
    path::{Path, PathBuf},
};
use time::OffsetDateTime;

pub const NOTHING_PROCESSED: &str = "(no json files found / nothing processed)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub enum LogLine {
    Status { level: LogLevel, message: String },
    Plain(String),
}

/// User-facing log. Status lines carry a level label; rewrite lines are
/// kept verbatim.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunLog {
    lines: Vec<LogLine>,
}

impl RunLog {
    pub fn info(&mut self, message: impl Into<String>) {
        self.push_status(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push_status(LogLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_status(LogLevel::Error, message.into());
    }

    pub fn plain(&mut self, line: impl Into<String>) {
        self.lines.push(LogLine::Plain(line.into()));
    }

    pub fn append(&mut self, other: &RunLog) {
        self.lines.extend(other.lines.iter().cloned());
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line {
                LogLine::Status { level, message } => {
                    format!("[{}] {message}", log_level_label(*level))
                }
                LogLine::Plain(line) => line.clone(),
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    /// Writes `<prefix>_prio_log_<YYYYMMDD_HHMMSS>.txt` into `dir`.
    pub fn save(&self, dir: &Path, prefix: &str) -> Result<PathBuf> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now
            .format(time::macros::format_description!(
                "[year][month][day]_[hour][minute][second]"
            ))
            .context("format log timestamp")?;
        let path = dir.join(format!("{prefix}_prio_log_{stamp}.txt"));
        fs::write(&path, self.text()).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    fn push_status(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        self.lines.push(LogLine::Status { level, message });
    }
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    Mo2,
    Vortex,
}

impl LoadMode {
    pub fn log_prefix(self) -> &'static str {
        match self {
            LoadMode::Mo2 => "mo2",
            LoadMode::Vortex => "vortex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Index,
    Name,
    Range,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayEntry {
    /// 1-based position in the canonical load order.
    pub index: usize,
    pub source: String,
    pub folder: Option<String>,
    pub kind: Option<AddonKind>,
    pub range: Option<String>,
    pub conflict: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub report: ConflictReport,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub next_priority: i32,
    pub rewrites: Vec<Rewrite>,
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<RunFailure>,
    pub files_written: usize,
    pub log_text: String,
    pub log_file: Option<PathBuf>,
}

/// Everything one load produced. A new load replaces the whole value.
#[derive(Debug, Clone)]
pub struct Session {
    pub mode: LoadMode,
    pub config: ToolConfig,
    pub mods_dir: Option<PathBuf>,
    /// Canonical order, first entry loads first.
    pub sources: Vec<String>,
    pub display: Vec<String>,
    pub folders: BTreeMap<String, String>,
    pub kinds: BTreeMap<String, AddonKind>,
    pub ranges: BTreeMap<String, PriorityRange>,
    pub conflicts: BTreeSet<String>,
    pub log: RunLog,
}

impl Session {
    fn new(mode: LoadMode, config: ToolConfig, mods_dir: Option<PathBuf>) -> Self {
        Self {
            mode,
            config,
            mods_dir,
            sources: Vec::new(),
            display: Vec::new(),
            folders: BTreeMap::new(),
            kinds: BTreeMap::new(),
            ranges: BTreeMap::new(),
            conflicts: BTreeSet::new(),
            log: RunLog::default(),
        }
    }

    /// Loads the enabled, animation-bearing add-ons of an MO2 profile. The
    /// mods directory defaults to `<profile>/../../mods`.
    pub fn load_mo2(
        profile_dir: &Path,
        mods_override: Option<&Path>,
        config: ToolConfig,
    ) -> Result<Self> {
        if !profile_dir.is_dir() {
            return Err(PriorityError::not_found(profile_dir).into());
        }
        if !profile_dir.join(MODLIST_FILE).is_file() {
            return Err(PriorityError::not_found(profile_dir.join(MODLIST_FILE)).into());
        }
        let mods_dir = match mods_override {
            Some(dir) => dir.to_path_buf(),
            None => profile_dir
                .parent()
                .and_then(Path::parent)
                .map(|root| root.join("mods"))
                .ok_or_else(|| PriorityError::not_found(profile_dir.join("../../mods")))?,
        };
        if !mods_dir.is_dir() {
            return Err(PriorityError::not_found(&mods_dir).into());
        }

        let entries = read_modlist(profile_dir)?;
        let mut session = Session::new(LoadMode::Mo2, config, Some(mods_dir.clone()));
        for name in enabled_load_order(&entries) {
            if !is_candidate_addon(&mods_dir.join(&name), &session.config) {
                continue;
            }
            session.folders.insert(name.clone(), name.clone());
            session.sources.push(name);
        }
        session.display = session.sources.clone();
        session.detect_kinds();
        session.log.info(format!(
            "{} animation add-ons loaded from MO2 profile.",
            session.sources.len()
        ));
        session.log.info(format!("Mods folder: {}", mods_dir.display()));
        Ok(session)
    }

    /// Loads add-on order from a Vortex deployment manifest and maps every
    /// source onto a staging folder.
    pub fn load_vortex(
        manifest_path: &Path,
        staging_override: Option<&Path>,
        config: ToolConfig,
        progress: Option<&ProgressCallback>,
    ) -> Result<Self> {
        if !manifest_path.is_file() {
            return Err(PriorityError::not_found(manifest_path).into());
        }
        if let Some(dir) = staging_override.filter(|dir| !dir.is_dir()) {
            return Err(PriorityError::not_found(dir).into());
        }
        let manifest = load_deployment_manifest(manifest_path)?;
        let staging = resolve_staging_dir(staging_override, manifest.staging_path.as_deref());

        let mut session = Session::new(LoadMode::Vortex, config, staging.clone());
        session.log.info(format!(
            "Total deployment entries found: {}",
            manifest.entries.len()
        ));
        session.sources = extract_ordered_sources(&manifest.entries, &session.config);
        session.display = session.sources.clone();
        session.log.info(format!(
            "Detected {} distinct animation sources in deployment (in order).",
            session.sources.len()
        ));

        let Some(staging) = staging else {
            session
                .log
                .warn("Could not determine staging folder automatically; pass --staging.");
            for source in &session.sources {
                let err = PriorityError::UnmappedSource {
                    source_name: source.clone(),
                };
                session.log.warn(err.to_string());
            }
            return Ok(session);
        };
        session.log.info(format!("Using staging folder: {}", staging.display()));

        let mapping = map_sources(&staging, &session.sources, progress);
        for source in &session.sources {
            if let Some(folder) = mapping.folders.get(source) {
                session
                    .log
                    .info(format!("Mapped source -> folder: '{source}' → '{folder}'"));
            }
        }
        for source in mapping.unmapped {
            let err = PriorityError::UnmappedSource {
                source_name: source,
            };
            session.log.warn(err.to_string());
        }
        session.folders = mapping.folders;
        session.detect_kinds();
        Ok(session)
    }

    fn detect_kinds(&mut self) {
        let Some(lookup) = mapped_lookup(self.mods_dir.as_deref(), &self.folders) else {
            return;
        };
        let mut kinds = BTreeMap::new();
        for source in &self.sources {
            let Some(root) = lookup.addon_root(source) else {
                continue;
            };
            match detect_addon_kind(&root, &self.config) {
                Ok(kind) => {
                    kinds.insert(source.clone(), kind);
                }
                Err(err) => tracing::debug!("kind detection failed for {source}: {err}"),
            }
        }
        self.kinds = kinds;
    }

    pub fn display_entries(&self) -> Vec<DisplayEntry> {
        self.display
            .iter()
            .map(|source| DisplayEntry {
                index: self.canonical_index(source),
                source: source.clone(),
                folder: self.folders.get(source).cloned(),
                kind: self.kinds.get(source).copied(),
                range: self.ranges.get(source).map(PriorityRange::to_string),
                conflict: self.conflicts.contains(source),
            })
            .collect()
    }

    fn canonical_index(&self, source: &str) -> usize {
        self.sources
            .iter()
            .position(|candidate| candidate == source)
            .map(|index| index + 1)
            .unwrap_or(usize::MAX)
    }

    /// Duplicate-priority check over every mapped add-on in canonical order.
    pub fn check(&mut self, include_legacy: bool) -> CheckSummary {
        self.log.info(format!(
            "Checking for duplicate priorities among {} add-ons...",
            self.sources.len()
        ));
        let unmapped: Vec<&str> = self
            .sources
            .iter()
            .filter(|source| !self.folders.contains_key(*source))
            .map(String::as_str)
            .collect();
        if !unmapped.is_empty() {
            self.log.warn(format!(
                "Some sources were not mapped to folders and will be skipped: {}",
                unmapped.join(", ")
            ));
        }

        let mut seen_folders = HashSet::new();
        let ordered: Vec<String> = self
            .sources
            .iter()
            .filter(|source| {
                self.folders
                    .get(*source)
                    .map(|folder| seen_folders.insert(folder.as_str()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let report = match mapped_lookup(self.mods_dir.as_deref(), &self.folders) {
            Some(lookup) if !ordered.is_empty() => Some(detect_conflicts(
                &lookup,
                &ordered,
                include_legacy,
                &self.config,
            )),
            _ => None,
        };
        let Some(report) = report else {
            self.log.warn("No mapped folders available for scanning.");
            return CheckSummary {
                report: ConflictReport::default(),
                lines: Vec::new(),
            };
        };

        for skipped in &report.skipped {
            self.log
                .warn(format!("Skipped '{}': {}", skipped.addon_id, skipped.reason));
        }
        self.ranges = report.ranges().into_iter().collect();
        self.conflicts = report.conflicting_addons();
        self.share_with_folder_mates();

        let lines = self.conflict_lines(&report);
        for line in &lines {
            self.log.plain(line.clone());
        }
        self.log.info("Duplicate check finished.");
        CheckSummary { report, lines }
    }

    /// Sources mapped onto a folder that was already scanned inherit its
    /// range and conflict flag.
    fn share_with_folder_mates(&mut self) {
        let mut scanned: BTreeMap<&str, &str> = BTreeMap::new();
        for source in &self.sources {
            if let Some(folder) = self.folders.get(source) {
                scanned.entry(folder.as_str()).or_insert(source.as_str());
            }
        }
        let mut ranges = Vec::new();
        let mut conflicts = Vec::new();
        for source in &self.sources {
            let Some(first) = self
                .folders
                .get(source)
                .and_then(|folder| scanned.get(folder.as_str()))
            else {
                continue;
            };
            if *first == source.as_str() {
                continue;
            }
            if let Some(range) = self.ranges.get(*first) {
                ranges.push((source.clone(), *range));
            }
            if self.conflicts.contains(*first) {
                conflicts.push(source.clone());
            }
        }
        self.ranges.extend(ranges);
        self.conflicts.extend(conflicts);
    }

    fn conflict_lines(&self, report: &ConflictReport) -> Vec<String> {
        if report.is_empty() {
            return vec!["No duplicate priorities detected.".to_string()];
        }
        let mut lines = vec!["Duplicate priority conflicts detected:".to_string()];
        for (priority, sources) in &report.conflicts {
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            let line = match self.mode {
                LoadMode::Mo2 => format!(" - Priority {priority}: mods: {}", sources.join(", ")),
                LoadMode::Vortex => {
                    let folders: BTreeSet<&str> = sources
                        .iter()
                        .filter_map(|source| self.folders.get(*source).map(String::as_str))
                        .collect();
                    let mapped: Vec<&str> = self
                        .sources
                        .iter()
                        .filter(|source| {
                            self.folders
                                .get(*source)
                                .is_some_and(|folder| folders.contains(folder.as_str()))
                        })
                        .map(String::as_str)
                        .collect();
                    format!(
                        " - Priority {priority}: folders: {}; sources: {}",
                        folders.into_iter().collect::<Vec<_>>().join(", "),
                        mapped.join(", ")
                    )
                }
            };
            lines.push(line);
        }
        lines
    }

    /// Reorders the display list only; the canonical order is untouched.
    pub fn sort_display(&mut self, key: SortKey, reverse: bool) {
        let mut display = std::mem::take(&mut self.display);
        match key {
            SortKey::Index => display.sort_by_key(|source| self.canonical_index(source)),
            SortKey::Name => display.sort_by_key(|source| source.to_lowercase()),
            SortKey::Range => display.sort_by_key(|source| {
                let min = self.ranges.get(source).map(|range| range.min);
                (min.is_none(), min)
            }),
        }
        if reverse {
            display.reverse();
        }
        self.display = display;
    }

    pub fn move_up(&mut self, index: usize) {
        if index == 0 || index >= self.display.len() {
            return;
        }
        self.display.swap(index, index - 1);
    }

    pub fn move_down(&mut self, index: usize) {
        if index + 1 >= self.display.len() {
            return;
        }
        self.display.swap(index, index + 1);
    }

    /// Renumbers `selection` in the given order into
    /// `<output_dir>/<output_folder>` and writes the execution log there.
    pub fn run(
        &mut self,
        selection: &[String],
        output_dir: &Path,
        start_priority: i32,
        include_legacy: bool,
    ) -> Result<RunSummary> {
        if selection.is_empty() {
            bail!("no add-ons selected");
        }
        if output_dir.as_os_str().is_empty() {
            bail!("output directory is required");
        }
        if start_priority < 1 {
            return Err(PriorityError::invalid_priority(
                start_priority,
                "start priority must be at least 1",
            )
            .into());
        }
        let output_root = output_dir.join(&self.config.output_folder);
        fs::create_dir_all(&output_root).map_err(|err| PriorityError::write(&output_root, err))?;

        let mut execution = RunLog::default();
        let mut summary = RunSummary {
            next_priority: start_priority,
            ..RunSummary::default()
        };
        let Some(lookup) = mapped_lookup(self.mods_dir.as_deref(), &self.folders) else {
            self.log.warn("No mapped folders to process. Aborting run.");
            summary.skipped = selection.to_vec();
            return Ok(summary);
        };

        let mut runnable = Vec::new();
        for source in selection {
            match self.folders.get(source) {
                None => {
                    execution.warn(format!("Skipping unmapped source '{source}'"));
                    summary.skipped.push(source.clone());
                }
                Some(folder) if lookup.addon_root(source).is_none() => {
                    execution.warn(format!(
                        "Skipping missing folder '{folder}' for source '{source}'"
                    ));
                    summary.skipped.push(source.clone());
                }
                Some(folder) => {
                    execution.info(format!("Processing '{source}' -> folder '{folder}'"));
                    runnable.push(source.clone());
                }
            }
        }

        let options = RenumberOptions {
            output_root: output_root.clone(),
            start_priority,
            include_legacy,
        };
        let outcome = renumber(&lookup, &runnable, &runnable, &options, &self.config)?;

        if outcome.rewrites.is_empty() {
            execution.plain(NOTHING_PROCESSED);
        }
        for line in outcome.log_lines() {
            execution.plain(line);
        }
        for failure in &outcome.failures {
            let message = format!("Error processing '{}': {}", failure.addon_id, failure.error);
            if failure.error.is_addon_local() {
                execution.error(message);
            } else {
                execution.warn(message);
            }
            summary.failures.push(RunFailure {
                source: failure.addon_id.clone(),
                reason: failure.error.to_string(),
            });
        }

        self.log.append(&execution);
        summary.log_text = execution.text();
        match execution.save(&output_root, self.mode.log_prefix()) {
            Ok(path) => {
                self.log.info(format!("Done! Log saved to: {}", path.display()));
                summary.log_file = Some(path);
            }
            Err(err) => self.log.error(format!("Failed to save log: {err:#}")),
        }

        summary.next_priority = outcome.next_priority;
        summary.rewrites = outcome.rewrites;
        summary.processed = outcome.processed;
        summary.files_written = outcome.files_written;
        Ok(summary)
    }
}

fn mapped_lookup<'a>(
    mods_dir: Option<&'a Path>,
    folders: &'a BTreeMap<String, String>,
) -> Option<MappedFolders<'a>> {
    Some(MappedFolders {
        mods_dir: mods_dir?,
        folders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::fixtures::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    /// `<root>/profiles/Default/modlist.txt` next to `<root>/mods`.
    fn mo2_layout(modlist: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profiles").join("Default");
        let mods = dir.path().join("mods");
        fs::create_dir_all(&profile).unwrap();
        fs::create_dir_all(&mods).unwrap();
        fs::write(profile.join(MODLIST_FILE), modlist).unwrap();
        (dir, profile, mods)
    }

    #[test]
    fn log_text_labels_status_lines_only() {
        let mut log = RunLog::default();
        log.info("loaded");
        log.plain("[A] x : 1 → 2");
        log.error("boom");
        assert_eq!(log.text(), "[INFO] loaded\n[A] x : 1 → 2\n[ERROR] boom");
    }

    #[test]
    fn saved_log_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::default();
        log.plain("line");
        let path = log.save(dir.path(), "mo2").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("mo2_prio_log_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "mo2_prio_log_20240101_120000.txt".len());
        assert_eq!(fs::read_to_string(path).unwrap(), "line");
    }

    #[test]
    fn mo2_load_keeps_enabled_candidates_reversed() {
        let (_dir, profile, mods) = mo2_layout("# header\n+Top\n-Off\n+Plain\n+Bottom\n");
        oar_config(&mods.join("Top"), "Idle", 1);
        oar_config(&mods.join("Off"), "Idle", 1);
        oar_config(&mods.join("Bottom"), "Idle", 1);
        fs::create_dir_all(mods.join("Plain/textures")).unwrap();

        let session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
        assert_eq!(session.sources, names(&["Bottom", "Top"]));
        assert_eq!(session.kinds.get("Top"), Some(&AddonKind::Structured));
        assert_eq!(session.mods_dir.as_deref(), Some(mods.as_path()));
    }

    #[test]
    fn missing_inputs_fail_before_scanning() {
        let (dir, profile, _mods) = mo2_layout("+A\n");
        let err = Session::load_mo2(&dir.path().join("nope"), None, ToolConfig::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PriorityError>(),
            Some(PriorityError::PathNotFound { .. })
        ));
        let gone = dir.path().join("gone");
        let err = Session::load_mo2(&profile, Some(gone.as_path()), ToolConfig::default())
            .unwrap_err();
        assert!(err.downcast_ref::<PriorityError>().is_some());
    }

    #[test]
    fn check_reports_conflicts_and_ranges() {
        let (_dir, profile, mods) = mo2_layout("+B\n+A\n");
        oar_config(&mods.join("A"), "Idle", 10);
        oar_config(&mods.join("B"), "Walk", 10);
        oar_config(&mods.join("B"), "Run", 20);

        let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
        let summary = session.check(false);
        assert_eq!(
            summary.lines,
            [
                "Duplicate priority conflicts detected:",
                " - Priority 10: mods: A, B"
            ]
        );
        assert_eq!(session.conflicts, names(&["A", "B"]).into_iter().collect());
        let entries = session.display_entries();
        assert_eq!(entries[1].range.as_deref(), Some("10 - 20"));
        assert!(entries[0].conflict);
    }

    #[test]
    fn sorting_and_moves_touch_display_only() {
        let (_dir, profile, mods) = mo2_layout("+beta\n+Alpha\n+gamma\n");
        oar_config(&mods.join("Alpha"), "Idle", 50);
        oar_config(&mods.join("beta"), "Idle", 5);
        oar_config(&mods.join("gamma"), "Idle", 500);
        let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
        session.check(false);

        session.sort_display(SortKey::Name, false);
        assert_eq!(session.display, names(&["Alpha", "beta", "gamma"]));
        session.sort_display(SortKey::Range, true);
        assert_eq!(session.display, names(&["gamma", "Alpha", "beta"]));
        session.move_up(2);
        session.move_down(2);
        assert_eq!(session.display, names(&["gamma", "beta", "Alpha"]));
        session.sort_display(SortKey::Index, false);
        assert_eq!(session.display, session.sources);
        assert_eq!(session.sources, names(&["gamma", "Alpha", "beta"]));
    }

    #[test]
    fn run_rejects_bad_start_priority() {
        let (dir, profile, mods) = mo2_layout("+A\n");
        oar_config(&mods.join("A"), "Idle", 1);
        let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
        let err = session
            .run(&names(&["A"]), &dir.path().join("out"), 0, false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PriorityError>(),
            Some(PriorityError::InvalidPriorityValue { .. })
        ));
    }

    #[test]
    fn run_with_nothing_to_rewrite_says_so() {
        let (dir, profile, mods) = mo2_layout("+A\n");
        fs::create_dir_all(mods.join("A").join(OAR_BASE)).unwrap();
        let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
        let summary = session
            .run(&names(&["A", "Ghost"]), &dir.path().join("out"), 3, false)
            .unwrap();
        assert_eq!(summary.next_priority, 3);
        assert_eq!(summary.skipped, names(&["Ghost"]));
        assert!(summary.log_text.contains(NOTHING_PROCESSED));
        let saved = summary.log_file.unwrap();
        assert!(saved.starts_with(dir.path().join("out").join("PriOARity_Output")));
    }

    #[test]
    fn sources_sharing_a_folder_share_results() {
        let dir = tempfile::tempdir().unwrap();
        let mods = dir.path().join("mods");
        oar_config(&mods.join("Pack"), "Idle", 10);
        oar_config(&mods.join("Other"), "Walk", 10);
        let mut session = Session::new(LoadMode::Vortex, ToolConfig::default(), Some(mods));
        session.sources = names(&["Pack-1-0", "Pack-1-1", "Other-2"]);
        session.display = session.sources.clone();
        let pairs = [("Pack-1-0", "Pack"), ("Pack-1-1", "Pack"), ("Other-2", "Other")];
        for (source, folder) in pairs {
            session.folders.insert(source.to_string(), folder.to_string());
        }

        let summary = session.check(false);
        assert_eq!(
            summary.lines[1],
            " - Priority 10: folders: Other, Pack; sources: Pack-1-0, Pack-1-1, Other-2"
        );
        let entries = session.display_entries();
        assert_eq!(entries[1].range.as_deref(), Some("10 - 10"));
        assert!(entries.iter().all(|entry| entry.conflict));
    }
}
