use prioarity::{
    detect_conflicts, renumber, PriorityError, RenumberOptions, Session, ToolConfig,
};
use serde_json::{json, Value};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

const OAR_BASE: &str = "meshes/actors/character/animations/OpenAnimationReplacer";

fn write_config(root: &Path, sub: &str, body: &Value) -> PathBuf {
    let path = root.join(OAR_BASE).join(sub).join("config.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, serde_json::to_string_pretty(body).unwrap()).unwrap();
    path
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn two_addons_sharing_a_priority() {
    let config = ToolConfig::default();
    let mods = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let idle = json!({ "name": "Idle", "priority": 10 });
    let walk = json!({ "name": "Walk", "priority": 10 });
    write_config(&mods.path().join("AddonA"), "Idle", &idle);
    write_config(&mods.path().join("AddonB"), "Walk", &walk);
    let order = ids(&["AddonA", "AddonB"]);

    let report = detect_conflicts(mods.path(), &order, false, &config);
    let both: BTreeSet<String> = order.iter().cloned().collect();
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts.get(&10), Some(&both));

    let options = RenumberOptions {
        output_root: out.path().to_path_buf(),
        start_priority: 5,
        include_legacy: false,
    };
    let outcome = renumber(mods.path(), &order, &order, &options, &config).unwrap();
    assert_eq!(outcome.log_lines().len(), 2);
    assert_eq!(outcome.next_priority, 7);
    let idle = read_json(&out.path().join(OAR_BASE).join("Idle/config.json"));
    let walk = read_json(&out.path().join(OAR_BASE).join("Walk/config.json"));
    assert_eq!(idle["priority"], json!(5));
    assert_eq!(walk["priority"], json!(6));
}

#[test]
fn unknown_fields_survive_and_sources_stay_untouched() {
    let config = ToolConfig::default();
    let mods = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let body = json!({
        "name": "Sprint",
        "description": "fast",
        "priority": 4294967295u64,
        "overrideAnimationsFolder": "../Run",
        "conditions": [ { "condition": "IsSprinting", "negated": false } ],
        "interruptible": true
    });
    let source = write_config(&mods.path().join("Pack"), "Sprint", &body);
    let before = fs::read(&source).unwrap();

    let order = ids(&["Pack"]);
    let options = RenumberOptions {
        output_root: out.path().to_path_buf(),
        start_priority: 1,
        include_legacy: false,
    };
    let outcome = renumber(mods.path(), &order, &order, &options, &config).unwrap();
    assert_eq!(outcome.rewrites[0].old_priority, Some(-1));

    let written = read_json(&out.path().join(OAR_BASE).join("Sprint/config.json"));
    let mut expected = body.clone();
    expected["priority"] = json!(1);
    assert_eq!(written, expected);
    let keys: Vec<&String> = written.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        [
            "name",
            "description",
            "priority",
            "overrideAnimationsFolder",
            "conditions",
            "interruptible"
        ]
    );
    assert_eq!(fs::read(&source).unwrap(), before);
}

#[test]
fn mo2_session_check_then_run() {
    let root = tempfile::tempdir().unwrap();
    let profile = root.path().join("profiles/Default");
    let mods = root.path().join("mods");
    fs::create_dir_all(&profile).unwrap();
    fs::write(profile.join("modlist.txt"), "# managed\n+AddonB\n+AddonA\n-AddonC\n").unwrap();
    write_config(&mods.join("AddonA"), "Idle", &json!({ "priority": 10 }));
    write_config(&mods.join("AddonB"), "Walk", &json!({ "priority": 10 }));
    write_config(&mods.join("AddonC"), "Run", &json!({ "priority": 10 }));

    let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
    assert_eq!(session.sources, ids(&["AddonA", "AddonB"]));

    let check = session.check(false);
    assert_eq!(check.lines[1], " - Priority 10: mods: AddonA, AddonB");

    let selection = session.display.clone();
    let out = root.path().join("out");
    let summary = session.run(&selection, &out, 5, false).unwrap();
    assert_eq!(summary.next_priority, 7);
    assert_eq!(summary.processed, ids(&["AddonA", "AddonB"]));

    let log_file = summary.log_file.unwrap();
    let name = log_file.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("mo2_prio_log_"));
    let text = fs::read_to_string(&log_file).unwrap();
    assert!(text.contains(" : 10 → 5"));
    assert!(text.contains(" : 10 → 6"));
    assert!(out.join("PriOARity_Output").join(OAR_BASE).join("Walk/config.json").is_file());
}

#[test]
fn run_reordering_changes_assignment() {
    let root = tempfile::tempdir().unwrap();
    let profile = root.path().join("profiles/Default");
    let mods = root.path().join("mods");
    fs::create_dir_all(&profile).unwrap();
    fs::write(profile.join("modlist.txt"), "+AddonB\n+AddonA\n").unwrap();
    write_config(&mods.join("AddonA"), "Idle", &json!({ "priority": 1 }));
    write_config(&mods.join("AddonB"), "Walk", &json!({ "priority": 1 }));

    let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
    session.move_down(0);
    let selection = session.display.clone();
    assert_eq!(selection, ids(&["AddonB", "AddonA"]));
    let summary = session.run(&selection, &root.path().join("out"), 100, false).unwrap();
    let order: Vec<(&str, i32)> = summary
        .rewrites
        .iter()
        .map(|rewrite| (rewrite.addon_id.as_str(), rewrite.new_priority))
        .collect();
    assert_eq!(order, [("AddonB", 100), ("AddonA", 101)]);
    assert_eq!(session.sources, ids(&["AddonA", "AddonB"]));
}

#[test]
fn broken_addon_is_isolated_during_run() {
    let root = tempfile::tempdir().unwrap();
    let profile = root.path().join("profiles/Default");
    let mods = root.path().join("mods");
    fs::create_dir_all(&profile).unwrap();
    fs::write(profile.join("modlist.txt"), "+Good\n+Broken\n").unwrap();
    write_config(&mods.join("Broken"), "A", &json!({ "priority": 3 }));
    let bad = mods.join("Broken").join(OAR_BASE).join("B/config.json");
    fs::create_dir_all(bad.parent().unwrap()).unwrap();
    fs::write(&bad, "{ not json").unwrap();
    write_config(&mods.join("Good"), "Idle", &json!({ "priority": 3 }));

    let mut session = Session::load_mo2(&profile, None, ToolConfig::default()).unwrap();
    let check = session.check(false);
    assert!(check.report.is_empty());
    assert_eq!(check.report.skipped[0].addon_id, "Broken");

    let selection = session.display.clone();
    let summary = session.run(&selection, &root.path().join("out"), 1, false).unwrap();
    assert_eq!(summary.processed, ids(&["Good"]));
    assert_eq!(summary.failures[0].source, "Broken");
    assert_eq!(summary.next_priority, 2);
    assert!(summary.log_text.contains("[ERROR] Error processing 'Broken'"));
}

#[test]
fn missing_profile_is_path_not_found() {
    let root = tempfile::tempdir().unwrap();
    let err = Session::load_mo2(&root.path().join("missing"), None, ToolConfig::default())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PriorityError>(),
        Some(PriorityError::PathNotFound { .. })
    ));
}
