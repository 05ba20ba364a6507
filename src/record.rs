use crate::config::ToolConfig;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

pub const PRIORITY_KEY: &str = "priority";
pub const CUSTOM_CONDITIONS_DIR: &str = "_CustomConditions";
const ACTOR_BASE_MIN_SEGMENTS: usize = 5;
const PLUGIN_EXTENSIONS: [&str; 3] = ["esp", "esm", "esl"];

pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFormat {
    Structured,
    LegacyCustomCondition,
    LegacyActorBase,
}

impl RecordFormat {
    /// Actor-base overrides never take part in sequential renumbering.
    pub fn consumes_slot(self) -> bool {
        !matches!(self, RecordFormat::LegacyActorBase)
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordFormat::Structured => "structured",
            RecordFormat::LegacyCustomCondition => "custom_condition",
            RecordFormat::LegacyActorBase => "actor_base",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriorityRecord {
    /// Config file on disk; `None` for synthesized legacy records.
    pub source_path: Option<PathBuf>,
    /// Containing folder relative to the add-on root.
    pub relative_path: PathBuf,
    pub file_name: String,
    pub payload: Payload,
    /// Signed priority; `None` when the stored value is not a usable number.
    pub original_priority: Option<i32>,
    pub format: RecordFormat,
    pub owner_addon_id: String,
    /// Legacy condition text file, copied verbatim on output.
    pub condition_source: Option<PathBuf>,
}

impl PriorityRecord {
    pub fn source_description(&self) -> String {
        match &self.source_path {
            Some(path) => path.display().to_string(),
            None => self.relative_path.display().to_string(),
        }
    }

    /// Old priority as shown in log lines. Unusable values are echoed raw.
    pub fn priority_label(&self) -> String {
        match self.original_priority {
            Some(priority) => priority.to_string(),
            None => self
                .payload
                .get(PRIORITY_KEY)
                .map(Value::to_string)
                .unwrap_or_default(),
        }
    }

    pub fn payload_with_priority(&self, priority: i32) -> Payload {
        let mut payload = self.payload.clone();
        payload.insert(PRIORITY_KEY.to_string(), Value::from(priority));
        payload
    }
}

/// Converts a raw priority into the signed 32-bit value the game sees.
/// Values in the upper half of the unsigned range wrap around.
pub fn signed_priority(raw: i64) -> Option<i32> {
    if let Ok(value) = i32::try_from(raw) {
        return Some(value);
    }
    u32::try_from(raw).ok().map(|value| value as i32)
}

/// Accepts integers, integral floats such as `20.0` and decimal strings.
pub fn priority_from_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(raw) => signed_priority(raw),
            None => number.as_f64().and_then(integral_priority),
        },
        Value::String(text) => {
            let text = text.trim();
            match text.parse::<i64>() {
                Ok(raw) => signed_priority(raw),
                Err(_) => text.parse::<f64>().ok().and_then(integral_priority),
            }
        }
        _ => None,
    }
}

fn integral_priority(raw: f64) -> Option<i32> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return None;
    }
    if raw < f64::from(i32::MIN) || raw >= 4_294_967_296.0 {
        return None;
    }
    signed_priority(raw as i64)
}

/// Legacy priority directories: decimal, signed conversion applied, zero rejected.
pub fn priority_from_dir_name(name: &str) -> Option<i32> {
    let raw: i64 = name.trim().parse().ok()?;
    match signed_priority(raw)? {
        0 => None,
        value => Some(value),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirShape {
    Structured,
    LegacyCustom { priority_dir: String },
    LegacyActorBase { plugin: String, form_id: String },
    Unrecognized,
}

/// Classifies a directory by its path relative to the add-on root.
pub fn classify_dir(relative: &Path, config: &ToolConfig) -> DirShape {
    let segments = path_segments(relative);
    if segments
        .iter()
        .any(|segment| segment.eq_ignore_ascii_case(&config.modern_marker))
    {
        return DirShape::Structured;
    }

    let Some(marker) = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case(&config.legacy_marker))
    else {
        return DirShape::Unrecognized;
    };
    let below = &segments[marker + 1..];

    if let [conditions, priority_dir] = below {
        if conditions.eq_ignore_ascii_case(CUSTOM_CONDITIONS_DIR) {
            return DirShape::LegacyCustom {
                priority_dir: priority_dir.clone(),
            };
        }
    }

    if segments.len() >= ACTOR_BASE_MIN_SEGMENTS {
        if let [plugin, form_id] = below {
            if is_plugin_name(plugin) && is_form_id(form_id) {
                return DirShape::LegacyActorBase {
                    plugin: plugin.clone(),
                    form_id: form_id.clone(),
                };
            }
        }
    }

    DirShape::Unrecognized
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonKind {
    None,
    Structured,
    LegacyCustom,
    LegacyActorBase,
    Mixed,
}

impl AddonKind {
    pub fn from_flags(structured: bool, custom: bool, actor_base: bool) -> Self {
        match (structured, custom, actor_base) {
            (false, false, false) => AddonKind::None,
            (true, false, false) => AddonKind::Structured,
            (false, true, false) => AddonKind::LegacyCustom,
            (false, false, true) => AddonKind::LegacyActorBase,
            _ => AddonKind::Mixed,
        }
    }
}

pub fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn is_plugin_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            PLUGIN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_form_id(name: &str) -> bool {
    name.len() == 8 && name.chars().all(|ch| ch.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ToolConfig {
        ToolConfig::default()
    }

    #[test]
    fn signed_conversion_wraps_unsigned_range() {
        assert_eq!(signed_priority(4_294_967_295), Some(-1));
        assert_eq!(signed_priority(2_147_483_647), Some(2_147_483_647));
        assert_eq!(signed_priority(2_147_483_648), Some(-2_147_483_648));
        assert_eq!(signed_priority(-12), Some(-12));
        assert_eq!(signed_priority(4_294_967_296), None);
    }

    #[test]
    fn priority_values_accept_integral_numbers_and_strings() {
        assert_eq!(priority_from_value(&json!(15)), Some(15));
        assert_eq!(priority_from_value(&json!(4_294_967_295u64)), Some(-1));
        assert_eq!(priority_from_value(&json!(20.0)), Some(20));
        assert_eq!(priority_from_value(&json!(4_294_967_295.0)), Some(-1));
        assert_eq!(priority_from_value(&json!("20")), Some(20));
        assert_eq!(priority_from_value(&json!(" -3 ")), Some(-3));
        assert_eq!(priority_from_value(&json!("20.0")), Some(20));
        assert_eq!(priority_from_value(&json!(1.5)), None);
        assert_eq!(priority_from_value(&json!("high")), None);
        assert_eq!(priority_from_value(&json!(true)), None);
        assert_eq!(priority_from_value(&json!(1e20)), None);
    }

    #[test]
    fn unusable_priority_label_echoes_raw_value() {
        let record = PriorityRecord {
            source_path: None,
            relative_path: PathBuf::from("x"),
            file_name: "config.json".to_string(),
            payload: json!({ "priority": "high" }).as_object().cloned().unwrap(),
            original_priority: None,
            format: RecordFormat::Structured,
            owner_addon_id: "A".to_string(),
            condition_source: None,
        };
        assert_eq!(record.priority_label(), "\"high\"");
    }

    #[test]
    fn legacy_dir_names_reject_zero_and_text() {
        assert_eq!(priority_from_dir_name("250"), Some(250));
        assert_eq!(priority_from_dir_name("4294967295"), Some(-1));
        assert_eq!(priority_from_dir_name("0"), None);
        assert_eq!(priority_from_dir_name("abc"), None);
    }

    #[test]
    fn classifies_directory_shapes() {
        let cfg = config();
        let oar = Path::new("meshes/actors/character/animations/openanimationreplacer/Pack/Sub");
        assert_eq!(classify_dir(oar, &cfg), DirShape::Structured);

        let custom = Path::new(
            "meshes/actors/character/animations/DynamicAnimationReplacer/_CustomConditions/500",
        );
        assert_eq!(
            classify_dir(custom, &cfg),
            DirShape::LegacyCustom {
                priority_dir: "500".to_string()
            }
        );

        let actor = Path::new(
            "meshes/actors/character/animations/DynamicAnimationReplacer/Skyrim.esm/00000007",
        );
        assert_eq!(
            classify_dir(actor, &cfg),
            DirShape::LegacyActorBase {
                plugin: "Skyrim.esm".to_string(),
                form_id: "00000007".to_string()
            }
        );

        let shallow = Path::new("DynamicAnimationReplacer/Skyrim.esm/00000007");
        assert_eq!(classify_dir(shallow, &cfg), DirShape::Unrecognized);
        let not_hex = Path::new(
            "meshes/actors/character/animations/DynamicAnimationReplacer/Skyrim.esm/0000000Z",
        );
        assert_eq!(classify_dir(not_hex, &cfg), DirShape::Unrecognized);
        assert_eq!(classify_dir(Path::new("textures/armor"), &cfg), DirShape::Unrecognized);
    }

    #[test]
    fn addon_kind_mixes() {
        assert_eq!(AddonKind::from_flags(false, false, false), AddonKind::None);
        assert_eq!(AddonKind::from_flags(true, false, false), AddonKind::Structured);
        assert_eq!(AddonKind::from_flags(false, true, true), AddonKind::Mixed);
        assert_eq!(AddonKind::from_flags(true, false, true), AddonKind::Mixed);
    }

    #[test]
    fn payload_rewrite_touches_only_priority() {
        let payload = json!({ "name": "Idle", "priority": 3, "conditions": [{ "a": 1 }] });
        let record = PriorityRecord {
            source_path: None,
            relative_path: PathBuf::from("x"),
            file_name: "config.json".to_string(),
            payload: payload.as_object().cloned().unwrap(),
            original_priority: Some(3),
            format: RecordFormat::Structured,
            owner_addon_id: "A".to_string(),
            condition_source: None,
        };
        let rewritten = record.payload_with_priority(40);
        assert_eq!(rewritten["priority"], json!(40));
        assert_eq!(rewritten["name"], json!("Idle"));
        assert_eq!(rewritten["conditions"], json!([{ "a": 1 }]));
        let keys: Vec<&String> = rewritten.keys().collect();
        assert_eq!(keys, ["name", "priority", "conditions"]);
    }
}
