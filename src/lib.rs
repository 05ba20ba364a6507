pub mod cli;
pub mod config;
pub mod conflict;
pub mod deployment;
pub mod error;
pub mod legacy;
pub mod modlist;
pub mod record;
pub mod renumber;
pub mod scan;
pub mod session;
pub mod structured;

pub use config::ToolConfig;
pub use conflict::{detect_conflicts, ConflictReport, PriorityRange};
pub use deployment::{
    canonicalize_name, extract_ordered_sources, parse_deployment_manifest,
    resolve_source_to_folder,
};
pub use error::{PriorityError, PriorityResult};
pub use record::{AddonKind, PriorityRecord, RecordFormat};
pub use renumber::{renumber, RenumberOptions, RenumberOutcome};
pub use scan::{detect_addon_kind, scan_addon, AddonLookup};
pub use session::{LoadMode, RunLog, Session, SortKey};
