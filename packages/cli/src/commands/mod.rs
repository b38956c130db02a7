pub mod check;
pub mod inspect;
pub mod resolve;
pub mod styles;

pub use check::{check, diagnose, CheckArgs};
pub use inspect::{inspect, InspectArgs};
pub use resolve::{resolve, resolve_json, ResolveArgs};
pub use styles::{styles, StylesArgs};

use anyhow::{Context, Result};
use pagecraft_editor::{EditSession, EditorConfig};
use std::path::Path;

/// Open a document with the configuration found in `cwd`
pub fn open_session(path: &Path, cwd: &str) -> Result<EditSession> {
    let config = EditorConfig::load(Path::new(cwd))
        .with_context(|| format!("Failed to load configuration from {}", cwd))?;
    EditSession::open_file(path, config)
        .with_context(|| format!("Failed to open {}", path.display()))
}
