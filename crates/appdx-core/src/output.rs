// ── Export output tree ──
//
// <output_dir>/<timestamp>/
//   <app name or id>/<entity>.json
//   account/<entity>.json
//   dashboards/<dashboard name or id>.json

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::entity_list::EntityInfo;
use crate::error::CoreError;

const ACCOUNT_DIR: &str = "account";
const DASHBOARD_DIR: &str = "dashboards";

/// Timestamp used for the per-run directory name.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Root of one export run. Created up front, filled incrementally.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    /// Create `<output_dir>/<timestamp>/`.
    pub fn create(output_dir: &Path, timestamp: &str) -> Result<Self, CoreError> {
        let root = output_dir.join(timestamp);
        fs::create_dir_all(&root).map_err(|source| CoreError::Io {
            path: root.clone(),
            source,
        })?;
        debug!(root = %root.display(), "output directory created");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_application_entity(
        &self,
        app: &EntityInfo,
        entity: &str,
        body: &str,
    ) -> Result<PathBuf, CoreError> {
        let dir = self.root.join(entity_dir_name(app));
        write_json(&dir, entity, body)
    }

    pub fn write_account_entity(&self, entity: &str, body: &str) -> Result<PathBuf, CoreError> {
        write_json(&self.root.join(ACCOUNT_DIR), entity, body)
    }

    pub fn write_dashboard(&self, dashboard: &EntityInfo, body: &str) -> Result<PathBuf, CoreError> {
        write_json(&self.root.join(DASHBOARD_DIR), &entity_dir_name(dashboard), body)
    }
}

/// The entity's name when it is usable as a single path segment,
/// otherwise its id.
fn entity_dir_name(info: &EntityInfo) -> String {
    let name = info.name.as_str();
    let unsafe_segment = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if unsafe_segment {
        info.id.to_string()
    } else {
        name.to_owned()
    }
}

fn write_json(dir: &Path, stem: &str, body: &str) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(dir).map_err(|source| CoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let file_name = format!("{}.json", stem.replace(['/', '\\'], "_"));
    let path = dir.join(file_name);
    fs::write(&path, body).map_err(|source| CoreError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), bytes = body.len(), "wrote");
    Ok(path)
}
