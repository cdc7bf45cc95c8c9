//! Updater options, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateOptions {
    /// Clear nets that end up on a single pad and no zone.
    pub delete_single_pad_nets: bool,
    /// Remove footprints with no matching component.
    pub delete_unused_footprints: bool,
    /// Report what would change without touching the board.
    pub dry_run: bool,
    /// Exchange footprints whose library id differs from the netlist.
    pub replace_footprints: bool,
    /// Match footprints by symbol path instead of reference designator.
    #[serde(alias = "lookup_by_timestamp")]
    pub lookup_by_path: bool,
    pub warn_for_no_net_pads: bool,
    /// Pads of newly added footprints are left unlocked.
    pub add_unlocked_pads: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            delete_single_pad_nets: true,
            delete_unused_footprints: false,
            dry_run: false,
            replace_footprints: true,
            lookup_by_path: false,
            warn_for_no_net_pads: false,
            add_unlocked_pads: true,
        }
    }
}

impl UpdateOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
