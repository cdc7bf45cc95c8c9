//! Footprint library access.
//!
//! The updater only needs one capability from a library: instantiate a fresh
//! copy of a footprint by its [`LibId`]. Missing footprints are a recoverable
//! condition, so loaders return `Option` and log the underlying cause.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::board::{Footprint, Kiid};

/// Footprint library identifier, written `library:item`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LibId {
    pub library: String,
    pub item: String,
}

impl LibId {
    pub fn new(library: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            item: item.into(),
        }
    }

    /// True when no footprint is assigned.
    pub fn is_empty(&self) -> bool {
        self.item.is_empty()
    }
}

impl fmt::Display for LibId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.library.is_empty() {
            f.write_str(&self.item)
        } else {
            write!(f, "{}:{}", self.library, self.item)
        }
    }
}

impl From<String> for LibId {
    fn from(s: String) -> Self {
        match s.split_once(':') {
            Some((library, item)) => LibId::new(library, item),
            None => LibId::new("", s),
        }
    }
}

impl From<&str> for LibId {
    fn from(s: &str) -> Self {
        LibId::from(s.to_string())
    }
}

impl From<LibId> for String {
    fn from(id: LibId) -> Self {
        id.to_string()
    }
}

/// Source of library footprints.
pub trait FootprintLoader {
    /// Instantiate a new footprint for `fpid`, or `None` when it cannot be found.
    fn load_footprint(&self, fpid: &LibId) -> Option<Footprint>;
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("footprint \"{0}\" has no library nickname")]
    MissingLibrary(LibId),

    #[error("footprint file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid footprint JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Give a freshly loaded footprint its own identity and library id.
fn instantiate(mut footprint: Footprint, fpid: &LibId) -> Footprint {
    footprint.id = Kiid::new();
    footprint.fpid = fpid.clone();
    footprint
}

/// In-memory library, mostly useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct FootprintLibrary {
    footprints: HashMap<LibId, Footprint>,
}

impl FootprintLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, footprint: Footprint) {
        self.footprints.insert(footprint.fpid.clone(), footprint);
    }

    pub fn with(mut self, footprint: Footprint) -> Self {
        self.insert(footprint);
        self
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}

impl FootprintLoader for FootprintLibrary {
    fn load_footprint(&self, fpid: &LibId) -> Option<Footprint> {
        self.footprints
            .get(fpid)
            .cloned()
            .map(|fp| instantiate(fp, fpid))
    }
}

/// Directory of JSON footprints laid out as `<root>/<library>/<item>.json`.
#[derive(Debug, Clone)]
pub struct JsonFootprintLibrary {
    root: PathBuf,
}

impl JsonFootprintLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn footprint_path(&self, fpid: &LibId) -> Result<PathBuf, LibraryError> {
        if fpid.library.is_empty() {
            return Err(LibraryError::MissingLibrary(fpid.clone()));
        }
        Ok(self
            .root
            .join(&fpid.library)
            .join(format!("{}.json", fpid.item)))
    }

    /// Load a footprint, reporting the reason on failure.
    pub fn try_load(&self, fpid: &LibId) -> Result<Footprint, LibraryError> {
        let path = self.footprint_path(fpid)?;
        if !path.exists() {
            return Err(LibraryError::NotFound(path));
        }

        let content = std::fs::read_to_string(&path).map_err(|source| LibraryError::Io {
            path: path.clone(),
            source,
        })?;
        let footprint: Footprint =
            serde_json::from_str(&content).map_err(|source| LibraryError::Json {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded footprint {} from {}", fpid, path.display());
        Ok(instantiate(footprint, fpid))
    }
}

impl FootprintLoader for JsonFootprintLibrary {
    fn load_footprint(&self, fpid: &LibId) -> Option<Footprint> {
        match self.try_load(fpid) {
            Ok(fp) => Some(fp),
            Err(e) => {
                warn!("Failed to load footprint {fpid}: {e}");
                None
            }
        }
    }
}
