//! Board net registry.
//!
//! Nets are identified by a unique name and a unique integer code. Code 0 is
//! the permanent "unconnected" net: it has an empty name, is always current
//! and can never be removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetCode(pub u32);

impl NetCode {
    pub const UNCONNECTED: NetCode = NetCode(0);

    pub fn is_unconnected(self) -> bool {
        self == Self::UNCONNECTED
    }
}

impl fmt::Display for NetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: NetCode,
    pub name: String,
    /// Liveness flag used by the stale-net sweep. Not persisted.
    #[serde(skip, default = "default_current")]
    pub is_current: bool,
}

fn default_current() -> bool {
    true
}

impl NetInfo {
    pub fn new(code: NetCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            is_current: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NetRegistryError {
    #[error("duplicate net code {0}")]
    DuplicateCode(NetCode),
    #[error("duplicate net name \"{0}\"")]
    DuplicateName(String),
    #[error("net code 0 must be the unnamed unconnected net, found \"{0}\"")]
    NamedSentinel(String),
}

/// All nets of a board, keyed by code and indexed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<NetInfo>", try_from = "Vec<NetInfo>")]
pub struct NetRegistry {
    by_code: BTreeMap<NetCode, NetInfo>,
    by_name: BTreeMap<String, NetCode>,
}

impl Default for NetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NetRegistry {
    pub fn new() -> Self {
        let mut by_code = BTreeMap::new();
        by_code.insert(NetCode::UNCONNECTED, NetInfo::new(NetCode::UNCONNECTED, ""));
        Self {
            by_code,
            by_name: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        // the sentinel is always present
        false
    }

    pub fn get(&self, code: NetCode) -> Option<&NetInfo> {
        self.by_code.get(&code)
    }

    pub fn get_mut(&mut self, code: NetCode) -> Option<&mut NetInfo> {
        self.by_code.get_mut(&code)
    }

    /// Look up a net by name. The empty name resolves to the sentinel.
    pub fn find(&self, name: &str) -> Option<&NetInfo> {
        if name.is_empty() {
            return self.get(NetCode::UNCONNECTED);
        }
        self.by_name.get(name).and_then(|code| self.by_code.get(code))
    }

    /// Name of the net with `code`, or the empty string when it is unknown.
    pub fn name_of(&self, code: NetCode) -> &str {
        self.get(code).map(|n| n.name.as_str()).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetInfo> {
        self.by_code.values()
    }

    /// One past the highest code, or the lowest free code once the top of
    /// the range is taken.
    fn next_code(&self) -> NetCode {
        let last = self.by_code.keys().next_back().map_or(0, |c| c.0);
        if let Some(code) = last.checked_add(1) {
            return NetCode(code);
        }
        let gap = self
            .by_code
            .keys()
            .skip(1)
            .zip(1u32..)
            .find(|(used, expected)| used.0 != *expected)
            .map(|(_, expected)| expected);
        NetCode(gap.unwrap_or(self.by_code.len() as u32))
    }

    /// Register a new net and return its code. An existing net with the same
    /// name is returned unchanged.
    pub fn add(&mut self, name: &str) -> NetCode {
        if let Some(net) = self.find(name) {
            return net.code;
        }
        let code = self.next_code();
        self.by_name.insert(name.to_string(), code);
        self.by_code.insert(code, NetInfo::new(code, name));
        code
    }

    /// Re-insert a previously removed net with its original code.
    pub fn restore(&mut self, mut net: NetInfo) {
        if net.code.is_unconnected() {
            return;
        }
        net.is_current = true;
        self.by_name.insert(net.name.clone(), net.code);
        self.by_code.insert(net.code, net);
    }

    /// Remove a net. The sentinel cannot be removed.
    pub fn remove(&mut self, code: NetCode) -> Option<NetInfo> {
        if code.is_unconnected() {
            return None;
        }
        let net = self.by_code.remove(&code)?;
        self.by_name.remove(&net.name);
        Some(net)
    }

    /// Phase one of the stale-net sweep: only the sentinel stays current.
    pub fn mark_all_stale(&mut self) {
        for net in self.by_code.values_mut() {
            net.is_current = net.code.is_unconnected();
        }
    }

    pub fn set_current(&mut self, code: NetCode) {
        if let Some(net) = self.by_code.get_mut(&code) {
            net.is_current = true;
        }
    }

    /// Nets that are not current, in code order.
    pub fn stale(&self) -> Vec<NetInfo> {
        self.by_code
            .values()
            .filter(|n| !n.is_current && !n.code.is_unconnected())
            .cloned()
            .collect()
    }
}

impl From<NetRegistry> for Vec<NetInfo> {
    fn from(registry: NetRegistry) -> Self {
        registry.by_code.into_values().collect()
    }
}

impl TryFrom<Vec<NetInfo>> for NetRegistry {
    type Error = NetRegistryError;

    fn try_from(nets: Vec<NetInfo>) -> Result<Self, Self::Error> {
        let mut registry = NetRegistry::new();
        for net in nets {
            if net.code.is_unconnected() {
                if !net.name.is_empty() {
                    return Err(NetRegistryError::NamedSentinel(net.name));
                }
                continue;
            }
            if registry.by_code.contains_key(&net.code) {
                return Err(NetRegistryError::DuplicateCode(net.code));
            }
            if net.name.is_empty() || registry.by_name.contains_key(&net.name) {
                return Err(NetRegistryError::DuplicateName(net.name));
            }
            registry.restore(net);
        }
        Ok(registry)
    }
}
