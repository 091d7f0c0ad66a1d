//! Local credential vault
//!
//! A single JSON document mapping a credential-set name to its entry:
//!
//! ```json
//! {
//!     "gist-shell": {
//!         "credentials": {
//!             "created_at": "2017-02-18T09:12:44Z",
//!             "id": 1234,
//!             "token": "...",
//!             "username": "octocat"
//!         },
//!         "default": true
//!     }
//! }
//! ```
//!
//! At most one entry carries `default: true`; this is enforced on write.
//! Writes go through a temporary file in the same directory that is renamed
//! over the vault, so a crash never leaves a half-written file behind.
//!
//! Entries are kept as raw JSON so that one malformed entry can be told apart
//! from a corrupt file. A malformed entry found while clearing default flags
//! aborts the write unless `force` is set, in which case the whole store is
//! discarded.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{GistError, Result};

/// Credentials retained from a GitHub authorization
///
/// Fields are declared in alphabetical order so the serialized form keeps
/// sorted keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// When the authorization was created (ISO 8601)
    #[serde(default, alias = "created-at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Authorization id on GitHub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// The access token
    pub token: String,
    /// GitHub login the token belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Credentials {
    /// Credentials holding only a token
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            created_at: None,
            id: None,
            token: token.into(),
            username: None,
        }
    }

    /// The token wrapped for handing to the API client
    pub fn secret_token(&self) -> SecretString {
        SecretString::from(self.token.clone())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("created_at", &self.created_at)
            .field("id", &self.id)
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

/// One named credential set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    pub credentials: Credentials,
    pub default: bool,
}

impl VaultEntry {
    pub fn new(credentials: Credentials, default: bool) -> Self {
        Self {
            credentials,
            default,
        }
    }
}

/// In-memory copy of the vault file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vault {
    entries: Map<String, Value>,
}

impl Vault {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Typed entry for `name`; fails if the stored entry is malformed
    pub fn entry(&self, name: &str) -> Result<Option<VaultEntry>> {
        match self.entries.get(name) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| GistError::VaultMalformed(format!("entry '{}': {}", name, e))),
            None => Ok(None),
        }
    }

    /// Name of the first entry (in sorted order) flagged as default
    pub fn default_name(&self) -> Option<&str> {
        self.names().into_iter().find(|name| {
            self.entries
                .get(*name)
                .and_then(|entry| entry.get("default"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
    }

    fn insert(&mut self, name: &str, entry: &VaultEntry) -> Result<()> {
        self.entries
            .insert(name.to_string(), serde_json::to_value(entry)?);
        Ok(())
    }

    /// Clear the default flag on every stored entry
    fn clear_defaults(&mut self) -> Result<()> {
        for (name, entry) in self.entries.iter_mut() {
            match entry.get_mut("default") {
                Some(Value::Bool(flag)) => *flag = false,
                _ => {
                    return Err(GistError::VaultMalformed(format!(
                        "entry '{}' has no boolean 'default' flag",
                        name
                    )))
                }
            }
        }
        Ok(())
    }

    /// Serialize with sorted keys and 4-space indentation
    fn to_json(&self) -> Result<Vec<u8>> {
        let sorted: BTreeMap<&String, &Value> = self.entries.iter().collect();

        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        sorted.serialize(&mut serializer)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

/// Result of reading the vault file
enum Loaded {
    Missing,
    Corrupt(String),
    Parsed(Vault),
}

fn load(path: &Path) -> Result<Loaded> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Loaded::Missing),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return Ok(Loaded::Corrupt("file is not valid UTF-8".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(entries)) => Loaded::Parsed(Vault { entries }),
        Ok(_) => Loaded::Corrupt("top-level value is not an object".to_string()),
        Err(e) => Loaded::Corrupt(e.to_string()),
    })
}

/// Replace the file at `path` with `contents` via a temp file + rename
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // NamedTempFile is created with mode 0600 on Unix
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.flush()?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "vault written");
    Ok(())
}

/// Read the whole vault; a missing file is an empty vault
pub fn open(path: &Path) -> Result<Vault> {
    match load(path)? {
        Loaded::Missing => Ok(Vault::default()),
        Loaded::Corrupt(reason) => Err(GistError::VaultMalformed(reason)),
        Loaded::Parsed(vault) => Ok(vault),
    }
}

/// Fetch credentials by name, or the default set when `name` is `None`
///
/// Never modifies the file.
pub fn fetch(path: &Path, name: Option<&str>) -> Result<Credentials> {
    let vault = match load(path)? {
        Loaded::Missing => return Err(not_found(name)),
        Loaded::Corrupt(reason) => return Err(GistError::VaultMalformed(reason)),
        Loaded::Parsed(vault) => vault,
    };

    let name = match name {
        Some(name) => name,
        None => vault.default_name().ok_or_else(|| not_found(None))?,
    };

    vault
        .entry(name)?
        .map(|entry| entry.credentials)
        .ok_or_else(|| not_found(Some(name)))
}

/// Store `entry` under `name`
///
/// Without `force`, an existing `name` is a conflict and a corrupt file or
/// entry aborts the write. With `force`, the entry is replaced and corrupt
/// content is discarded. When `entry.default` is set every other entry loses
/// its default flag.
pub fn update(path: &Path, name: &str, entry: VaultEntry, force: bool) -> Result<Vault> {
    let mut vault = match load(path)? {
        Loaded::Missing => Vault::default(),
        Loaded::Parsed(vault) => vault,
        Loaded::Corrupt(reason) if force => {
            warn!(path = %path.display(), %reason, "overwriting corrupt vault");
            Vault::default()
        }
        Loaded::Corrupt(reason) => return Err(GistError::VaultMalformed(reason)),
    };

    if vault.contains(name) && !force {
        return Err(GistError::VaultConflict(name.to_string()));
    }

    if entry.default {
        if let Err(err) = vault.clear_defaults() {
            if !force {
                return Err(err);
            }
            warn!(path = %path.display(), error = %err, "discarding vault with malformed entry");
            vault = Vault::default();
        }
    }

    vault.insert(name, &entry)?;
    write_atomic(path, &vault.to_json()?)?;
    Ok(vault)
}

/// Remove the entry stored under `name`
pub fn remove(path: &Path, name: &str) -> Result<Vault> {
    let mut vault = match load(path)? {
        Loaded::Missing => return Err(not_found(Some(name))),
        Loaded::Corrupt(reason) => return Err(GistError::VaultMalformed(reason)),
        Loaded::Parsed(vault) => vault,
    };

    if vault.entries.remove(name).is_none() {
        return Err(not_found(Some(name)));
    }

    write_atomic(path, &vault.to_json()?)?;
    Ok(vault)
}

fn not_found(name: Option<&str>) -> GistError {
    match name {
        Some(name) => GistError::NotFound(format!("Credentials '{}'", name)),
        None => GistError::NotFound("Default credentials".to_string()),
    }
}
