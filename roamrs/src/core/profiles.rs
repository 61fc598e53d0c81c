//! Loading connection profiles.
//!
//! Profiles live in a TOML document with one table per network. Table order
//! is priority order:
//!
//! ```toml
//! [HomeNet]
//! pass = "correct horse battery staple"
//!
//! ["Cafe Guest"]
//!
//! [Lab]
//! ip = "10.0.0.5/24"
//! gateway = "10.0.0.1"
//! ```

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::api::models::{ConnectionProfile, ProfileList, RoamError};
use crate::util::utils::{is_valid_address, is_valid_gateway};

/// Source of the ordered profile list.
///
/// Loading twice from an unchanged source yields equal lists.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self) -> Result<ProfileList>;
}

/// Keys accepted inside a profile table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileSection {
    pass: Option<String>,
    ip: Option<String>,
    gateway: Option<String>,
}

/// Reads profiles from a TOML file on every load.
#[derive(Debug, Clone)]
pub struct TomlProfileStore {
    path: PathBuf,
}

impl TomlProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileStore for TomlProfileStore {
    async fn load(&self) -> Result<ProfileList> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| RoamError::ConfigRead {
                path: self.path.clone(),
                source,
            })?;

        let profiles = parse_profiles(&text).map_err(|e| match e {
            RoamError::ConfigParse { reason, .. } => RoamError::ConfigParse {
                path: self.path.clone(),
                reason,
            },
            other => other,
        })?;

        debug!(
            "Loaded {} profiles from {}",
            profiles.len(),
            self.path.display()
        );
        Ok(profiles)
    }
}

/// Parses a profile document, keeping table order.
///
/// Parse errors carry an empty path; [`TomlProfileStore`] fills it in.
pub(crate) fn parse_profiles(text: &str) -> Result<ProfileList> {
    let document: toml::Table = text.parse().map_err(|e: toml::de::Error| parse_error(e.message()))?;

    let mut profiles = Vec::with_capacity(document.len());
    for (name, value) in document {
        if !value.is_table() {
            return Err(parse_error(&format!(
                "'{name}' must be a table, found a {}",
                value.type_str()
            )));
        }

        let section: ProfileSection = value
            .try_into()
            .map_err(|e: toml::de::Error| parse_error(&format!("[{name}]: {}", e.message())))?;

        profiles.push(build_profile(name, section)?);
    }

    ProfileList::new(profiles)
}

fn build_profile(name: String, section: ProfileSection) -> Result<ConnectionProfile> {
    if name.is_empty() {
        return Err(parse_error("profile names must not be empty"));
    }

    if let Some(ip) = &section.ip
        && !is_valid_address(ip)
    {
        return Err(RoamError::InvalidAddress {
            profile: name,
            value: ip.clone(),
        });
    }

    let gateway = match section.gateway {
        Some(gateway) if !is_valid_gateway(&gateway) => {
            return Err(RoamError::InvalidAddress {
                profile: name,
                value: gateway,
            });
        }
        Some(gateway) if section.ip.is_none() => {
            warn!("Ignoring gateway {gateway} for '{name}': it has no static ip");
            None
        }
        gateway => gateway,
    };

    Ok(ConnectionProfile {
        name,
        secret: section.pass,
        address: section.ip,
        gateway,
    })
}

fn parse_error(reason: &str) -> RoamError {
    RoamError::ConfigParse {
        path: PathBuf::new(),
        reason: reason.trim().to_string(),
    }
}
