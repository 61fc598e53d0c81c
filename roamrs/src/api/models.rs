use std::fmt::{self, Display};
use std::path::PathBuf;
use thiserror::Error;

/// A known network, as loaded from the profile store.
///
/// The profile's position in its [`ProfileList`] is its priority. Profiles
/// are immutable once loaded; a reload replaces the whole list.
///
/// # Example
///
/// ```rust
/// use roamrs::ConnectionProfile;
///
/// let home = ConnectionProfile::new("HomeNet").with_secret("hunter22");
/// let lab = ConnectionProfile::new("Lab")
///     .with_address("10.0.0.5/24")
///     .with_gateway("10.0.0.1");
///
/// assert!(home.is_secured());
/// assert!(lab.is_static());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// SSID of the network; unique within a list
    pub name: String,
    /// Pre-shared key; presence selects WPA-PSK through the supplicant
    pub secret: Option<String>,
    /// Static address, optionally with a prefix length (e.g. `10.0.0.5/24`)
    pub address: Option<String>,
    /// Default route target, only applied together with `address`
    pub gateway: Option<String>,
}

impl ConnectionProfile {
    /// Creates an open, DHCP-addressed profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: None,
            address: None,
            gateway: None,
        }
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }

    /// Returns true if connecting requires the supplicant.
    pub fn is_secured(&self) -> bool {
        self.secret.is_some()
    }

    /// Returns true if the profile bypasses DHCP.
    pub fn is_static(&self) -> bool {
        self.address.is_some()
    }

    /// The security mode a connection to this profile ends up in.
    pub fn security_mode(&self) -> SecurityMode {
        if self.is_secured() {
            SecurityMode::PreSharedKey
        } else {
            SecurityMode::Open
        }
    }

    /// The addressing mode a connection to this profile ends up in.
    pub fn addressing_mode(&self) -> AddressingMode {
        match &self.address {
            Some(address) => AddressingMode::Static {
                address: address.clone(),
            },
            None => AddressingMode::Dhcp,
        }
    }
}

/// Profiles in priority order (index 0 is the most preferred).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileList {
    profiles: Vec<ConnectionProfile>,
}

impl ProfileList {
    /// Builds a list, rejecting duplicate names.
    pub fn new(profiles: Vec<ConnectionProfile>) -> Result<Self, RoamError> {
        for (i, profile) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(RoamError::DuplicateProfile(profile.name.clone()));
            }
        }
        Ok(Self { profiles })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConnectionProfile> {
        self.profiles.iter()
    }

    pub fn as_slice(&self) -> &[ConnectionProfile] {
        &self.profiles
    }

    /// Looks a profile up by name.
    pub fn get(&self, name: &str) -> Option<&ConnectionProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Priority of the named profile, if it is in the list.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }

    /// Profiles eligible to replace the current connection.
    ///
    /// When disconnected this is the whole list. When connected it is every
    /// profile strictly ahead of the active one. A connection whose profile
    /// no longer exists in the list (removed on reload) is outranked by every
    /// known profile.
    pub fn candidates(&self, state: &ConnectionState) -> &[ConnectionProfile] {
        let Some(name) = state.profile_name() else {
            return &self.profiles;
        };

        match self.position(name) {
            Some(index) => &self.profiles[..index],
            None => &self.profiles,
        }
    }
}

impl<'a> IntoIterator for &'a ProfileList {
    type Item = &'a ConnectionProfile;
    type IntoIter = std::slice::Iter<'a, ConnectionProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

/// How the link is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    /// Plain association with `iw connect`
    Open,
    /// WPA-PSK negotiated by `wpa_supplicant`
    PreSharedKey,
}

/// How the interface got its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressingMode {
    /// Address leased by a DHCP client
    Dhcp,
    /// Manually assigned address
    Static {
        /// Address as written in the profile, prefix included
        address: String,
    },
}

/// Everything the agent knows about the link it brought up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLink {
    pub name: String,
    pub security: SecurityMode,
    pub addressing: AddressingMode,
}

/// Snapshot of the interface's connection.
///
/// Values are replaced, never patched: a connection is either fully
/// described by an [`ActiveLink`] or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(ActiveLink),
}

impl ConnectionState {
    /// The state reached by bringing up `profile`.
    pub fn established(profile: &ConnectionProfile) -> Self {
        Self::Connected(ActiveLink {
            name: profile.name.clone(),
            security: profile.security_mode(),
            addressing: profile.addressing_mode(),
        })
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn link(&self) -> Option<&ActiveLink> {
        match self {
            Self::Connected(link) => Some(link),
            Self::Disconnected => None,
        }
    }

    /// Name of the connected profile.
    pub fn profile_name(&self) -> Option<&str> {
        self.link().map(|l| l.name.as_str())
    }

    pub fn security(&self) -> Option<SecurityMode> {
        self.link().map(|l| l.security)
    }

    pub fn addressing(&self) -> Option<&AddressingMode> {
        self.link().map(|l| &l.addressing)
    }
}

impl Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::PreSharedKey => write!(f, "WPA-PSK"),
        }
    }
}

impl Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dhcp => write!(f, "DHCP"),
            Self::Static { address } => write!(f, "static {address}"),
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected(link) => write!(
                f,
                "connected to '{}' ({}, {})",
                link.name, link.security, link.addressing
            ),
        }
    }
}

/// Failure of a single system operation.
///
/// These never interrupt a connect or disconnect; the controller logs them
/// and carries on.
#[derive(Debug, Error)]
pub enum OpError {
    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("{program} exited with {}", .code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    Failed {
        program: &'static str,
        code: Option<i32>,
    },

    /// Reading or writing a supplicant configuration file failed.
    #[error("supplicant config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by the roaming agent.
#[derive(Debug, Error)]
pub enum RoamError {
    /// Scanning for networks failed; the loop retries shortly.
    #[error("scan failed: {0}")]
    ScanFailed(#[source] OpError),

    /// The profile store could not be read.
    #[error("failed to read profiles from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The profile store is not valid TOML or has the wrong shape.
    #[error("malformed profiles in {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// Two profiles share a name.
    #[error("duplicate profile name: {0}")]
    DuplicateProfile(String),

    /// A static address or gateway does not parse.
    #[error("invalid address '{value}' in profile '{profile}'")]
    InvalidAddress { profile: String, value: String },

    /// Termination signal handlers could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
