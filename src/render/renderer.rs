use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::descriptor::VpnConnection;
use crate::error::{ConfgenError, ConfgenResult};

/// The closed set of supported target formats
///
/// Each variant is bound to exactly one renderer implementation; the set is
/// fixed at compile time and never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    /// Route-based IPSec (strongSwan, VTI interface per tunnel)
    Strongswan,
    /// Policy-based IPSec (racoon, traffic selectors)
    Racoon,
    /// BGP, Quagga/Zebra bgpd.conf dialect
    Quagga,
    /// BGP, BIRD 1.x bird.conf dialect
    Bird,
}

impl ConfigFormat {
    pub const ALL: [ConfigFormat; 4] = [
        ConfigFormat::Strongswan,
        ConfigFormat::Racoon,
        ConfigFormat::Quagga,
        ConfigFormat::Bird,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Strongswan => "strongswan",
            ConfigFormat::Racoon => "racoon",
            ConfigFormat::Quagga => "quagga",
            ConfigFormat::Bird => "bird",
        }
    }

    /// Comma-separated list of every valid identifier, for error messages
    pub fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// True for the formats that configure an IPSec daemon
    pub fn is_ipsec(&self) -> bool {
        matches!(self, ConfigFormat::Strongswan | ConfigFormat::Racoon)
    }

    /// True for the formats that configure a BGP daemon
    pub fn is_bgp(&self) -> bool {
        matches!(self, ConfigFormat::Quagga | ConfigFormat::Bird)
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfgenError;

    // Identifiers match case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| ConfgenError::UnknownFormat {
                requested: s.to_string(),
                known: Self::known_names(),
            })
    }
}

/// Output of one render invocation
///
/// Some daemons split their configuration across a world-readable main file
/// and a restricted secrets file (ipsec.conf/ipsec.secrets, racoon.conf/
/// psk.txt). Both artifacts come out of a single render call so neither has
/// to be re-derived from the AWS data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Main configuration text in the daemon's native syntax
    pub main: String,
    /// Secrets file content, for formats with a split-file convention
    pub secrets: Option<String>,
}

impl Rendered {
    pub fn main_only(main: String) -> Self {
        Self {
            main,
            secrets: None,
        }
    }

    pub fn with_secrets(main: String, secrets: String) -> Self {
        Self {
            main,
            secrets: Some(secrets),
        }
    }
}

/// Common interface all config renderers implement
///
/// Renderers are pure and deterministic: no I/O, no state, identical input
/// produces byte-identical output. Tunnel 1 is always rendered before
/// tunnel 2.
pub trait Renderer: Send + Sync {
    /// The format this renderer produces
    fn format(&self) -> ConfigFormat;

    /// Render the connection into the target daemon's configuration syntax
    fn render(&self, conn: &VpnConnection) -> ConfgenResult<Rendered>;
}

/// Factory function type for creating renderers
pub type RendererFactory = fn() -> Box<dyn Renderer>;
