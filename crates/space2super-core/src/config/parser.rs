// Space2Super Config Parser
// Parse TOML configuration into target, substitute, timeout and role lists

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::engine::DEFAULT_TIMEOUT_MS;
use crate::key::KEY_CNT;
use crate::output::VIRTUAL_DEVICE_NAME;
use crate::role::{RoleResolver, RoleTable, DEFAULT_COMPANIONS, DEFAULT_MODIFIERS};
use crate::Key;

/// Shortest accepted hold timeout
pub const MIN_TIMEOUT_MS: u64 = 1;
/// Longest accepted hold timeout
pub const MAX_TIMEOUT_MS: u64 = 10_000;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Target key not available: {0}")]
    UnknownTargetKey(String),

    #[error("Substitute key not available: {0}")]
    UnknownSubstituteKey(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Timeout value out of range: {0}")]
    TimeoutOutOfRange(String),

    #[error("Key assigned to more than one role: {0}")]
    OverlappingRoles(String),
}

/// A key given either by symbol or by raw code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    Code(u16),
    Name(String),
}

impl FromStr for KeySpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<u16>() {
            Ok(code) => KeySpec::Code(code),
            Err(_) => KeySpec::Name(trimmed.to_string()),
        })
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Code(code) => write!(f, "{}", code),
            KeySpec::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Main configuration structure (root TOML table)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    #[serde(default)]
    pub general: Option<GeneralConfig>,

    #[serde(default)]
    pub roles: Option<RolesConfig>,

    #[serde(default)]
    pub devices: Option<DevicesConfig>,

    #[serde(default)]
    pub output: Option<OutputConfig>,
}

/// General settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Key to disambiguate (symbol or code)
    pub target: Option<KeySpec>,
    /// Key emitted on a tap (symbol or code)
    pub substitute: Option<KeySpec>,
    /// Longest hold still counted as a tap
    pub timeout_ms: Option<u64>,
}

/// Role symbol lists; each replaces its default when present
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolesConfig {
    pub companions: Option<Vec<String>>,
    pub modifiers: Option<Vec<String>>,
}

/// Device filtering configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevicesConfig {
    /// Explicit device names/paths to watch
    #[serde(default)]
    pub only: Vec<String>,
}

/// Virtual output device configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub device_name: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Key to disambiguate
    pub target: KeySpec,
    /// Key emitted on a tap
    pub substitute: KeySpec,
    /// Hold timeout (milliseconds)
    pub timeout_ms: u64,
    /// Companion symbols
    pub companions: Vec<String>,
    /// Modifier symbols
    pub modifiers: Vec<String>,
    /// Device name/path filter (empty = autodetect keyboards and pointers)
    pub device_filter: Vec<String>,
    /// Name of the virtual output keyboard
    pub device_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: KeySpec::Name("SPACE".to_string()),
            substitute: KeySpec::Name("F24".to_string()),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            companions: DEFAULT_COMPANIONS.iter().map(|s| s.to_string()).collect(),
            modifiers: DEFAULT_MODIFIERS.iter().map(|s| s.to_string()).collect(),
            device_filter: Vec::new(),
            device_name: VIRTUAL_DEVICE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// Get the default config path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("space2super").join("config.toml"))
    }

    /// Load from default location (~/.config/space2super/config.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                log::info!("Loading config from {}", path.display());
                return Self::from_toml_path(path);
            }
        }
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Hold timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check values that do not depend on the key resolver.
    ///
    /// Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::TimeoutOutOfRange(format!(
                "timeout_ms must be {}-{}ms, got {}",
                MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, self.timeout_ms
            )));
        }
        check_overlap(&self.companions, &self.modifiers)
    }

    /// Build the role table for this configuration.
    ///
    /// Companion and modifier symbols must all be known to `resolver`;
    /// aliases are compared by the canonical symbol they resolve to. The
    /// target keeps its role even when its symbol is also listed.
    pub fn role_table<R: RoleResolver + ?Sized>(
        &self,
        resolver: &R,
    ) -> Result<RoleTable, ConfigError> {
        self.validate()?;

        let companions = canonical_symbols(resolver, &self.companions)?;
        let modifiers = canonical_symbols(resolver, &self.modifiers)?;
        check_overlap(&companions, &modifiers)?;

        let is_companion = |symbol: &str| contains_symbol(&companions, symbol);
        let is_modifier = |symbol: &str| contains_symbol(&modifiers, symbol);

        match &self.target {
            KeySpec::Name(name) => RoleTable::build(resolver, name, is_companion, is_modifier),
            KeySpec::Code(code) => {
                RoleTable::with_target_code(resolver, Key::from(*code), is_companion, is_modifier)
            }
        }
    }

    /// Resolve the substitute key
    pub fn substitute_key<R: RoleResolver + ?Sized>(&self, resolver: &R) -> Result<Key, ConfigError> {
        let code = match &self.substitute {
            KeySpec::Name(name) => resolver
                .code(name)
                .ok_or_else(|| ConfigError::UnknownSubstituteKey(name.clone()))?,
            KeySpec::Code(code) => *code,
        };
        let key = Key::from(code);
        if code == 0 || code as usize >= KEY_CNT || key.is_pointer_button() {
            return Err(ConfigError::UnknownSubstituteKey(self.substitute.to_string()));
        }
        Ok(key)
    }
}

impl ConfigToml {
    /// Convert parsed TOML to internal Config structure
    fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(general) = &self.general {
            if let Some(target) = &general.target {
                config.target = target.clone();
            }
            if let Some(substitute) = &general.substitute {
                config.substitute = substitute.clone();
            }
            if let Some(timeout_ms) = general.timeout_ms {
                config.timeout_ms = timeout_ms;
            }
        }

        if let Some(roles) = &self.roles {
            if let Some(companions) = &roles.companions {
                config.companions = trimmed(companions)?;
            }
            if let Some(modifiers) = &roles.modifiers {
                config.modifiers = trimmed(modifiers)?;
            }
        }

        if let Some(devices) = &self.devices {
            config.device_filter = devices.only.clone();
        }

        if let Some(output) = &self.output {
            if let Some(name) = &output.device_name {
                config.device_name = name.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn trimmed(symbols: &[String]) -> Result<Vec<String>, ConfigError> {
    symbols
        .iter()
        .map(|s| {
            let s = s.trim();
            if s.is_empty() {
                Err(ConfigError::InvalidKey("empty key name".to_string()))
            } else {
                Ok(s.to_string())
            }
        })
        .collect()
}

fn canonical_symbol<R: RoleResolver + ?Sized>(resolver: &R, name: &str) -> Option<String> {
    let code = resolver.code(name)?;
    Some(resolver.symbol(code).unwrap_or(name).to_string())
}

fn canonical_symbols<R: RoleResolver + ?Sized>(
    resolver: &R,
    names: &[String],
) -> Result<Vec<String>, ConfigError> {
    names
        .iter()
        .map(|name| {
            canonical_symbol(resolver, name).ok_or_else(|| ConfigError::InvalidKey(name.clone()))
        })
        .collect()
}

fn contains_symbol(symbols: &[String], symbol: &str) -> bool {
    symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol))
}

fn check_overlap(companions: &[String], modifiers: &[String]) -> Result<(), ConfigError> {
    if let Some(both) = companions.iter().find(|s| contains_symbol(modifiers, s)) {
        return Err(ConfigError::OverlappingRoles(format!(
            "{} is both a companion and a modifier",
            both
        )));
    }
    Ok(())
}

/// Starter config written by users to ~/.config/space2super/config.toml
pub fn default_config_content() -> &'static str {
    r#"# Space2Super configuration
# Place this file at: ~/.config/space2super/config.toml

[general]
# Key to disambiguate: tapped alone it emits `substitute`, held it stays
# whatever the host maps it to (Super, with a host-side remap)
target = "SPACE"
# Key emitted on a tap; map it to space on the host
substitute = "F24"
# Longest hold (ms) still counted as a tap
timeout_ms = 600

[roles]
# Chording target + companion emits the substitute immediately
companions = ["LEFT_META", "RIGHT_META"]
# Holding any of these while the target is down suppresses the tap
modifiers = ["LEFT_SHIFT", "RIGHT_SHIFT", "LEFT_CTRL", "RIGHT_CTRL", "LEFT_ALT", "RIGHT_ALT"]

[devices]
# Explicit device names or /dev/input paths (empty = autodetect)
only = []

[output]
device_name = "Space2Super (virtual) Keyboard"
"#
}
