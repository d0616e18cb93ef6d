// Space2Super Config API
// TOML configuration and key role settings

pub mod parser;

pub use parser::{
    default_config_content, Config, ConfigError, ConfigToml, DevicesConfig, GeneralConfig,
    KeySpec, OutputConfig, RolesConfig, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS,
};
