//! Configuration module for vsrelay.
//!
//! Settings are read once at startup from a TOML file plus environment
//! overrides, then shared read-only.

mod settings;

pub use settings::{
    mask_secret, OpenAISettings, RelaySettings, ServerSettings, Settings, ToolChoice, MAX_TOP_K,
};
