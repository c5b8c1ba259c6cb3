// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Capacity configuration for circular dictionaries.
//!
//! # Spec String Format
//!
//! The `CIRCULAR_DICT` environment variable uses a semicolon-separated format:
//!
//! ```text
//! max_len=1000;max_size_bytes=64_000_000
//! ```
//!
//! ## Supported Keys
//!
//! | Key              | Type    | Description                                   |
//! |------------------|---------|-----------------------------------------------|
//! | `max_len`        | Integer | Maximum number of entries.                    |
//! | `max_size_bytes` | Integer | Maximum accounted size of all entries, bytes. |
//!
//! Keys are case-insensitive. Integers may use `_` as a digit separator.
//! At least one key must be present and every value must be positive.

use std::{
    env::{self, VarError},
    fmt::Display,
};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// The environment variable read by [`CircularDictConfig::from_env`].
pub const CIRCULAR_DICT_ENV: &str = "CIRCULAR_DICT";

/// Capacity limits for a circular dictionary.
///
/// Both limits may be set, in which case each is enforced independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
#[builder(default, derive(Debug))]
pub struct CircularDictConfig {
    /// Maximum number of entries.
    #[builder(setter(strip_option))]
    pub max_len: Option<usize>,
    /// Maximum accounted size of all entries in bytes.
    #[builder(setter(strip_option))]
    pub max_size_bytes: Option<usize>,
}

impl CircularDictConfig {
    /// Creates a new [`CircularDictConfig`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if neither limit is set or a limit is zero.
    pub fn new(max_len: Option<usize>, max_size_bytes: Option<usize>) -> Result<Self, ConfigError> {
        let config = Self {
            max_len,
            max_size_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration bounded by entry count only.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_len` is zero.
    pub fn with_max_len(max_len: usize) -> Result<Self, ConfigError> {
        Self::new(Some(max_len), None)
    }

    /// Creates a configuration bounded by accounted byte size only.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_size_bytes` is zero.
    pub fn with_max_size_bytes(max_size_bytes: usize) -> Result<Self, ConfigError> {
        Self::new(None, Some(max_size_bytes))
    }

    /// Returns a new builder for [`CircularDictConfig`].
    #[must_use]
    pub fn builder() -> CircularDictConfigBuilder {
        CircularDictConfigBuilder::default()
    }

    /// Checks the configuration limits.
    ///
    /// # Errors
    ///
    /// Returns an error if neither limit is set or a limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.max_len, self.max_size_bytes) {
            (None, None) => Err(ConfigError::NoCapacity),
            (Some(0), _) => Err(ConfigError::ZeroMaxLen),
            (_, Some(0)) => Err(ConfigError::ZeroMaxSizeBytes),
            _ => Ok(()),
        }
    }

    /// Parses a configuration from a spec string.
    ///
    /// # Format
    ///
    /// Semicolon-separated key-value pairs:
    /// ```text
    /// max_len=5;max_size_bytes=1024
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the spec string contains invalid syntax, unknown keys,
    /// or describes an invalid configuration.
    pub fn from_spec(spec: &str) -> Result<Self, ConfigError> {
        let config = parse_spec(spec).map_err(|e| ConfigError::InvalidSpec(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from the `CIRCULAR_DICT` environment variable.
    ///
    /// Returns `Ok(None)` if the variable is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set but cannot be parsed.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_env_var(CIRCULAR_DICT_ENV)
    }

    /// Reads the configuration from the environment variable `name`.
    ///
    /// Returns `Ok(None)` if the variable is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set but is not valid Unicode or
    /// cannot be parsed.
    pub fn from_env_var(name: &str) -> Result<Option<Self>, ConfigError> {
        Self::from_var_result(name, env::var(name))
    }

    fn from_var_result(
        name: &str,
        var: Result<String, VarError>,
    ) -> Result<Option<Self>, ConfigError> {
        match var {
            Ok(spec) => Self::from_spec(&spec).map(Some),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidSpec(format!(
                "environment variable {name} is not valid Unicode"
            ))),
        }
    }
}

impl Display for CircularDictConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(max_len) = self.max_len {
            parts.push(format!("max_len={max_len}"));
        }
        if let Some(max_size_bytes) = self.max_size_bytes {
            parts.push(format!("max_size_bytes={max_size_bytes}"));
        }
        write!(f, "{}", parts.join(";"))
    }
}

fn parse_spec(spec: &str) -> anyhow::Result<CircularDictConfig> {
    let mut config = CircularDictConfig::default();

    for kv in spec.split(';') {
        let kv = kv.trim();
        if kv.is_empty() {
            continue;
        }

        let Some((k, v)) = kv.split_once('=') else {
            anyhow::bail!("Invalid spec pair: {kv}");
        };

        let value = parse_usize(v.trim())?;
        match k.trim().to_lowercase().as_str() {
            "max_len" | "maxlen" => config.max_len = Some(value),
            "max_size_bytes" | "maxsize_bytes" => config.max_size_bytes = Some(value),
            other => anyhow::bail!("Unknown spec key: {other}"),
        }
    }

    Ok(config)
}

fn parse_usize(value: &str) -> anyhow::Result<usize> {
    let digits: String = value.chars().filter(|c| *c != '_').collect();
    digits
        .parse::<usize>()
        .map_err(|e| anyhow::anyhow!("Invalid integer '{value}': {e}"))
}
