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

//! Error types for circular dictionaries.
//!
//! Broken internal invariants are not represented here: they panic.

use thiserror::Error;

/// An invalid circular dictionary configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("either `max_len` or `max_size_bytes` must be set")]
    NoCapacity,
    #[error("`max_len` must be positive")]
    ZeroMaxLen,
    #[error("`max_size_bytes` must be positive")]
    ZeroMaxSizeBytes,
    #[error("`max_size_bytes` requires a byte-size measurement, none is available")]
    SizeMeasurementUnavailable,
    #[error("invalid config spec: {0}")]
    InvalidSpec(String),
}

/// Errors returned by circular dictionary operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CircularDictError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("item size {item_size} is larger than max_size_bytes {max_size_bytes}")]
    CapacityExceeded {
        item_size: usize,
        max_size_bytes: usize,
    },
    #[error("item size {item_size} overflows the accounted size {current_size}")]
    SizeOverflow {
        item_size: usize,
        current_size: usize,
    },
    #[error("key not found")]
    KeyNotFound,
    #[error("dictionary is empty")]
    EmptyContainer,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ConfigError::NoCapacity.into(), "either `max_len` or `max_size_bytes` must be set")]
    #[case(
        CircularDictError::CapacityExceeded { item_size: 100, max_size_bytes: 64 },
        "item size 100 is larger than max_size_bytes 64"
    )]
    #[case(
        CircularDictError::SizeOverflow { item_size: 7, current_size: usize::MAX },
        "item size 7 overflows the accounted size 18446744073709551615"
    )]
    #[case(CircularDictError::KeyNotFound, "key not found")]
    #[case(CircularDictError::EmptyContainer, "dictionary is empty")]
    fn test_display(#[case] error: CircularDictError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn test_config_error_converts() {
        let error: CircularDictError = ConfigError::ZeroMaxLen.into();
        assert_eq!(error, CircularDictError::Config(ConfigError::ZeroMaxLen));
    }
}
