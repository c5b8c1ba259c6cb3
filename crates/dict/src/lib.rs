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

//! A dictionary that operates as a circular buffer.
//!
//! Entries are kept in insertion order and the oldest are evicted automatically
//! once a maximum entry count, a maximum accounted byte size, or both would be
//! exceeded. Updating a key moves it to the newest position; reads never do.
//!
//! # Feature flags
//!
//! - `python`: Enables Python bindings from [PyO3](https://pyo3.rs).
//! - `extension-module`: Builds as a Python extension module (used with `python`).

#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]

pub mod cache;

#[cfg(feature = "python")]
pub mod python;

pub use circular_dict_core::size::{ByteSizer, FnSizer, GetSizeSizer, NoSizer};

pub use crate::cache::{
    CircularDict, CircularDictConfig, CircularDictError, CircularMap, ConfigError,
};
