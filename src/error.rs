// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types.
//!
//! All failures surface immediately to the caller; there is no retry, no
//! partial recovery, no logging inside the core. Debug builds run every
//! invariant check (entity-present, component-present/absent, handle
//! range, chunk-mask membership); release builds may elide them, but the
//! externally observable error set must stay the same for bug-free
//! callers.

use std::fmt;

/// The full set of ways a core operation can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity, component, array, tag, or reference not present.
    Missing,

    /// Attempt to add something already present.
    AlreadyPresent,

    /// Semantic violation: self-parent, bad reference handle, size
    /// mismatch on `SetComponentBytes`, and similar caller errors.
    Invalid(String),

    /// Type registration would exceed `CAP` slots for its kind.
    CapacityExceeded,

    /// Use of a `World` after it has been disposed.
    Disposed,

    /// A query was read before its first `update()` call.
    OrderViolation,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::Missing => write!(f, "entity, component, array, tag, or reference not found"),
            EcsError::AlreadyPresent => write!(f, "already present"),
            EcsError::Invalid(msg) => write!(f, "invalid operation: {msg}"),
            EcsError::CapacityExceeded => write!(f, "type registration would exceed capacity"),
            EcsError::Disposed => write!(f, "world has already been disposed"),
            EcsError::OrderViolation => write!(f, "query read before the first update()"),
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EcsError>;
