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

//! Marker traits over the three kinds the core's Schema tracks.
//!
//! The core itself only ever sees `(type index, size, bytes)` tuples; these
//! traits are thin, typed adapters over that so callers don't have to spell
//! out a `TypeDescriptor` by hand for every Rust type they use.

use std::any::TypeId;

/// A fixed-size value that can be stored in a chunk column.
///
/// Components must be `'static` (no borrowed data), matching the core's
/// assumption that component bytes may outlive any particular call stack.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// The element type of a per-entity dynamic array.
pub trait ArrayElement: 'static + Send + Sync + Copy {}

impl<T: 'static + Send + Sync + Copy> ArrayElement for T {}

/// Marker trait for zero-sized tag types. Like `Component`/`ArrayElement`
/// this is a blanket impl rather than a derive, since the trait alone
/// can't express "zero-sized" as a bound; `World::register_tag::<T>()`
/// enforces `size_of::<T>() == 0` at registration time instead, rejecting
/// a non-zero-sized `T` rather than silently discarding its data (tag
/// bits carry no backing column).
pub trait Tag: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Tag for T {}

pub(crate) fn type_id_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

#[allow(dead_code)]
pub(crate) fn name_hash_of<T: 'static>() -> u64 {
    crate::schema::stable_name_hash(std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn type_id_and_name_hash_are_stable_per_type() {
        let id1 = type_id_of::<Position>();
        let id2 = type_id_of::<Position>();
        assert_eq!(id1, id2);

        let h1 = name_hash_of::<Position>();
        let h2 = name_hash_of::<Position>();
        assert_eq!(h1, h2);
    }

    #[test]
    fn distinct_types_get_distinct_identity() {
        assert_ne!(type_id_of::<Position>(), type_id_of::<f32>());
    }
}
