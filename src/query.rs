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

//! Filtered, materialized views over the chunk index.
//!
//! A `Query` is rebuilt by an explicit `update()` call rather than kept
//! live — cheaper for callers that query once per frame/tick than
//! incrementally maintaining matches on every structural change.

use crate::bitmask::BitMask;
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::schema::TypeIndex;
use crate::world::World;

/// Entity-only filtered query: required/forbidden component masks, with
/// optional exact-match and include-disabled flags.
pub struct Query {
    required: BitMask,
    forbidden: BitMask,
    required_arrays: BitMask,
    required_tags: BitMask,
    exact: bool,
    include_disabled: bool,
    results: Option<Vec<EntityId>>,
}

impl Query {
    pub fn new(required: BitMask) -> Self {
        Self {
            required,
            forbidden: BitMask::EMPTY,
            required_arrays: BitMask::EMPTY,
            required_tags: BitMask::EMPTY,
            exact: false,
            include_disabled: false,
            results: None,
        }
    }

    pub fn with_forbidden(mut self, forbidden: BitMask) -> Self {
        self.forbidden = forbidden;
        self
    }

    /// Array/tag masks considered when `exact_match(true)` is set. Ignored
    /// for the ordinary required/forbidden matching.
    pub fn with_exact_arrays_and_tags(mut self, arrays: BitMask, tags: BitMask) -> Self {
        self.required_arrays = arrays;
        self.required_tags = tags;
        self
    }

    pub fn exact_match(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn include_disabled(mut self, include: bool) -> Self {
        self.include_disabled = include;
        self
    }

    fn chunk_matches(&self, components: BitMask, arrays: BitMask, tags: BitMask) -> bool {
        if self.exact {
            return components == self.required && arrays == self.required_arrays && tags == self.required_tags;
        }
        self.required.subset_of(components) && components.disjoint_from(self.forbidden)
    }

    /// Rebuild the result list by scanning the chunk index. A forbidden
    /// bit overlapping a required bit is a caller error, not a failure:
    /// it always yields an empty query.
    pub fn update(&mut self, world: &World) {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("query_update").entered();

        let mut matches = Vec::new();
        if !self.exact && !self.required.disjoint_from(self.forbidden) {
            self.results = Some(matches);
            return;
        }

        for chunk in world.chunks_in_order() {
            let def = chunk.definition();
            if !self.chunk_matches(def.components, def.arrays, def.tags) {
                continue;
            }
            for &entity_id in chunk.entities() {
                if self.include_disabled || world.effective_enabled_unchecked(entity_id) {
                    matches.push(entity_id);
                }
            }
        }
        self.results = Some(matches);
    }

    /// The materialized result of the last `update()` call. Reading
    /// before the first `update()` is an `OrderViolation`.
    pub fn entities(&self) -> Result<&[EntityId]> {
        self.results.as_deref().ok_or(EcsError::OrderViolation)
    }
}

/// Thin typed adapter over `Query`: pairs each matching row with interior
/// pointers to `N` requested component columns (`N >= 4` per the core
/// contract). Pointers are valid only until the next structural mutation
/// of the owning chunk.
pub struct TypedQuery<const N: usize> {
    inner: Query,
    type_indices: [TypeIndex; N],
}

impl<const N: usize> TypedQuery<N> {
    pub fn new(type_indices: [TypeIndex; N]) -> Self {
        let mut required = BitMask::EMPTY;
        for &index in &type_indices {
            required.set(index);
        }
        Self {
            inner: Query::new(required),
            type_indices,
        }
    }

    pub fn with_forbidden(mut self, forbidden: BitMask) -> Self {
        self.inner = self.inner.with_forbidden(forbidden);
        self
    }

    pub fn include_disabled(mut self, include: bool) -> Self {
        self.inner = self.inner.include_disabled(include);
        self
    }

    pub fn update(&mut self, world: &World) {
        self.inner.update(world);
    }

    /// `(entity id, [component bytes; N])` for every matched row. Reading
    /// before `update()` is an `OrderViolation`.
    pub fn rows<'w>(&self, world: &'w World) -> Result<Vec<(EntityId, [&'w [u8]; N])>> {
        let entities = self.inner.entities()?;
        let mut out = Vec::with_capacity(entities.len());
        for &id in entities {
            let mut row = [&[][..]; N];
            for (slot, &type_index) in row.iter_mut().zip(self.type_indices.iter()) {
                *slot = world.component_bytes(id, type_index)?;
            }
            out.push((id, row));
        }
        Ok(out)
    }
}
