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

//! Entity identifiers and the per-entity directory row.

use std::num::NonZeroU32;

use smallvec::SmallVec;

use crate::definition::ArchetypeKey;
use crate::schema::TypeIndex;

/// A live or once-live entity. Id 0 is reserved as "none" and is never
/// handed out by `World`. Ids are dense and reused through a FIFO free
/// list after destruction; there is no generation counter, matching the
/// source model's "non-zero unsigned integer" identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(NonZeroU32);

impl EntityId {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(EntityId)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Index into the slot table (`id - 1`).
    pub(crate) fn slot_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Effective lifecycle state of an entity, per the §4.E state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Enabled,
    Disabled,
    ImplicitlyDisabled,
    Destroyed,
}

/// A handful of inline children/array slots before spilling to the heap;
/// most entities have few of either.
pub type SmallEntityVec = SmallVec<[EntityId; 4]>;

/// A dynamically-sized per-entity array allocation for one registered
/// array-element type.
pub struct ArrayStorage {
    pub element_index: TypeIndex,
    pub element_size: usize,
    pub bytes: Vec<u8>,
}

impl ArrayStorage {
    pub fn new(element_index: TypeIndex, element_size: usize, length: usize) -> Self {
        Self {
            element_index,
            element_size,
            bytes: vec![0u8; element_size * length],
        }
    }

    pub fn len(&self) -> usize {
        if self.element_size == 0 {
            0
        } else {
            self.bytes.len() / self.element_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resize(&mut self, new_length: usize) {
        self.bytes.resize(self.element_size * new_length, 0);
    }
}

/// One row of the entity directory, indexed by `id.slot_index()`.
pub struct EntitySlot {
    /// The entity occupying this slot, or `None` if the slot is free.
    pub id: Option<EntityId>,
    pub archetype_key: Option<ArchetypeKey>,
    /// Index into the chunk bucket for `archetype_key` (almost always 0;
    /// only non-zero while a key collision between distinct `Definition`s
    /// is live).
    pub chunk_slot: usize,
    pub row: usize,
    pub state: EntityState,
    /// The user's own enable/disable intent, independent of any ancestor's
    /// state — restored when the disabling ancestor goes away or the
    /// entity is reparented out from under it.
    pub wants_enabled: bool,
    pub parent: Option<EntityId>,
    pub children: SmallEntityVec,
    /// 1-based reference handles; index 0 of this vec is handle 1. Never
    /// compacted — removing a reference clears its slot to `None` but
    /// keeps the vector's length so surviving handles stay valid.
    pub references: Vec<Option<EntityId>>,
    pub arrays: Vec<Option<ArrayStorage>>,
}

impl EntitySlot {
    pub fn free() -> Self {
        Self {
            id: None,
            archetype_key: None,
            chunk_slot: 0,
            row: 0,
            state: EntityState::Destroyed,
            wants_enabled: true,
            parent: None,
            children: SmallEntityVec::new(),
            references: Vec::new(),
            arrays: Vec::new(),
        }
    }

    pub fn reset_for(&mut self, id: EntityId, archetype_key: ArchetypeKey, chunk_slot: usize, row: usize) {
        self.id = Some(id);
        self.archetype_key = Some(archetype_key);
        self.chunk_slot = chunk_slot;
        self.row = row;
        self.state = EntityState::Enabled;
        self.wants_enabled = true;
        self.parent = None;
        self.children.clear();
        self.references.clear();
        self.arrays.clear();
    }

    pub fn is_live(&self) -> bool {
        self.id.is_some()
    }
}
