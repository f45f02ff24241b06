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

//! `World`: owner of the schema, the entity directory, the chunk index,
//! and the four change-notifier vectors. Every public operation enters
//! through here.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::chunk::Chunk;
use crate::component::{type_id_of, ArrayElement, Component, Tag};
use crate::definition::{ArchetypeKey, Definition};
use crate::entity::{ArrayStorage, EntityId, EntitySlot, EntityState};
use crate::error::{EcsError, Result};
use crate::hierarchy;
use crate::notify::{DataChangeKind, DataChangedNotifier, EntityLifecycleNotifier, ParentChangedNotifier};
use crate::schema::{Schema, TypeIndex, TypeKind};

/// Collaborator seam described in §6: an external "type bank" registers
/// its types into a `Schema` once, typically right after `World::new()`.
pub trait TypeBank {
    fn register(&self, schema: &mut Schema) -> Result<()>;
}

/// Archetype-chunk ECS core. Single-threaded, cooperative: no internal
/// locking, no `Arc`/`Mutex` anywhere.
pub struct World {
    schema: Schema,
    slots: Vec<EntitySlot>,
    free_list: VecDeque<EntityId>,
    chunks: FxHashMap<ArchetypeKey, Vec<Chunk>>,
    /// Creation order of `(key, chunk_slot)` pairs, walked by `Query::update`
    /// so iteration order is insertion order rather than whatever a
    /// hashmap happens to yield.
    chunk_order: Vec<(ArchetypeKey, usize)>,
    disposed: bool,

    pub on_entity_created: EntityLifecycleNotifier,
    pub on_entity_destroyed: EntityLifecycleNotifier,
    pub on_parent_changed: ParentChangedNotifier,
    pub on_data_changed: DataChangedNotifier,
}

impl World {
    pub fn new() -> Self {
        let mut world = Self {
            schema: Schema::new(),
            slots: Vec::new(),
            free_list: VecDeque::new(),
            chunks: FxHashMap::default(),
            chunk_order: Vec::new(),
            disposed: false,
            on_entity_created: EntityLifecycleNotifier::new(),
            on_entity_destroyed: EntityLifecycleNotifier::new(),
            on_parent_changed: ParentChangedNotifier::new(),
            on_data_changed: DataChangedNotifier::new(),
        };
        world.get_or_create_chunk(Definition::EMPTY);
        world
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Run an external type bank's registration once. See `TypeBank`.
    pub fn register_types(&mut self, bank: &dyn TypeBank) -> Result<()> {
        bank.register(&mut self.schema)
    }

    pub fn register_component<T: Component>(&mut self) -> Result<TypeIndex> {
        self.schema.register_type::<T>(TypeKind::Component, std::mem::size_of::<T>())
    }

    pub fn register_array_element<T: ArrayElement>(&mut self) -> Result<TypeIndex> {
        self.schema.register_type::<T>(TypeKind::ArrayElement, std::mem::size_of::<T>())
    }

    pub fn register_tag<T: Tag>(&mut self) -> Result<TypeIndex> {
        if std::mem::size_of::<T>() != 0 {
            return Err(EcsError::Invalid(format!(
                "tag type {} is not zero-sized; tag bits carry no column, so its data would be silently dropped",
                std::any::type_name::<T>()
            )));
        }
        self.schema.register_type::<T>(TypeKind::Tag, 0)
    }

    pub fn component_index<T: Component>(&self) -> Option<TypeIndex> {
        self.schema.index_of_type(TypeKind::Component, type_id_of::<T>())
    }

    pub fn array_element_index<T: ArrayElement>(&self) -> Option<TypeIndex> {
        self.schema.index_of_type(TypeKind::ArrayElement, type_id_of::<T>())
    }

    pub fn tag_index<T: Tag>(&self) -> Option<TypeIndex> {
        self.schema.index_of_type(TypeKind::Tag, type_id_of::<T>())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.disposed {
            Err(EcsError::Disposed)
        } else {
            Ok(())
        }
    }

    fn ensure_live(&self, id: EntityId) -> Result<()> {
        match self.slots.get(id.slot_index()) {
            Some(slot) if slot.is_live() => Ok(()),
            _ => Err(EcsError::Missing),
        }
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.ensure_live(id).is_ok()
    }

    // ---- chunk index -----------------------------------------------

    fn get_or_create_chunk(&mut self, definition: Definition) -> (ArchetypeKey, usize) {
        let key = definition.key();
        let bucket = self.chunks.entry(key).or_default();
        if let Some(idx) = bucket.iter().position(|c| *c.definition() == definition) {
            return (key, idx);
        }
        let mut chunk = Chunk::new(definition);
        for type_index in definition.components.ones() {
            if let Some(descriptor) = self.schema.descriptor(TypeKind::Component, type_index) {
                chunk.allocate_column(type_index, descriptor.size, descriptor.drop_fn);
            }
        }
        bucket.push(chunk);
        let chunk_slot = bucket.len() - 1;
        self.chunk_order.push((key, chunk_slot));
        (key, chunk_slot)
    }

    /// Chunks in creation order, for `Query::update`. The order is stable
    /// but carries no semantic meaning beyond that.
    pub(crate) fn chunks_in_order(&self) -> impl Iterator<Item = &Chunk> {
        self.chunk_order.iter().map(move |&(key, slot)| &self.chunks[&key][slot])
    }

    pub(crate) fn effective_enabled_unchecked(&self, id: EntityId) -> bool {
        hierarchy::is_effective_enabled(self.slots[id.slot_index()].state)
    }

    fn chunk_definition_of(&self, id: EntityId) -> Definition {
        let idx = id.slot_index();
        let key = self.slots[idx].archetype_key.expect("live entity always has an archetype key");
        let chunk_slot = self.slots[idx].chunk_slot;
        *self.chunks[&key][chunk_slot].definition()
    }

    /// Move a live entity to `new_definition`, copying overlapping
    /// component columns and fixing up the entity swapped into the
    /// vacated row. No-op if `new_definition` is already the entity's
    /// current definition.
    fn move_entity_to_definition(&mut self, id: EntityId, new_definition: Definition) {
        let idx = id.slot_index();
        let old_key = self.slots[idx].archetype_key.expect("live entity always has an archetype key");
        let old_chunk_slot = self.slots[idx].chunk_slot;
        let old_row = self.slots[idx].row;

        let (new_key, new_chunk_slot) = self.get_or_create_chunk(new_definition);
        if new_key == old_key && new_chunk_slot == old_chunk_slot {
            return;
        }

        // SAFETY: `old` and `new` name distinct `(key, chunk_slot)` pairs
        // (checked above), so the two raw pointers below never alias —
        // either they come from different hashmap buckets entirely, or
        // from different indices within the same bucket's Vec<Chunk>.
        // Neither pointer is held across any insertion into `self.chunks`.
        let old_ptr: *mut Chunk = &mut self.chunks.get_mut(&old_key).unwrap()[old_chunk_slot];
        let new_ptr: *mut Chunk = &mut self.chunks.get_mut(&new_key).unwrap()[new_chunk_slot];

        let new_row = unsafe {
            let old_chunk = &mut *old_ptr;
            let new_chunk = &mut *new_ptr;
            // Columns present in both chunks have their bytes bit-copied by
            // `move_row` below, transferring ownership to `new_chunk`; the
            // source row's removal must not also drop them there.
            let moved_components = old_chunk.definition().components.intersection(new_chunk.definition().components);
            let new_row = old_chunk.move_row(old_row, new_chunk, id);
            let swapped = old_chunk.remove_row_after_move(old_row, moved_components);
            if let Some(swapped_id) = swapped {
                self.slots[swapped_id.slot_index()].row = old_row;
            }
            new_row
        };

        self.slots[idx].archetype_key = Some(new_key);
        self.slots[idx].chunk_slot = new_chunk_slot;
        self.slots[idx].row = new_row;
    }

    fn allocate_id(&mut self) -> EntityId {
        if let Some(id) = self.free_list.pop_front() {
            id
        } else {
            let raw = self.slots.len() as u32 + 1;
            self.slots.push(EntitySlot::free());
            EntityId::new(raw).expect("slot count never overflows u32 in practice")
        }
    }

    fn place_entity(&mut self, id: EntityId, definition: Definition) {
        let (key, chunk_slot) = self.get_or_create_chunk(definition);
        let row = {
            let chunk = &mut self.chunks.get_mut(&key).unwrap()[chunk_slot];
            chunk.add_row(id)
        };
        self.slots[id.slot_index()].reset_for(id, key, chunk_slot, row);
    }

    // ---- entity lifecycle --------------------------------------------

    pub fn create_entity(&mut self) -> Result<EntityId> {
        self.create_entity_with(Definition::EMPTY)
    }

    pub fn create_entity_with(&mut self, definition: Definition) -> Result<EntityId> {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("create_entity").entered();

        self.ensure_open()?;
        let id = self.allocate_id();
        self.place_entity(id, definition);
        self.on_entity_created.fire(id);
        Ok(id)
    }

    /// Establish a slot at exactly `id` (for replay/deserialization),
    /// padding the free list with any intermediate ids that had to be
    /// allocated to reach it.
    pub fn initialize_entity(&mut self, id: EntityId, definition: Definition) -> Result<()> {
        self.ensure_open()?;
        let idx = id.slot_index();
        if let Some(slot) = self.slots.get(idx) {
            if slot.is_live() {
                return Err(EcsError::AlreadyPresent);
            }
        }
        let old_len = self.slots.len();
        if idx >= old_len {
            self.slots.resize_with(idx + 1, EntitySlot::free);
            for i in old_len..idx {
                self.free_list.push_back(EntityId::new((i + 1) as u32).unwrap());
            }
        } else {
            // `id` may already be sitting in the free list (a previously
            // destroyed entity being replayed back into existence); drop it
            // so `allocate_id` can never hand out this id a second time
            // while it's live.
            self.free_list.retain(|&free_id| free_id != id);
        }
        self.place_entity(id, definition);
        self.on_entity_created.fire(id);
        Ok(())
    }

    pub fn destroy_entity(&mut self, id: EntityId, cascade: bool) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("destroy_entity").entered();

        self.ensure_open()?;
        self.ensure_live(id)?;

        let children: Vec<EntityId> = self.slots[id.slot_index()].children.iter().copied().collect();
        if cascade {
            for child in children {
                // A child may already be gone if it appeared twice in a
                // malformed children list; destroy_entity is idempotent
                // from the caller's point of view either way.
                let _ = self.destroy_entity(child, true);
            }
        } else {
            for child in children {
                self.slots[child.slot_index()].parent = None;
                hierarchy::refresh_subtree(&mut self.slots, child);
                self.on_parent_changed.fire(child, Some(id), None);
            }
        }

        if let Some(parent) = self.slots[id.slot_index()].parent {
            self.slots[parent.slot_index()].children.retain(|c| *c != id);
        }

        self.remove_row_for(id);

        let idx = id.slot_index();
        self.slots[idx].id = None;
        self.slots[idx].archetype_key = None;
        self.slots[idx].state = EntityState::Destroyed;
        self.slots[idx].parent = None;
        self.slots[idx].children.clear();
        self.slots[idx].references.clear();
        self.slots[idx].arrays.clear();
        self.free_list.push_back(id);

        self.on_entity_destroyed.fire(id);
        Ok(())
    }

    fn remove_row_for(&mut self, id: EntityId) {
        let idx = id.slot_index();
        let key = self.slots[idx].archetype_key.expect("live entity always has an archetype key");
        let chunk_slot = self.slots[idx].chunk_slot;
        let row = self.slots[idx].row;
        let bucket = self.chunks.get_mut(&key).unwrap();
        if let Some(swapped_id) = bucket[chunk_slot].remove_row(row) {
            self.slots[swapped_id.slot_index()].row = row;
        }
    }

    // ---- components ----------------------------------------------------

    pub fn add_component<T: Component>(&mut self, id: EntityId, value: T) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("add_component").entered();

        self.ensure_open()?;
        self.ensure_live(id)?;
        let type_index = self.register_component::<T>()?;
        self.add_component_structural(id, type_index)?;

        let bytes = self.component_bytes_mut(id, type_index)?;
        unsafe {
            std::ptr::write(bytes.as_mut_ptr() as *mut T, value);
        }
        self.on_data_changed.fire(id, type_index, TypeKind::Component, DataChangeKind::Added);
        Ok(())
    }

    /// Bytes-only flavor for callers working from opaque type descriptors.
    /// The destination bytes are zeroed; follow up with
    /// `set_component_bytes` to initialize them.
    pub fn add_component_raw(&mut self, id: EntityId, type_index: TypeIndex) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        self.add_component_structural(id, type_index)?;
        self.on_data_changed.fire(id, type_index, TypeKind::Component, DataChangeKind::Added);
        Ok(())
    }

    fn add_component_structural(&mut self, id: EntityId, type_index: TypeIndex) -> Result<()> {
        let old_def = self.chunk_definition_of(id);
        if old_def.components.contains(type_index) {
            return Err(EcsError::AlreadyPresent);
        }
        self.move_entity_to_definition(id, old_def.with_component(type_index));
        Ok(())
    }

    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("remove_component").entered();

        let type_index = self
            .schema
            .index_of_type(TypeKind::Component, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        self.remove_component_raw(id, type_index)
    }

    pub fn remove_component_raw(&mut self, id: EntityId, type_index: TypeIndex) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        let old_def = self.chunk_definition_of(id);
        if !old_def.components.contains(type_index) {
            return Err(EcsError::Missing);
        }
        self.move_entity_to_definition(id, old_def.without_component(type_index));
        self.on_data_changed.fire(id, type_index, TypeKind::Component, DataChangeKind::Removed);
        Ok(())
    }

    pub fn get_component<T: Component>(&self, id: EntityId) -> Result<&T> {
        let type_index = self
            .schema
            .index_of_type(TypeKind::Component, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        let bytes = self.component_bytes(id, type_index)?;
        Ok(unsafe { &*(bytes.as_ptr() as *const T) })
    }

    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Result<&mut T> {
        let type_index = self
            .schema
            .index_of_type(TypeKind::Component, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        let bytes = self.component_bytes_mut(id, type_index)?;
        Ok(unsafe { &mut *(bytes.as_mut_ptr() as *mut T) })
    }

    pub fn component_bytes(&self, id: EntityId, type_index: TypeIndex) -> Result<&[u8]> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        let key = self.slots[idx].archetype_key.unwrap();
        let chunk_slot = self.slots[idx].chunk_slot;
        let row = self.slots[idx].row;
        self.chunks[&key][chunk_slot].component_bytes_at(row, type_index)
    }

    pub fn component_bytes_mut(&mut self, id: EntityId, type_index: TypeIndex) -> Result<&mut [u8]> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        let key = self.slots[idx].archetype_key.unwrap();
        let chunk_slot = self.slots[idx].chunk_slot;
        let row = self.slots[idx].row;
        self.chunks.get_mut(&key).unwrap()[chunk_slot].component_bytes_at_mut(row, type_index)
    }

    /// Overwrite a component's bytes in place. Not a structural change:
    /// no archetype move, no callback.
    pub fn set_component_bytes(&mut self, id: EntityId, type_index: TypeIndex, bytes: &[u8]) -> Result<()> {
        let dst = self.component_bytes_mut(id, type_index)?;
        if dst.len() != bytes.len() {
            return Err(EcsError::Invalid(format!(
                "component size mismatch: expected {} bytes, got {}",
                dst.len(),
                bytes.len()
            )));
        }
        dst.copy_from_slice(bytes);
        Ok(())
    }

    pub fn contains_component(&self, id: EntityId, type_index: TypeIndex) -> Result<bool> {
        self.ensure_live(id)?;
        Ok(self.chunk_definition_of(id).components.contains(type_index))
    }

    // ---- arrays ----------------------------------------------------

    fn ensure_array_capacity(&mut self, idx: usize, element_index: TypeIndex) {
        if self.slots[idx].arrays.len() <= element_index {
            self.slots[idx].arrays.resize_with(element_index + 1, || None);
        }
    }

    pub fn create_array<T: ArrayElement>(&mut self, id: EntityId, length: usize) -> Result<()> {
        let element_index = self.register_array_element::<T>()?;
        self.create_array_raw(id, element_index, std::mem::size_of::<T>(), length)
    }

    pub fn create_array_raw(
        &mut self,
        id: EntityId,
        element_index: TypeIndex,
        element_size: usize,
        length: usize,
    ) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        let idx = id.slot_index();
        self.ensure_array_capacity(idx, element_index);
        if self.slots[idx].arrays[element_index].is_some() {
            return Err(EcsError::AlreadyPresent);
        }
        self.slots[idx].arrays[element_index] = Some(ArrayStorage::new(element_index, element_size, length));

        let old_def = self.chunk_definition_of(id);
        self.move_entity_to_definition(id, old_def.with_array(element_index));
        self.on_data_changed.fire(id, element_index, TypeKind::ArrayElement, DataChangeKind::Added);
        Ok(())
    }

    pub fn get_array<T: ArrayElement>(&self, id: EntityId) -> Result<&[T]> {
        let element_index = self
            .schema
            .index_of_type(TypeKind::ArrayElement, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        let storage = self.array_storage(id, element_index)?;
        let ptr = storage.bytes.as_ptr() as *const T;
        Ok(unsafe { std::slice::from_raw_parts(ptr, storage.len()) })
    }

    pub fn get_array_mut<T: ArrayElement>(&mut self, id: EntityId) -> Result<&mut [T]> {
        let element_index = self
            .schema
            .index_of_type(TypeKind::ArrayElement, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        let storage = self.array_storage_mut(id, element_index)?;
        let len = storage.len();
        let ptr = storage.bytes.as_mut_ptr() as *mut T;
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
    }

    fn array_storage(&self, id: EntityId, element_index: TypeIndex) -> Result<&ArrayStorage> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        self.slots[idx]
            .arrays
            .get(element_index)
            .and_then(|a| a.as_ref())
            .ok_or(EcsError::Missing)
    }

    fn array_storage_mut(&mut self, id: EntityId, element_index: TypeIndex) -> Result<&mut ArrayStorage> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        self.slots[idx]
            .arrays
            .get_mut(element_index)
            .and_then(|a| a.as_mut())
            .ok_or(EcsError::Missing)
    }

    pub fn resize_array(&mut self, id: EntityId, element_index: TypeIndex, new_length: usize) -> Result<()> {
        self.array_storage_mut(id, element_index)?.resize(new_length);
        Ok(())
    }

    pub fn destroy_array(&mut self, id: EntityId, element_index: TypeIndex) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        let idx = id.slot_index();
        let existed = self.slots[idx]
            .arrays
            .get_mut(element_index)
            .and_then(|a| a.take())
            .is_some();
        if !existed {
            return Err(EcsError::Missing);
        }
        let old_def = self.chunk_definition_of(id);
        self.move_entity_to_definition(id, old_def.without_array(element_index));
        self.on_data_changed.fire(id, element_index, TypeKind::ArrayElement, DataChangeKind::Removed);
        Ok(())
    }

    pub fn contains_array(&self, id: EntityId, element_index: TypeIndex) -> Result<bool> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        Ok(self.slots[idx].arrays.get(element_index).map(|a| a.is_some()).unwrap_or(false))
    }

    // ---- tags ----------------------------------------------------

    pub fn add_tag<T: Tag>(&mut self, id: EntityId) -> Result<()> {
        let tag_index = self.register_tag::<T>()?;
        self.add_tag_raw(id, tag_index)
    }

    pub fn add_tag_raw(&mut self, id: EntityId, tag_index: TypeIndex) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        let old_def = self.chunk_definition_of(id);
        if old_def.tags.contains(tag_index) {
            return Err(EcsError::AlreadyPresent);
        }
        self.move_entity_to_definition(id, old_def.with_tag(tag_index));
        self.on_data_changed.fire(id, tag_index, TypeKind::Tag, DataChangeKind::Added);
        Ok(())
    }

    pub fn remove_tag<T: Tag>(&mut self, id: EntityId) -> Result<()> {
        let tag_index = self
            .schema
            .index_of_type(TypeKind::Tag, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        self.remove_tag_raw(id, tag_index)
    }

    pub fn remove_tag_raw(&mut self, id: EntityId, tag_index: TypeIndex) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        let old_def = self.chunk_definition_of(id);
        if !old_def.tags.contains(tag_index) {
            return Err(EcsError::Missing);
        }
        self.move_entity_to_definition(id, old_def.without_tag(tag_index));
        self.on_data_changed.fire(id, tag_index, TypeKind::Tag, DataChangeKind::Removed);
        Ok(())
    }

    pub fn contains_tag<T: Tag>(&self, id: EntityId) -> Result<bool> {
        let tag_index = self
            .schema
            .index_of_type(TypeKind::Tag, type_id_of::<T>())
            .ok_or(EcsError::Missing)?;
        self.contains_tag_raw(id, tag_index)
    }

    pub fn contains_tag_raw(&self, id: EntityId, tag_index: TypeIndex) -> Result<bool> {
        self.ensure_live(id)?;
        Ok(self.chunk_definition_of(id).tags.contains(tag_index))
    }

    // ---- hierarchy ----------------------------------------------------

    pub fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        if let Some(p) = parent {
            self.ensure_live(p)?;
            if p == id {
                return Err(EcsError::Invalid("an entity cannot be its own parent".to_string()));
            }
            if hierarchy::creates_cycle(&self.slots, id, p) {
                return Err(EcsError::Invalid("SetParent would create a cycle".to_string()));
            }
        }

        let idx = id.slot_index();
        let old_parent = self.slots[idx].parent;

        if let Some(old) = old_parent {
            self.slots[old.slot_index()].children.retain(|c| *c != id);
        }
        self.slots[idx].parent = parent;
        if let Some(p) = parent {
            self.slots[p.slot_index()].children.push(id);
        }

        hierarchy::refresh_subtree(&mut self.slots, id);
        self.on_parent_changed.fire(id, old_parent, parent);
        Ok(())
    }

    pub fn get_children(&self, id: EntityId) -> Result<&[EntityId]> {
        self.ensure_live(id)?;
        Ok(&self.slots[id.slot_index()].children)
    }

    pub fn get_parent(&self, id: EntityId) -> Result<Option<EntityId>> {
        self.ensure_live(id)?;
        Ok(self.slots[id.slot_index()].parent)
    }

    // ---- references ----------------------------------------------------

    pub fn add_reference(&mut self, id: EntityId, target: EntityId) -> Result<usize> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        let idx = id.slot_index();
        self.slots[idx].references.push(Some(target));
        Ok(self.slots[idx].references.len())
    }

    fn reference_slot_index(slot: &EntitySlot, handle: usize) -> Result<usize> {
        if handle == 0 || handle > slot.references.len() {
            return Err(EcsError::Invalid(format!("reference handle {handle} out of range")));
        }
        Ok(handle - 1)
    }

    pub fn get_reference(&self, id: EntityId, handle: usize) -> Result<Option<EntityId>> {
        self.ensure_live(id)?;
        let slot = &self.slots[id.slot_index()];
        let i = Self::reference_slot_index(slot, handle)?;
        Ok(slot.references[i])
    }

    pub fn set_reference(&mut self, id: EntityId, handle: usize, target: EntityId) -> Result<()> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        let i = Self::reference_slot_index(&self.slots[idx], handle)?;
        self.slots[idx].references[i] = Some(target);
        Ok(())
    }

    pub fn remove_reference(&mut self, id: EntityId, handle: usize) -> Result<()> {
        self.ensure_live(id)?;
        let idx = id.slot_index();
        let i = Self::reference_slot_index(&self.slots[idx], handle)?;
        self.slots[idx].references[i] = None;
        Ok(())
    }

    pub fn contains_reference(&self, id: EntityId, handle: usize) -> Result<bool> {
        self.ensure_live(id)?;
        let slot = &self.slots[id.slot_index()];
        match Self::reference_slot_index(slot, handle) {
            Ok(i) => Ok(slot.references[i].is_some()),
            Err(_) => Ok(false),
        }
    }

    // ---- enable / disable ----------------------------------------------------

    pub fn is_enabled(&self, id: EntityId) -> Result<bool> {
        self.ensure_live(id)?;
        Ok(hierarchy::is_effective_enabled(self.slots[id.slot_index()].state))
    }

    pub fn entity_state(&self, id: EntityId) -> Result<EntityState> {
        self.ensure_live(id)?;
        Ok(self.slots[id.slot_index()].state)
    }

    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.ensure_open()?;
        self.ensure_live(id)?;
        self.slots[id.slot_index()].wants_enabled = enabled;
        hierarchy::refresh_subtree(&mut self.slots, id);
        Ok(())
    }

    // ---- bulk ----------------------------------------------------

    /// Destroys every entity in one pass and resets the chunk index back
    /// to just the default empty archetype. Does not fire per-entity
    /// `entity-destroyed` callbacks — those exist to let observers track
    /// individual removals, which has no meaning for a full wipe.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.slots.clear();
        self.free_list.clear();
        self.chunks.clear();
        self.chunk_order.clear();
        self.get_or_create_chunk(Definition::EMPTY);
        Ok(())
    }

    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Err(EcsError::Disposed);
        }
        self.slots.clear();
        self.free_list.clear();
        self.chunks.clear();
        self.chunk_order.clear();
        self.disposed = true;
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn create_destroy_round_trip() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        assert!(world.contains_entity(e));
        assert!(world.is_enabled(e).unwrap());

        world.destroy_entity(e, false).unwrap();
        assert!(!world.contains_entity(e));
        assert!(matches!(world.is_enabled(e), Err(EcsError::Missing)));
    }

    #[test]
    fn add_get_remove_component() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: 1.0, y: 2.0 }).unwrap();

        assert_eq!(*world.get_component::<Position>(e).unwrap(), Position { x: 1.0, y: 2.0 });

        world.remove_component::<Position>(e).unwrap();
        assert!(world.get_component::<Position>(e).is_err());
    }

    #[test]
    fn add_component_twice_is_already_present() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
        let err = world.add_component(e, Position { x: 1.0, y: 1.0 });
        assert!(matches!(err, Err(EcsError::AlreadyPresent)));
    }

    #[test]
    fn id_reuse_is_fifo() {
        let mut world = World::new();
        let e1 = world.create_entity().unwrap();
        let e2 = world.create_entity().unwrap();
        world.destroy_entity(e1, false).unwrap();
        world.destroy_entity(e2, false).unwrap();

        let e3 = world.create_entity().unwrap();
        let e4 = world.create_entity().unwrap();
        assert_eq!(e3, e1);
        assert_eq!(e4, e2);
    }

    #[test]
    fn cascade_destroy_removes_descendants() {
        let mut world = World::new();
        let parent = world.create_entity().unwrap();
        let child = world.create_entity().unwrap();
        world.set_parent(child, Some(parent)).unwrap();

        world.destroy_entity(parent, true).unwrap();
        assert!(!world.contains_entity(child));
    }

    #[test]
    fn non_cascade_destroy_orphans_children() {
        let mut world = World::new();
        let parent = world.create_entity().unwrap();
        let child = world.create_entity().unwrap();
        world.set_parent(child, Some(parent)).unwrap();

        world.destroy_entity(parent, false).unwrap();
        assert!(world.contains_entity(child));
        assert_eq!(world.get_parent(child).unwrap(), None);
    }

    #[test]
    fn hierarchy_enable_propagation_scenario() {
        let mut world = World::new();
        let parent = world.create_entity().unwrap();
        let child = world.create_entity().unwrap();
        world.set_parent(child, Some(parent)).unwrap();

        world.set_enabled(parent, false).unwrap();
        assert!(!world.is_enabled(child).unwrap());

        world.set_enabled(parent, true).unwrap();
        assert!(world.is_enabled(child).unwrap());
    }

    #[test]
    fn self_parent_is_invalid() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        assert!(matches!(world.set_parent(e, Some(e)), Err(EcsError::Invalid(_))));
    }

    #[test]
    fn cyclic_parent_is_rejected() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();
        world.set_parent(b, Some(a)).unwrap();
        assert!(matches!(world.set_parent(a, Some(b)), Err(EcsError::Invalid(_))));
    }

    #[test]
    fn reference_handles_are_stable_across_removal() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        let other = world.create_entity().unwrap();
        let third = world.create_entity().unwrap();

        let h1 = world.add_reference(e, other).unwrap();
        let h2 = world.add_reference(e, third).unwrap();
        world.remove_reference(e, h1).unwrap();

        assert_eq!(world.get_reference(e, h1).unwrap(), None);
        assert_eq!(world.get_reference(e, h2).unwrap(), Some(third));
    }

    #[test]
    fn array_create_resize_destroy() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.create_array::<u32>(e, 3).unwrap();
        {
            let arr = world.get_array_mut::<u32>(e).unwrap();
            arr.copy_from_slice(&[10, 20, 30]);
        }
        let element_index = world.schema().index_of_type(TypeKind::ArrayElement, type_id_of::<u32>()).unwrap();
        world.resize_array(e, element_index, 5).unwrap();
        assert_eq!(world.get_array::<u32>(e).unwrap(), &[10, 20, 30, 0, 0]);

        world.destroy_array(e, element_index).unwrap();
        assert!(!world.contains_array(e, element_index).unwrap());
    }

    #[test]
    fn registering_a_non_zero_sized_type_as_a_tag_is_invalid() {
        let mut world = World::new();
        assert!(matches!(world.register_tag::<Position>(), Err(EcsError::Invalid(_))));
    }

    #[test]
    fn data_changed_fires_added_then_removed_in_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut world = World::new();
        let e = world.create_entity().unwrap();
        let log: Rc<RefCell<Vec<DataChangeKind>>> = Rc::new(RefCell::new(Vec::new()));
        let log2 = log.clone();
        world.on_data_changed.subscribe(0, move |_id, _type_index, _kind, change, _userdata| {
            log2.borrow_mut().push(change);
        });

        world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
        world.remove_component::<Position>(e).unwrap();

        assert_eq!(*log.borrow(), vec![DataChangeKind::Added, DataChangeKind::Removed]);
    }

    #[test]
    fn clear_resets_to_default_chunk_only() {
        let mut world = World::new();
        for _ in 0..10 {
            world.create_entity().unwrap();
        }
        world.clear().unwrap();
        assert_eq!(world.slots.len(), 0);
        let e = world.create_entity().unwrap();
        assert_eq!(e.get(), 1);
    }

    #[test]
    fn dispose_is_not_repeatable() {
        let mut world = World::new();
        world.dispose().unwrap();
        assert!(matches!(world.dispose(), Err(EcsError::Disposed)));
    }
}
