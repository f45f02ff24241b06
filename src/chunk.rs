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

//! Chunk storage: one parallel column per set component bit, plus the
//! dense entity column giving row order.

use crate::bitmask::{BitMask, CAP};
use crate::definition::Definition;
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::schema::TypeIndex;

/// Type-erased, fixed-stride column of component bytes.
pub struct ComponentColumn {
    data: Vec<u8>,
    stride: usize,
    drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentColumn {
    pub fn new(stride: usize, drop_fn: Option<unsafe fn(*mut u8)>) -> Self {
        Self {
            data: Vec::new(),
            stride,
            drop_fn,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a zeroed element, returning its row index.
    fn push_zeroed(&mut self, row_count_hint: usize) -> usize {
        if self.stride == 0 {
            return row_count_hint;
        }
        let row = self.data.len() / self.stride;
        self.data.resize(self.data.len() + self.stride, 0);
        row
    }

    /// Swap-remove the element at `row`, moving the last element (if any)
    /// into its place. Runs drop on the removed element first, unless
    /// `skip_drop` is set — used when the row's bytes were already bit-copied
    /// out to another chunk by `move_row`, which transfers ownership without
    /// transferring drop responsibility.
    fn swap_remove(&mut self, row: usize, len: usize, skip_drop: bool) {
        if self.stride == 0 {
            return;
        }
        let last = len - 1;
        let row_off = row * self.stride;
        unsafe {
            if !skip_drop {
                if let Some(drop_fn) = self.drop_fn {
                    drop_fn(self.data.as_mut_ptr().add(row_off));
                }
            }
            if row != last {
                let last_off = last * self.stride;
                let (head, tail) = self.data.split_at_mut(last_off);
                head[row_off..row_off + self.stride].copy_from_slice(&tail[..self.stride]);
            }
        }
        self.data.truncate(last * self.stride);
    }

    /// Raw pointer to the byte range of row `row`. Caller must not read
    /// past `stride` bytes from it.
    pub fn row_ptr(&self, row: usize) -> *const u8 {
        if self.stride == 0 {
            return self.data.as_ptr();
        }
        unsafe { self.data.as_ptr().add(row * self.stride) }
    }

    pub fn row_ptr_mut(&mut self, row: usize) -> *mut u8 {
        if self.stride == 0 {
            return self.data.as_mut_ptr();
        }
        unsafe { self.data.as_mut_ptr().add(row * self.stride) }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn copy_row_from(&mut self, src: &ComponentColumn, src_row: usize, dst_row: usize) {
        debug_assert_eq!(self.stride, src.stride);
        if self.stride == 0 {
            return;
        }
        unsafe {
            let src_ptr = src.row_ptr(src_row);
            let dst_ptr = self.row_ptr_mut(dst_row);
            std::ptr::copy_nonoverlapping(src_ptr, dst_ptr, self.stride);
        }
    }
}

impl Drop for ComponentColumn {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.drop_fn {
            if self.stride == 0 {
                return;
            }
            let count = self.len();
            for i in 0..count {
                unsafe {
                    drop_fn(self.data.as_mut_ptr().add(i * self.stride));
                }
            }
        }
        self.data.clear();
    }
}

/// A pointer into a component column's row bytes, stamped with the owning
/// chunk's mutation tick at the moment it was taken. Handed out by
/// `Chunk::checked_component_span[_mut]` for callers that need to hold a
/// row pointer across other calls instead of re-borrowing per access;
/// `get`/`get_mut` panic in debug builds if the chunk has structurally
/// mutated (a row added, removed, or moved) since the span was taken,
/// catching a dangling-pointer read that the borrow checker can't see
/// through a raw pointer decoupled from any lifetime.
pub struct RowSpan {
    ptr: *mut u8,
    len: usize,
    chunk: *const Chunk,
    tick_at_borrow: u64,
}

impl RowSpan {
    fn check(&self) {
        debug_assert_eq!(
            unsafe { (*self.chunk).mutation_tick() },
            self.tick_at_borrow,
            "RowSpan used after its chunk mutated structurally"
        );
    }

    /// # Safety
    /// The owning chunk must still be alive.
    pub unsafe fn get(&self) -> &[u8] {
        self.check();
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// # Safety
    /// The owning chunk must still be alive, and no other reference to
    /// this span's bytes may be live.
    pub unsafe fn get_mut(&mut self) -> &mut [u8] {
        self.check();
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

/// Storage for every entity sharing one `Definition`.
pub struct Chunk {
    definition: Definition,
    entities: Vec<EntityId>,
    columns: Vec<Option<ComponentColumn>>,
    /// Bumped on every row-structural change; backs debug-only dangling
    /// interior-pointer detection for borrowed component/array spans.
    mutation_tick: u64,
}

impl Chunk {
    pub fn new(definition: Definition) -> Self {
        Self {
            definition,
            entities: Vec::new(),
            columns: (0..CAP).map(|_| None).collect(),
            mutation_tick: 0,
        }
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn mutation_tick(&self) -> u64 {
        self.mutation_tick
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Register a column for `type_index` with the given stride and drop
    /// function. Must be called once per component bit before any row is
    /// allocated, matching §4.D `Allocate(definition)`.
    pub fn allocate_column(
        &mut self,
        type_index: TypeIndex,
        stride: usize,
        drop_fn: Option<unsafe fn(*mut u8)>,
    ) {
        self.columns[type_index] = Some(ComponentColumn::new(stride, drop_fn));
    }

    pub fn has_column(&self, type_index: TypeIndex) -> bool {
        self.columns.get(type_index).map(Option::is_some).unwrap_or(false)
    }

    pub fn column(&self, type_index: TypeIndex) -> Option<&ComponentColumn> {
        self.columns.get(type_index).and_then(|c| c.as_ref())
    }

    pub fn column_mut(&mut self, type_index: TypeIndex) -> Option<&mut ComponentColumn> {
        self.columns.get_mut(type_index).and_then(|c| c.as_mut())
    }

    /// Columns in ascending bit-index order, paired with their index.
    /// Canonical order so serializers/copiers are deterministic.
    pub fn columns_in_order(&self) -> impl Iterator<Item = (TypeIndex, &ComponentColumn)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(idx, col)| col.as_ref().map(|c| (idx, c)))
    }

    /// Append `entity`'s row, pushing a zeroed element onto every column.
    pub fn add_row(&mut self, entity: EntityId) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in self.columns.iter_mut().flatten() {
            column.push_zeroed(row);
        }
        self.mutation_tick += 1;
        row
    }

    /// Swap-remove `row`, dropping every column's element at that row.
    /// Returns the entity that was swapped into `row` (if any), so the
    /// caller can fix up its slot.
    pub fn remove_row(&mut self, row: usize) -> Option<EntityId> {
        self.remove_row_after_move(row, BitMask::EMPTY)
    }

    /// Swap-remove `row`, skipping `drop_fn` for any column whose bit is set
    /// in `moved`. Use this instead of `remove_row` when the row was just
    /// passed through `move_row` into another chunk: those columns' bytes
    /// were bit-copied out verbatim, transferring ownership, so running
    /// `drop_fn` here too would double-drop (or use-after-free, for a
    /// destination that outlives this call) the moved value. Columns not in
    /// `moved` are genuinely going away and are dropped as usual.
    pub fn remove_row_after_move(&mut self, row: usize, moved: BitMask) -> Option<EntityId> {
        let len = self.entities.len();
        debug_assert!(row < len);
        for (type_index, column) in self.columns.iter_mut().enumerate() {
            let Some(column) = column else { continue };
            column.swap_remove(row, len, moved.contains(type_index));
        }
        self.entities.swap_remove(row);
        self.mutation_tick += 1;
        if row < self.entities.len() {
            Some(self.entities[row])
        } else {
            None
        }
    }

    /// Component bytes for a single element. Errors if the bit is unset.
    pub fn component_bytes_at(&self, row: usize, type_index: TypeIndex) -> Result<&[u8]> {
        let column = self.column(type_index).ok_or(EcsError::Missing)?;
        let stride = column.stride();
        if stride == 0 {
            return Ok(&[]);
        }
        let ptr = column.row_ptr(row);
        Ok(unsafe { std::slice::from_raw_parts(ptr, stride) })
    }

    pub fn component_bytes_at_mut(&mut self, row: usize, type_index: TypeIndex) -> Result<&mut [u8]> {
        let column = self.column_mut(type_index).ok_or(EcsError::Missing)?;
        let stride = column.stride();
        if stride == 0 {
            return Ok(&mut []);
        }
        let ptr = column.row_ptr_mut(row);
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr, stride) })
    }

    /// Like `component_bytes_at`, but hands back a tick-stamped `RowSpan`
    /// instead of a borrow-checked slice. Use this when a pointer needs to
    /// outlive the immediate call — e.g. a system that caches column
    /// pointers across a row-iteration loop instead of re-borrowing the
    /// chunk per entity. `RowSpan::get` panics in debug builds if the
    /// chunk has structurally mutated since the span was taken.
    pub fn checked_component_span(&self, row: usize, type_index: TypeIndex) -> Result<RowSpan> {
        let column = self.column(type_index).ok_or(EcsError::Missing)?;
        let stride = column.stride();
        let ptr = if stride == 0 {
            column.bytes().as_ptr() as *mut u8
        } else {
            column.row_ptr(row) as *mut u8
        };
        Ok(RowSpan {
            ptr,
            len: stride,
            chunk: self as *const Chunk,
            tick_at_borrow: self.mutation_tick,
        })
    }

    pub fn checked_component_span_mut(&mut self, row: usize, type_index: TypeIndex) -> Result<RowSpan> {
        let tick_at_borrow = self.mutation_tick;
        let chunk = self as *const Chunk;
        let column = self.column_mut(type_index).ok_or(EcsError::Missing)?;
        let stride = column.stride();
        let ptr = if stride == 0 {
            column.bytes().as_ptr() as *mut u8
        } else {
            column.row_ptr_mut(row)
        };
        Ok(RowSpan {
            ptr,
            len: stride,
            chunk,
            tick_at_borrow,
        })
    }

    /// Move the entity at `src_row` into `dst`, copying bytes for every
    /// component bit present in both chunks verbatim; destination columns
    /// with no source counterpart receive zeroed elements. Returns the new
    /// row in `dst`. The source row is left in place — callers must follow
    /// up with `remove_row(src_row)` once they've read anything they need
    /// from it, since `move_row` does not remove from `self`.
    pub fn move_row(&mut self, src_row: usize, dst: &mut Chunk, entity: EntityId) -> usize {
        let dst_row = dst.add_row(entity);
        for (type_index, dst_column) in dst.columns.iter_mut().enumerate() {
            let Some(dst_column) = dst_column else {
                continue;
            };
            if let Some(src_column) = self.columns.get(type_index).and_then(|c| c.as_ref()) {
                dst_column.copy_row_from(src_column, src_row, dst_row);
            }
        }
        dst_row
    }
}
