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

//! Archetype-chunk Entity-Component-System core.
//!
//! Organizes entities by the exact set of component types they carry,
//! supports structural mutation (add/remove component, array, tag),
//! type-filtered iteration via `Query`, parent/child hierarchies with
//! inherited enable/disable state, cross-entity reference handles, and a
//! change-notifier fan-out. Everything here is single-threaded and
//! cooperative; a `World` owns its storage exclusively.

pub mod bitmask;
pub mod chunk;
pub mod component;
pub mod definition;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod notify;
pub mod query;
pub mod schema;
pub mod world;

pub use bitmask::{BitMask, CAP};
pub use chunk::{Chunk, ComponentColumn, RowSpan};
pub use component::{ArrayElement, Component, Tag};
pub use definition::{ArchetypeKey, Definition};
pub use entity::{ArrayStorage, EntityId, EntitySlot, EntityState};
pub use error::{EcsError, Result};
pub use notify::{DataChangeKind, DataChangedNotifier, EntityLifecycleNotifier, ParentChangedNotifier};
pub use query::{Query, TypedQuery};
pub use schema::{Schema, TypeDescriptor, TypeIndex, TypeKind};
pub use world::{TypeBank, World};
