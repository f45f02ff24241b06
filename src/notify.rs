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

//! Change-callback fan-out.
//!
//! Each notifier keeps subscribers in registration order and fires over a
//! defensive snapshot (an `Rc` clone, not a deep copy) so a callback that
//! mutates the `World` and re-subscribes or unsubscribes doesn't perturb
//! the loop currently firing.
//!
//! Subscribers are stored as `Rc<dyn Fn>`, not `Rc<RefCell<dyn FnMut>>`:
//! a callback that reentrantly triggers the same notifier (e.g. a handler
//! on `on_entity_created` that itself creates an entity) would otherwise
//! try to borrow its own `RefCell` a second time while the outer call is
//! still on the stack, panicking. `Fn` only needs `&self` to call, so the
//! same subscriber can appear twice on the call stack at once; subscribers
//! that need to mutate state do so through their own interior mutability.

use std::rc::Rc;

use crate::entity::EntityId;
use crate::schema::{TypeIndex, TypeKind};

/// `Added` or `Removed`, paired with a `TypeKind` to say which namespace
/// the changed bit lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChangeKind {
    Added,
    Removed,
}

/// Backs both `EntityCreated` and `EntityDestroyed` — same `(id, userdata)`
/// shape.
#[derive(Default)]
pub struct EntityLifecycleNotifier {
    entries: Vec<(Rc<dyn Fn(EntityId, u64)>, u64)>,
}

impl EntityLifecycleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, userdata: u64, callback: impl Fn(EntityId, u64) + 'static) {
        self.entries.push((Rc::new(callback), userdata));
    }

    pub fn fire(&self, id: EntityId) {
        let snapshot: Vec<_> = self.entries.clone();
        for (callback, userdata) in snapshot {
            callback(id, userdata);
        }
    }
}

#[derive(Default)]
pub struct ParentChangedNotifier {
    entries: Vec<(Rc<dyn Fn(EntityId, Option<EntityId>, Option<EntityId>, u64)>, u64)>,
}

impl ParentChangedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        userdata: u64,
        callback: impl Fn(EntityId, Option<EntityId>, Option<EntityId>, u64) + 'static,
    ) {
        self.entries.push((Rc::new(callback), userdata));
    }

    pub fn fire(&self, id: EntityId, old_parent: Option<EntityId>, new_parent: Option<EntityId>) {
        let snapshot: Vec<_> = self.entries.clone();
        for (callback, userdata) in snapshot {
            callback(id, old_parent, new_parent, userdata);
        }
    }
}

#[derive(Default)]
pub struct DataChangedNotifier {
    entries: Vec<(Rc<dyn Fn(EntityId, TypeIndex, TypeKind, DataChangeKind, u64)>, u64)>,
}

impl DataChangedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        userdata: u64,
        callback: impl Fn(EntityId, TypeIndex, TypeKind, DataChangeKind, u64) + 'static,
    ) {
        self.entries.push((Rc::new(callback), userdata));
    }

    pub fn fire(&self, id: EntityId, type_index: TypeIndex, kind: TypeKind, change: DataChangeKind) {
        let snapshot: Vec<_> = self.entries.clone();
        for (callback, userdata) in snapshot {
            callback(id, type_index, kind, change, userdata);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc as StdRc;

    #[test]
    fn fires_in_subscription_order() {
        let mut notifier = EntityLifecycleNotifier::new();
        let order = StdRc::new(RefCell::new(Vec::new()));

        let o1 = order.clone();
        notifier.subscribe(1, move |id, userdata| o1.borrow_mut().push((id.get(), userdata)));
        let o2 = order.clone();
        notifier.subscribe(2, move |id, userdata| o2.borrow_mut().push((id.get(), userdata)));

        notifier.fire(EntityId::new(7).unwrap());
        assert_eq!(*order.borrow(), vec![(7, 1), (7, 2)]);
    }

    #[test]
    fn reentrant_fire_sees_a_stable_snapshot() {
        // A callback that fires the same notifier again (simulating a
        // reentrant structural change inside a subscriber) must not cause
        // the outer loop to observe a different subscriber set mid-fire.
        let notifier = StdRc::new(RefCell::new(EntityLifecycleNotifier::new()));
        let calls = StdRc::new(Cell::new(0));

        let notifier_inner = notifier.clone();
        let calls_inner = calls.clone();
        notifier.borrow_mut().subscribe(0, move |id, _userdata| {
            calls_inner.set(calls_inner.get() + 1);
            if calls_inner.get() == 1 {
                notifier_inner.borrow().fire(id);
            }
        });

        notifier.borrow().fire(EntityId::new(1).unwrap());
        assert_eq!(calls.get(), 2);
    }
}
