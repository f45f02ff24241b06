//! Parent/child state-machine helpers, operating directly on the entity
//! directory. Kept free of `World` so the acyclicity check and the
//! enabled/disabled propagation can be unit-tested against a bare slot
//! table.

use crate::entity::{EntityId, EntitySlot, EntityState};

/// `IsEnabled` reduces to exactly this: the entity's own state is Enabled.
pub fn is_effective_enabled(state: EntityState) -> bool {
    matches!(state, EntityState::Enabled)
}

fn is_effectively_disabled(state: EntityState) -> bool {
    matches!(state, EntityState::Disabled | EntityState::ImplicitlyDisabled)
}

/// Would attaching `entity` under `new_parent` create a cycle? Walks
/// `new_parent`'s ancestor chain looking for `entity`.
pub fn creates_cycle(slots: &[EntitySlot], entity: EntityId, new_parent: EntityId) -> bool {
    let mut cursor = Some(new_parent);
    while let Some(p) = cursor {
        if p == entity {
            return true;
        }
        cursor = slots[p.slot_index()].parent;
    }
    false
}

/// Is any ancestor of `start` (exclusive) effectively disabled?
pub fn has_disabled_ancestor(slots: &[EntitySlot], start: Option<EntityId>) -> bool {
    let mut cursor = start;
    while let Some(p) = cursor {
        if is_effectively_disabled(slots[p.slot_index()].state) {
            return true;
        }
        cursor = slots[p.slot_index()].parent;
    }
    false
}

/// Recompute `entity`'s own effective state from its current parent chain
/// and `wants_enabled` intent, then propagate the result down through its
/// descendants. Call this after any `SetEnabled` or `SetParent` that
/// changes `entity`'s position or intent.
pub fn refresh_subtree(slots: &mut [EntitySlot], entity: EntityId) {
    let idx = entity.slot_index();
    let parent = slots[idx].parent;
    let wants_enabled = slots[idx].wants_enabled;

    let ancestor_disabled = has_disabled_ancestor(slots, parent);
    slots[idx].state = if ancestor_disabled {
        EntityState::ImplicitlyDisabled
    } else if wants_enabled {
        EntityState::Enabled
    } else {
        EntityState::Disabled
    };

    propagate_children(slots, entity);
}

fn propagate_children(slots: &mut [EntitySlot], entity: EntityId) {
    let idx = entity.slot_index();
    let parent_disabled = is_effectively_disabled(slots[idx].state);
    let children: Vec<EntityId> = slots[idx].children.iter().copied().collect();

    for child in children {
        let child_idx = child.slot_index();
        let wants_enabled = slots[child_idx].wants_enabled;
        slots[child_idx].state = if parent_disabled {
            EntityState::ImplicitlyDisabled
        } else if wants_enabled {
            EntityState::Enabled
        } else {
            EntityState::Disabled
        };
        propagate_children(slots, child);
    }
}
