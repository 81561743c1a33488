//! Change-notification hook for flow field dependents.
//!
//! Critters (and anything else routing over the field) register a
//! subscription and poll its changed flag instead of holding a callback into
//! the grid. Tokens carry a slot generation so a subscriber that outlives a
//! slot reuse cannot observe another subscriber's flag: a stale token is
//! simply ignored.

use smallvec::SmallVec;

/// Opaque subscription token handed out by [`GridMap::subscribe`].
///
/// [`GridMap::subscribe`]: super::GridMap::subscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSubscription {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    live: bool,
    changed: bool,
}

/// Arena of subscriber slots with a free list for reuse.
#[derive(Debug, Clone, Default)]
pub(super) struct FlowFieldSubscribers {
    slots: Vec<Slot>,
    free: SmallVec<[usize; 8]>,
}

impl FlowFieldSubscribers {
    pub(super) fn subscribe(&mut self) -> FlowSubscription {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.live = true;
        slot.changed = false;
        FlowSubscription {
            index,
            generation: slot.generation,
        }
    }

    pub(super) fn unsubscribe(&mut self, subscription: FlowSubscription) {
        let Some(slot) = self.slots.get_mut(subscription.index) else {
            return;
        };
        if !slot.live || slot.generation != subscription.generation {
            return;
        }
        slot.live = false;
        slot.changed = false;
        // Bump the generation on release so the freed token can never match
        // the slot's next occupant.
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(subscription.index);
    }

    /// Marks every live subscription changed. Called synchronously at the
    /// end of each flow field recompute.
    pub(super) fn notify_all(&mut self) {
        for slot in &mut self.slots {
            if slot.live {
                slot.changed = true;
            }
        }
    }

    pub(super) fn take_changed(&mut self, subscription: FlowSubscription) -> bool {
        let Some(slot) = self.slots.get_mut(subscription.index) else {
            return false;
        };
        if !slot.live || slot.generation != subscription.generation {
            return false;
        }
        std::mem::take(&mut slot.changed)
    }

    pub(super) fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.live).count()
    }
}
