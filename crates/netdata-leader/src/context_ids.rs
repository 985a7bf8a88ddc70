// Copyright (C) 2025-present The ThreadNetData Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{host::LeaderHost, MAX_CONTEXT_ID, MIN_CONTEXT_ID};
use std::time::{Duration, Instant};
use tracing::debug;

const SLOT_COUNT: usize = (MAX_CONTEXT_ID - MIN_CONTEXT_ID + 1) as usize;

/// Allocation state of one 6LoWPAN Context ID.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Slot {
    Unallocated,
    InUse,
    /// Reserved until the deadline so stale compression state drains from
    /// the mesh before the ID is handed out again.
    PendingRemove(Instant),
}

/// The 6LoWPAN Context ID table. IDs leave through a deferred-reclamation
/// window driven by the shared Leader timer.
#[derive(Debug, Clone)]
pub(crate) struct ContextIds {
    slots: [Slot; SLOT_COUNT],
    reuse_delay: Duration,
    is_clone: bool,
}

impl ContextIds {
    pub(crate) const fn new(reuse_delay: Duration) -> Self {
        Self {
            slots: [Slot::Unallocated; SLOT_COUNT],
            reuse_delay,
            is_clone: false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots = [Slot::Unallocated; SLOT_COUNT];
    }

    pub(crate) fn mark_as_clone(&mut self) {
        self.is_clone = true;
    }

    fn slot_index(context_id: u8) -> Option<usize> {
        (MIN_CONTEXT_ID..=MAX_CONTEXT_ID)
            .contains(&context_id)
            .then(|| usize::from(context_id - MIN_CONTEXT_ID))
    }

    /// First unallocated ID, or `None` when the table is exhausted. A
    /// clone never touches the real table and always reports the minimum.
    pub(crate) fn get_unallocated(&self) -> Option<u8> {
        if self.is_clone {
            return Some(MIN_CONTEXT_ID);
        }
        (MIN_CONTEXT_ID..=MAX_CONTEXT_ID)
            .find(|&id| self.slots[usize::from(id - MIN_CONTEXT_ID)] == Slot::Unallocated)
    }

    #[cfg(test)]
    pub(crate) fn is_in_use(&self, context_id: u8) -> bool {
        Self::slot_index(context_id).is_some_and(|index| self.slots[index] == Slot::InUse)
    }

    /// Moves the ID to in-use from any state, cancelling a pending
    /// removal.
    pub(crate) fn mark_in_use(&mut self, context_id: u8) {
        let Some(index) = Self::slot_index(context_id) else {
            return;
        };
        self.slots[index] = Slot::InUse;
    }

    /// Starts the reuse-delay window for an in-use ID and arms the shared
    /// timer no later than its deadline.
    pub(crate) fn schedule_to_remove(&mut self, context_id: u8, host: &mut impl LeaderHost) {
        if self.is_clone {
            return;
        }
        let Some(index) = Self::slot_index(context_id) else {
            return;
        };
        if self.slots[index] != Slot::InUse {
            return;
        }
        let deadline = host.now() + self.reuse_delay;
        self.slots[index] = Slot::PendingRemove(deadline);
        debug!("scheduled removal of context id {context_id}");
        host.timer_fire_at_if_earlier(deadline);
    }

    /// Unallocates every pending ID whose deadline has passed and returns
    /// them, along with the earliest deadline still outstanding.
    pub(crate) fn take_expired(&mut self, now: Instant) -> (Vec<u8>, Option<Instant>) {
        let mut expired = Vec::new();
        let mut next_deadline: Option<Instant> = None;

        for id in MIN_CONTEXT_ID..=MAX_CONTEXT_ID {
            let index = usize::from(id - MIN_CONTEXT_ID);
            if let Slot::PendingRemove(deadline) = self.slots[index] {
                if deadline <= now {
                    self.slots[index] = Slot::Unallocated;
                    expired.push(id);
                } else {
                    next_deadline =
                        Some(next_deadline.map_or(deadline, |earliest| earliest.min(deadline)));
                }
            }
        }

        (expired, next_deadline)
    }
}
