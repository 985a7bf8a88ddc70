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

use std::time::{Duration, Instant};

/// Everything the Leader needs from the rest of the node.
///
/// One implementation typically fronts the router table, the MLE layer,
/// the event notifier, and a single-shot timer whose expiry calls back
/// into [`crate::Leader::handle_timer`].
pub trait LeaderHost {
    /// Monotonic clock used for Context ID reclamation deadlines.
    fn now(&self) -> Instant;

    /// Whether `router_id` (the upper ten bits of an RLOC16) is currently
    /// allocated in the router table.
    fn is_router_allocated(&self, router_id: u16) -> bool;

    /// Whether this device currently holds the leader role.
    fn is_leader(&self) -> bool;

    /// This device's own RLOC16.
    fn rloc16(&self) -> u16;

    /// Abandon the leader role and restart attachment.
    fn become_detached(&mut self);

    /// The Network Data (or one of its version counters) changed;
    /// propagation to the mesh should be triggered.
    fn signal_net_data_changed(&mut self);

    /// A registration ran out of registry space; interested parties may
    /// react (e.g. stop advertising low-priority prefixes).
    fn signal_net_data_full(&mut self);

    /// Arm the shared timer to fire after `duration`.
    fn timer_start(&mut self, duration: Duration);

    /// Arm the shared timer to fire at `deadline`, replacing any earlier
    /// schedule.
    fn timer_fire_at(&mut self, deadline: Instant);

    /// Arm the shared timer to fire at `deadline` unless it is already set
    /// to fire sooner.
    fn timer_fire_at_if_earlier(&mut self, deadline: Instant);
}
