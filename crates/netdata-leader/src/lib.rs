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

//! Leader-side manager of the Thread Network Data.
//!
//! The elected Leader of a Thread mesh keeps the authoritative, versioned
//! registry of on-mesh prefixes, external routes, and services contributed
//! by border routers and service providers. This crate holds that registry
//! and the logic around it: validation of submitted data, the RLOC-scoped
//! merge and sweep operations, 6LoWPAN Context ID and Service ID
//! allocation, MGMT_COMMISSIONER_SET/GET handling, and the reconciliation
//! pass after a leader reset.
//!
//! The crate is sans-IO: message transport, timers, and the rest of the
//! node are reached through the [`LeaderHost`] port, and every handler runs
//! to completion on the caller's task.

#![deny(clippy::upper_case_acronyms)]
#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unreachable_pub)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(clippy::clone_on_ref_ptr)]

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    time::Duration,
};

mod context_ids;
mod host;
mod leader;

#[cfg(test)]
mod tests;

pub use crate::{
    host::LeaderHost,
    leader::{Leader, LeaderStartMode},
};

/// Context ID 0 names the mesh-local prefix and is never allocated here.
pub const MIN_CONTEXT_ID: u8 = 1;
pub const MAX_CONTEXT_ID: u8 = 15;

pub const MIN_SERVICE_ID: u8 = 0;
pub const MAX_SERVICE_ID: u8 = 15;

/// Bits of an RLOC16 naming the child; the bits above them name the
/// router.
const CHILD_ID_BITS: u8 = 6;

/// Router ID of an RLOC16 (its upper ten bits).
pub const fn router_id(rloc16: u16) -> u16 {
    rloc16 >> CHILD_ID_BITS
}

/// How RLOC16s are compared during removal sweeps.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MatchMode {
    /// Exact RLOC16 equality.
    Rloc16,
    /// Same router ID; child bits are ignored.
    RouterId,
}

impl MatchMode {
    pub const fn matches(self, first: u16, second: u16) -> bool {
        match self {
            Self::Rloc16 => first == second,
            Self::RouterId => router_id(first) == router_id(second),
        }
    }
}

/// Errors surfaced by the Leader operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Malformed or structurally invalid submission.
    Parse,
    /// Out of registry space, or out of Service/Context IDs.
    NoBufs,
    /// The submitter's router ID is not allocated.
    NoRoute,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "Parse"),
            Self::NoBufs => write!(f, "NoBufs"),
            Self::NoRoute => write!(f, "NoRoute"),
        }
    }
}

/// Tunables of the Leader.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderConfig {
    /// How long a 6LoWPAN Context ID stays reserved after its last border
    /// router is gone.
    pub context_id_reuse_delay: Duration,
    /// How long to wait for the restored Network Data after coming back up
    /// as leader before giving up and detaching.
    pub max_net_data_sync_wait: Duration,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            context_id_reuse_delay: Duration::from_secs(5 * 60),
            max_net_data_sync_wait: Duration::from_secs(60),
        }
    }
}
