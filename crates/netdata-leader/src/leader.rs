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

use crate::{
    context_ids::ContextIds, host::LeaderHost, router_id, Error, LeaderConfig, MatchMode,
    MAX_SERVICE_ID, MIN_SERVICE_ID,
};
use ipnet::Ipv6Net;
use netgauze_parse_utils::WritablePdu;
use std::time::Duration;
use thread_netdata_pkt::{
    iana::{MeshcopState, MeshcopTlvType},
    meshcop::{find_meshcop_tlv, meshcop_tlvs},
    wire::serializer::NetworkDataWritingError,
    BorderRouterEntry, BorderRouterTlv, CommissioningDataTlv, ContextTlv, HasRouteEntry,
    HasRouteTlv, NetworkData, NetworkDataTlv, PrefixSubTlv, PrefixTlv, ServerTlv, ServiceSubTlv,
    ServiceTlv, MAX_NETWORK_DATA_SIZE, TLV_HEADER_SIZE,
};
use tracing::{debug, info};

/// How the device is (re)entering the leader role.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaderStartMode {
    StartingAsLeader,
    /// The device restored the leader role after a reset and must wait for
    /// its previous Network Data to come back before serving requests.
    RestoringLeaderRoleAfterReset,
}

/// Tracks what a mutation touched so version counters advance accordingly.
#[derive(Debug, Default, Copy, Clone)]
struct ChangedFlags {
    changed: bool,
    stable_changed: bool,
}

impl ChangedFlags {
    fn update(&mut self, stable: bool) {
        self.changed = true;
        self.stable_changed |= stable;
    }

    const fn did_change(self) -> bool {
        self.changed
    }

    const fn did_stable_change(self) -> bool {
        self.stable_changed
    }
}

#[derive(Debug, Eq, PartialEq)]
enum UpdateStatus {
    TlvUpdated,
    TlvRemoved,
}

/// The authoritative, versioned Network Data registry kept by the Leader.
///
/// All state is owned here; collaborators are reached through
/// [`LeaderHost`]. The registry is a typed TLV tree whose deterministic
/// serialization (see `thread-netdata-pkt`) is the wire form, bounded by
/// [`MAX_NETWORK_DATA_SIZE`].
#[derive(Debug)]
pub struct Leader {
    net_data: NetworkData,
    version: u8,
    stable_version: u8,
    context_ids: ContextIds,
    waiting_for_net_data_sync: bool,
    is_clone: bool,
    max_net_data_sync_wait: Duration,
}

impl Leader {
    pub fn new(config: &LeaderConfig) -> Self {
        Self {
            net_data: NetworkData::default(),
            version: 0,
            stable_version: 0,
            context_ids: ContextIds::new(config.context_id_reuse_delay),
            waiting_for_net_data_sync: false,
            is_clone: false,
            max_net_data_sync_wait: config.max_net_data_sync_wait,
        }
    }

    /// Clears the registry and the Context ID table.
    pub fn reset(&mut self) {
        self.net_data.tlvs_mut().clear();
        self.context_ids.clear();
    }

    /// Enters the leader role. Restoring after a reset arms the sync
    /// timeout and holds off submissions until the previous Network Data
    /// arrives (see [`Self::handle_network_data_restored`]).
    pub fn start(&mut self, start_mode: LeaderStartMode, host: &mut impl LeaderHost) {
        self.waiting_for_net_data_sync =
            start_mode == LeaderStartMode::RestoringLeaderRoleAfterReset;
        if self.waiting_for_net_data_sync {
            host.timer_start(self.max_net_data_sync_wait);
        }
    }

    pub const fn version(&self) -> u8 {
        self.version
    }

    pub const fn stable_version(&self) -> u8 {
        self.stable_version
    }

    pub const fn is_waiting_for_net_data_sync(&self) -> bool {
        self.waiting_for_net_data_sync
    }

    pub const fn network_data(&self) -> &NetworkData {
        &self.net_data
    }

    /// Serialized registry, the form persisted and propagated to the mesh.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, NetworkDataWritingError> {
        let mut buf = Vec::with_capacity(self.net_data.wire_size());
        self.net_data.write(&mut buf)?;
        Ok(buf)
    }

    pub fn find_prefix(&self, prefix: &Ipv6Net) -> Option<&PrefixTlv> {
        self.net_data.find_prefix(prefix)
    }

    pub fn find_service(&self, enterprise_number: u32, service_data: &[u8]) -> Option<&ServiceTlv> {
        self.net_data.find_service(enterprise_number, service_data)
    }

    pub fn find_service_by_id(&self, service_id: u8) -> Option<&ServiceTlv> {
        self.net_data
            .services()
            .find(|service| service.service_id() == service_id)
    }

    /// Every Server sub-TLV in the registry, in wire order.
    pub fn servers(&self) -> impl Iterator<Item = &ServerTlv> {
        self.net_data.services().flat_map(ServiceTlv::servers)
    }

    #[cfg(test)]
    pub(crate) fn context_id_in_use(&self, context_id: u8) -> bool {
        self.context_ids.is_in_use(context_id)
    }

    /// Installs network data as if it had been restored from the mesh
    /// after a reset.
    #[cfg(test)]
    pub(crate) fn restore_network_data(&mut self, net_data: NetworkData) {
        self.net_data = net_data;
    }

    /// Bumps `version` (propagation trigger) when this device is leader.
    pub fn increment_version(&mut self, host: &mut impl LeaderHost) {
        if host.is_leader() {
            self.increment_versions(false, host);
        }
    }

    /// Bumps both counters when this device is leader.
    pub fn increment_version_and_stable_version(&mut self, host: &mut impl LeaderHost) {
        if host.is_leader() {
            self.increment_versions(true, host);
        }
    }

    fn increment_versions_on(&mut self, flags: ChangedFlags, host: &mut impl LeaderHost) {
        if flags.did_change() {
            self.increment_versions(flags.did_stable_change(), host);
        }
    }

    fn increment_versions(&mut self, include_stable: bool, host: &mut impl LeaderHost) {
        if self.is_clone {
            return;
        }
        if include_stable {
            self.stable_version = self.stable_version.wrapping_add(1);
        }
        self.version = self.version.wrapping_add(1);
        host.signal_net_data_changed();
    }

    /// Validates and merges `net_data` submitted by the device at
    /// `rloc16`, sweeping out that device's entries that the submission no
    /// longer carries. Whatever changed before a failure stays committed;
    /// version counters reflect exactly what changed.
    pub fn register_network_data(
        &mut self,
        rloc16: u16,
        net_data: &NetworkData,
        host: &mut impl LeaderHost,
    ) -> Result<(), Error> {
        let mut flags = ChangedFlags::default();
        let result = self.register_network_data_inner(rloc16, net_data, &mut flags, host);

        self.increment_versions_on(flags, host);

        if let Err(error) = result {
            if error == Error::NoBufs {
                host.signal_net_data_full();
            }
            if !self.is_clone {
                info!("failed to register network data from {rloc16:#06x}: {error}");
            }
        }
        result
    }

    fn register_network_data_inner(
        &mut self,
        rloc16: u16,
        net_data: &NetworkData,
        flags: &mut ChangedFlags,
        host: &mut impl LeaderHost,
    ) -> Result<(), Error> {
        if !host.is_router_allocated(router_id(rloc16)) {
            return Err(Error::NoRoute);
        }
        Self::validate(net_data, rloc16)?;

        // Remove everything this device registered before, keeping entries
        // the new submission still carries so they never transiently
        // disappear from the mesh.
        self.remove_rloc(rloc16, MatchMode::Rloc16, Some(net_data), flags, host);

        for tlv in net_data.tlvs() {
            match tlv {
                NetworkDataTlv::Prefix(prefix) => self.add_prefix(prefix, flags)?,
                NetworkDataTlv::Service(service) => self.add_service(service, flags)?,
                NetworkDataTlv::CommissioningData(_) => {}
                NetworkDataTlv::Unknown(unknown) => {
                    debug!(
                        "ignoring unknown TLV type {} in registration",
                        unknown.type_value()
                    );
                }
            }
        }
        Ok(())
    }

    /// Sweeps out every entry registered by `rloc16` (per `match_mode`)
    /// and bumps versions for whatever was removed.
    pub fn remove_border_router(
        &mut self,
        rloc16: u16,
        match_mode: MatchMode,
        host: &mut impl LeaderHost,
    ) {
        let mut flags = ChangedFlags::default();
        self.remove_rloc(rloc16, match_mode, None, &mut flags, host);
        self.increment_versions_on(flags, host);
    }

    /// Strips the Context TLV carrying `context_id` from every prefix.
    /// Called from the timer path once the reuse delay has expired.
    pub fn remove_context(&mut self, context_id: u8, host: &mut impl LeaderHost) {
        let tlvs = self.net_data.tlvs_mut();
        let mut index = 0;
        while index < tlvs.len() {
            if let NetworkDataTlv::Prefix(prefix) = &mut tlvs[index] {
                prefix.sub_tlvs_mut().retain(|sub_tlv| {
                    !matches!(sub_tlv, PrefixSubTlv::Context(context)
                        if context.context_id() == context_id)
                });
                if update_parent(tlvs, index) == UpdateStatus::TlvRemoved {
                    // Do not advance when the TLV is removed.
                    continue;
                }
            }
            index += 1;
        }
        self.increment_versions(true, host);
    }

    /// Raw value of the stored Commissioning Data TLV, if any.
    pub fn commissioning_data(&self) -> Option<&[u8]> {
        self.net_data.tlvs().iter().find_map(|tlv| match tlv {
            NetworkDataTlv::CommissioningData(data) => Some(data.data()),
            _ => None,
        })
    }

    /// Replaces the Commissioning Data TLV with `data` (removes it when
    /// `data` is empty). Fails without touching the registry when the new
    /// payload would not fit.
    pub fn set_commissioning_data(&mut self, data: &[u8]) -> Result<(), Error> {
        if !data.is_empty() {
            let old_size = self
                .net_data
                .tlvs()
                .iter()
                .find_map(|tlv| match tlv {
                    NetworkDataTlv::CommissioningData(existing) => Some(existing.wire_size()),
                    _ => None,
                })
                .unwrap_or(0);
            let new_size = TLV_HEADER_SIZE + data.len();
            if self.net_data.wire_size() - old_size + new_size > MAX_NETWORK_DATA_SIZE {
                return Err(Error::NoBufs);
            }
        }

        let tlvs = self.net_data.tlvs_mut();
        tlvs.retain(|tlv| !matches!(tlv, NetworkDataTlv::CommissioningData(_)));
        if !data.is_empty() {
            tlvs.push(NetworkDataTlv::CommissioningData(CommissioningDataTlv::new(
                data.to_vec(),
            )));
        }
        Ok(())
    }

    /// `n/sd` (server data registration). `rloc16_tlv` and `net_data` are
    /// the decoded optional TLVs of the request; `peer_rloc16` is the
    /// sender's locator, already verified to be an RLOC by the transport.
    /// Returns whether an empty acknowledgment should be sent.
    pub fn handle_server_data(
        &mut self,
        peer_rloc16: u16,
        rloc16_tlv: Option<u16>,
        net_data: Option<&NetworkData>,
        host: &mut impl LeaderHost,
    ) -> bool {
        if !host.is_leader() || self.waiting_for_net_data_sync {
            return false;
        }

        info!("received server data registration from {peer_rloc16:#06x}");

        if let Some(rloc16) = rloc16_tlv {
            self.remove_border_router(rloc16, MatchMode::Rloc16, host);
        }
        if let Some(net_data) = net_data {
            let _ = self.register_network_data(peer_rloc16, net_data, host);
        }
        true
    }

    /// `c/cs` (MGMT_COMMISSIONER_SET). `payload` is the raw MeshCoP TLV
    /// sequence of the request. Returns the State TLV value to respond
    /// with, or `None` when no response should be sent at all.
    pub fn handle_commissioner_set(
        &mut self,
        payload: &[u8],
        host: &mut impl LeaderHost,
    ) -> Option<MeshcopState> {
        if !host.is_leader() {
            return None;
        }
        if self.waiting_for_net_data_sync {
            return Some(MeshcopState::Reject);
        }
        match self.commissioner_set(payload, host) {
            Ok(()) => Some(MeshcopState::Accept),
            Err(error) => {
                info!("rejecting commissioner set request: {error}");
                Some(MeshcopState::Reject)
            }
        }
    }

    fn commissioner_set(
        &mut self,
        payload: &[u8],
        host: &mut impl LeaderHost,
    ) -> Result<(), Error> {
        if payload.len() > MAX_NETWORK_DATA_SIZE {
            return Err(Error::NoBufs);
        }

        // Session ID is required, a Border Agent Locator must not be set,
        // and at least one valid TLV must be present; any other unexpected
        // or unknown TLV rides along.
        let mut session_id = None;
        let mut has_valid_tlv = false;
        for tlv in meshcop_tlvs(payload) {
            let tlv = tlv.map_err(|_| Error::Parse)?;
            match MeshcopTlvType::try_from(tlv.type_value()) {
                Ok(MeshcopTlvType::JoinerUdpPort) | Ok(MeshcopTlvType::SteeringData) => {
                    has_valid_tlv = true;
                }
                Ok(MeshcopTlvType::BorderAgentLocator) => return Err(Error::Parse),
                Ok(MeshcopTlvType::CommissionerSessionId) => {
                    session_id = Some(tlv.as_u16().ok_or(Error::Parse)?);
                }
                _ => {}
            }
        }
        let session_id = session_id.ok_or(Error::Parse)?;
        if !has_valid_tlv {
            return Err(Error::Parse);
        }

        let mut scratch = payload.to_vec();
        if let Some(data) = self.commissioning_data() {
            for tlv in meshcop_tlvs(data).flatten() {
                match MeshcopTlvType::try_from(tlv.type_value()) {
                    Ok(MeshcopTlvType::CommissionerSessionId) => {
                        if tlv.as_u16() != Some(session_id) {
                            return Err(Error::Parse);
                        }
                    }
                    Ok(MeshcopTlvType::BorderAgentLocator) => {
                        if scratch.len() + tlv.size() > MAX_NETWORK_DATA_SIZE {
                            return Err(Error::NoBufs);
                        }
                        tlv.write_to(&mut scratch);
                    }
                    _ => {}
                }
            }
        }

        self.set_commissioning_data(&scratch)?;
        self.increment_versions(true, host);
        Ok(())
    }

    /// `c/cg` (MGMT_COMMISSIONER_GET). `payload` is the raw MeshCoP TLV
    /// sequence of the request; a Get TLV in it lists the types to return.
    /// Returns the response payload, or `None` when the request should be
    /// dropped without a response.
    pub fn handle_commissioner_get(
        &self,
        payload: &[u8],
        host: &impl LeaderHost,
    ) -> Option<Vec<u8>> {
        if !host.is_leader() {
            return None;
        }

        let requested_types = if self.waiting_for_net_data_sync {
            None
        } else {
            find_meshcop_tlv(payload, MeshcopTlvType::Get.into()).map(|tlv| tlv.value())
        };

        let data = self.commissioning_data()?;
        if data.is_empty() {
            return None;
        }

        match requested_types {
            Some(types) if !types.is_empty() => {
                let mut response = Vec::new();
                for &type_value in types {
                    if let Some(tlv) = find_meshcop_tlv(data, type_value) {
                        tlv.write_to(&mut response);
                    }
                }
                Some(response)
            }
            _ => Some(data.to_vec()),
        }
    }

    /// Called when the previous Network Data arrives after a reset.
    /// Reconciles it against the restored router table and re-seeds the
    /// Context ID table.
    pub fn handle_network_data_restored(&mut self, host: &mut impl LeaderHost) {
        self.waiting_for_net_data_sync = false;

        let mut flags = ChangedFlags::default();

        // A router ID may have been released right before the reset,
        // after the MLE advertisement went out but before the updated
        // Network Data did. Sweep entries of unallocated router IDs; each
        // sweep mutates the registry, so restart the walk after every hit.
        loop {
            let stale_rloc16 = self
                .servers()
                .map(ServerTlv::server16)
                .find(|&server16| !host.is_router_allocated(router_id(server16)));
            match stale_rloc16 {
                Some(rloc16) => {
                    self.remove_rloc(rloc16, MatchMode::RouterId, None, &mut flags, host)
                }
                None => break,
            }
        }

        self.increment_versions_on(flags, host);

        // Synchronize the Context ID table with the restored data.
        let Self {
            net_data,
            context_ids,
            ..
        } = self;
        for prefix in net_data.prefixes() {
            if let Some(context) = prefix.find_context() {
                context_ids.mark_in_use(context.context_id());
                if !context.is_compress() {
                    context_ids.schedule_to_remove(context.context_id(), host);
                }
            }
        }
    }

    /// Shared timer expiry: either the post-reset sync timed out, or
    /// Context ID reuse delays may have elapsed.
    pub fn handle_timer(&mut self, host: &mut impl LeaderHost) {
        if self.waiting_for_net_data_sync {
            info!("timed out waiting for netdata on restoring leader role after reset");
            host.become_detached();
            return;
        }

        let (expired, next_deadline) = self.context_ids.take_expired(host.now());
        for context_id in expired {
            debug!("reclaiming context id {context_id}");
            self.remove_context(context_id, host);
        }
        if let Some(deadline) = next_deadline {
            host.timer_fire_at(deadline);
        }
    }

    /// Replays removing `old_rloc16` and registering `net_data` (as this
    /// device's own contribution) against a throwaway copy of the
    /// registry, to learn ahead of time whether the real registration
    /// would run out of space. Only `signal_net_data_full` can escape the
    /// replay; versions, timers, and the ID tables stay untouched.
    pub fn check_for_net_data_getting_full(
        &self,
        net_data: &NetworkData,
        old_rloc16: Option<u16>,
        host: &mut impl LeaderHost,
    ) {
        if host.is_leader() {
            return;
        }

        let mut clone = self.clone_for_capacity_check();
        if let Some(rloc16) = old_rloc16 {
            clone.remove_border_router(rloc16, MatchMode::Rloc16, host);
        }
        let _ = clone.register_network_data(host.rloc16(), net_data, host);
    }

    fn clone_for_capacity_check(&self) -> Self {
        let mut context_ids = self.context_ids.clone();
        context_ids.mark_as_clone();
        Self {
            net_data: self.net_data.clone(),
            version: self.version,
            stable_version: self.stable_version,
            context_ids,
            waiting_for_net_data_sync: false,
            is_clone: true,
            max_net_data_sync_wait: self.max_net_data_sync_wait,
        }
    }

    // Validation of submitted network data.

    /// Checks that `net_data` holds well-formed, duplicate-free Prefix and
    /// Service TLVs whose entries all belong to `rloc16`. Top-level TLVs
    /// of other types are accepted without inspection.
    fn validate(net_data: &NetworkData, rloc16: u16) -> Result<(), Error> {
        for (index, tlv) in net_data.tlvs().iter().enumerate() {
            let preceding = &net_data.tlvs()[..index];
            match tlv {
                NetworkDataTlv::Prefix(prefix) => {
                    let duplicate = preceding.iter().any(|other| {
                        matches!(other, NetworkDataTlv::Prefix(other_prefix)
                            if other_prefix.prefix() == prefix.prefix())
                    });
                    if duplicate {
                        return Err(Error::Parse);
                    }
                    Self::validate_prefix(prefix, rloc16)?;
                }
                NetworkDataTlv::Service(service) => {
                    let duplicate = preceding.iter().any(|other| {
                        matches!(other, NetworkDataTlv::Service(other_service)
                            if other_service.matches(service.enterprise_number(), service.service_data()))
                    });
                    if duplicate {
                        return Err(Error::Parse);
                    }
                    Self::validate_service(service, rloc16)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// A submitted Prefix TLV may carry at most one stable and one
    /// temporary Has Route and Border Router sub-TLV, each holding exactly
    /// one entry owned by `rloc16`, and at least one of the four must be
    /// present.
    fn validate_prefix(prefix: &PrefixTlv, rloc16: u16) -> Result<(), Error> {
        let mut found_stable_has_route = false;
        let mut found_temp_has_route = false;
        let mut found_stable_border_router = false;
        let mut found_temp_border_router = false;

        for sub_tlv in prefix.sub_tlvs() {
            match sub_tlv {
                PrefixSubTlv::HasRoute(has_route) => {
                    let found = if has_route.is_stable() {
                        &mut found_stable_has_route
                    } else {
                        &mut found_temp_has_route
                    };
                    if *found {
                        return Err(Error::Parse);
                    }
                    *found = true;

                    let [entry] = has_route.entries() else {
                        return Err(Error::Parse);
                    };
                    if entry.rloc16() != rloc16 {
                        return Err(Error::Parse);
                    }
                }
                PrefixSubTlv::BorderRouter(border_router) => {
                    let found = if border_router.is_stable() {
                        &mut found_stable_border_router
                    } else {
                        &mut found_temp_border_router
                    };
                    if *found {
                        return Err(Error::Parse);
                    }
                    *found = true;

                    let [entry] = border_router.entries() else {
                        return Err(Error::Parse);
                    };
                    if entry.rloc16() != rloc16 {
                        return Err(Error::Parse);
                    }
                }
                _ => {}
            }
        }

        if found_stable_has_route
            || found_temp_has_route
            || found_stable_border_router
            || found_temp_border_router
        {
            Ok(())
        } else {
            Err(Error::Parse)
        }
    }

    /// A submitted Service TLV must carry exactly one Server sub-TLV,
    /// owned by `rloc16`.
    fn validate_service(service: &ServiceTlv, rloc16: u16) -> Result<(), Error> {
        let mut found_server = false;

        for sub_tlv in service.sub_tlvs() {
            if let ServiceSubTlv::Server(server) = sub_tlv {
                if found_server {
                    return Err(Error::Parse);
                }
                found_server = true;
                if server.server16() != rloc16 {
                    return Err(Error::Parse);
                }
            }
        }

        if found_server {
            Ok(())
        } else {
            Err(Error::Parse)
        }
    }

    // Merge engine.

    fn can_insert(&self, size: usize) -> bool {
        self.net_data.wire_size() + size <= MAX_NETWORK_DATA_SIZE
    }

    fn find_prefix_index(&self, prefix: &Ipv6Net) -> Option<usize> {
        self.net_data.tlvs().iter().position(|tlv| {
            matches!(tlv, NetworkDataTlv::Prefix(candidate) if candidate.prefix() == prefix)
        })
    }

    fn find_service_index(&self, enterprise_number: u32, service_data: &[u8]) -> Option<usize> {
        self.net_data.tlvs().iter().position(|tlv| {
            matches!(tlv, NetworkDataTlv::Service(candidate)
                if candidate.matches(enterprise_number, service_data))
        })
    }

    fn add_prefix(&mut self, src: &PrefixTlv, flags: &mut ChangedFlags) -> Result<(), Error> {
        let dst_index = match self.find_prefix_index(src.prefix()) {
            Some(index) => index,
            None => {
                let size = TLV_HEADER_SIZE + 2 + src.prefix_wire_len();
                if !self.can_insert(size) {
                    return Err(Error::NoBufs);
                }
                self.net_data.tlvs_mut().push(NetworkDataTlv::Prefix(PrefixTlv::new(
                    src.domain_id(),
                    *src.prefix(),
                    false,
                    vec![],
                )));
                self.net_data.tlvs().len() - 1
            }
        };

        let mut result = Ok(());
        for sub_tlv in src.sub_tlvs() {
            result = match sub_tlv {
                PrefixSubTlv::HasRoute(has_route) => {
                    self.add_has_route(dst_index, has_route, flags)
                }
                PrefixSubTlv::BorderRouter(border_router) => {
                    self.add_border_router(dst_index, border_router, flags)
                }
                _ => Ok(()),
            };
            if result.is_err() {
                break;
            }
        }

        // Recomputes the stable flag, and drops the prefix again if no
        // sub-TLV could be added under it.
        update_parent(self.net_data.tlvs_mut(), dst_index);
        result
    }

    fn add_has_route(
        &mut self,
        dst_index: usize,
        src: &HasRouteTlv,
        flags: &mut ChangedFlags,
    ) -> Result<(), Error> {
        let Some(entry) = src.entries().first() else {
            return Ok(());
        };
        let stable = src.is_stable();

        let (tlv_missing, entry_present) = {
            let NetworkDataTlv::Prefix(dst_prefix) = &self.net_data.tlvs()[dst_index] else {
                return Ok(());
            };
            match dst_prefix.find_has_route(stable) {
                Some(has_route) => (false, has_route.entries().contains(entry)),
                None => (true, false),
            }
        };

        if tlv_missing && !self.can_insert(TLV_HEADER_SIZE + HasRouteEntry::WIRE_SIZE) {
            return Err(Error::NoBufs);
        }
        if entry_present {
            return Ok(());
        }
        if !tlv_missing && !self.can_insert(HasRouteEntry::WIRE_SIZE) {
            return Err(Error::NoBufs);
        }

        let NetworkDataTlv::Prefix(dst_prefix) = &mut self.net_data.tlvs_mut()[dst_index] else {
            return Ok(());
        };
        if tlv_missing {
            dst_prefix
                .sub_tlvs_mut()
                .push(PrefixSubTlv::HasRoute(HasRouteTlv::new(stable, vec![])));
        }
        if let Some(has_route) = dst_prefix.find_has_route_mut(stable) {
            has_route.entries_mut().push(*entry);
        }
        flags.update(stable);
        Ok(())
    }

    fn add_border_router(
        &mut self,
        dst_index: usize,
        src: &BorderRouterTlv,
        flags: &mut ChangedFlags,
    ) -> Result<(), Error> {
        let Some(entry) = src.entries().first() else {
            return Ok(());
        };
        let stable = src.is_stable();

        let (context_missing, context_id, tlv_missing, entry_present, prefix_length) = {
            let NetworkDataTlv::Prefix(dst_prefix) = &self.net_data.tlvs()[dst_index] else {
                return Ok(());
            };
            // Reserve a Context ID up front so an exhausted table fails
            // the whole operation before any sub-TLV is created.
            let (context_missing, context_id) = match dst_prefix.find_context() {
                Some(context) => (false, context.context_id()),
                None => (true, self.context_ids.get_unallocated().ok_or(Error::NoBufs)?),
            };
            let (tlv_missing, entry_present) = match dst_prefix.find_border_router(stable) {
                Some(border_router) => (false, border_router.entries().contains(entry)),
                None => (true, false),
            };
            (
                context_missing,
                context_id,
                tlv_missing,
                entry_present,
                dst_prefix.prefix().prefix_len(),
            )
        };

        if tlv_missing {
            let size = TLV_HEADER_SIZE
                + BorderRouterEntry::WIRE_SIZE
                + if context_missing { ContextTlv::WIRE_SIZE } else { 0 };
            if !self.can_insert(size) {
                return Err(Error::NoBufs);
            }
        }
        if context_missing
            && !self.can_insert(BorderRouterEntry::WIRE_SIZE + ContextTlv::WIRE_SIZE)
        {
            return Err(Error::NoBufs);
        }

        {
            let Self {
                net_data,
                context_ids,
                ..
            } = self;
            let NetworkDataTlv::Prefix(dst_prefix) = &mut net_data.tlvs_mut()[dst_index] else {
                return Ok(());
            };
            if tlv_missing {
                dst_prefix
                    .sub_tlvs_mut()
                    .push(PrefixSubTlv::BorderRouter(BorderRouterTlv::new(
                        stable,
                        vec![],
                    )));
            }
            if context_missing {
                dst_prefix.sub_tlvs_mut().push(PrefixSubTlv::Context(ContextTlv::new(
                    false,
                    false,
                    context_id,
                    prefix_length,
                )));
            }
            if let Some(context) = dst_prefix.find_context_mut() {
                if stable {
                    context.set_stable(true);
                }
                context.set_compress(true);
                context_ids.mark_in_use(context.context_id());
            }
        }

        if entry_present {
            return Ok(());
        }
        if !self.can_insert(BorderRouterEntry::WIRE_SIZE) {
            return Err(Error::NoBufs);
        }

        let NetworkDataTlv::Prefix(dst_prefix) = &mut self.net_data.tlvs_mut()[dst_index] else {
            return Ok(());
        };
        if let Some(border_router) = dst_prefix.find_border_router_mut(stable) {
            border_router.entries_mut().push(*entry);
        }
        flags.update(stable);
        Ok(())
    }

    fn add_service(&mut self, src: &ServiceTlv, flags: &mut ChangedFlags) -> Result<(), Error> {
        let dst_index = match self.find_service_index(src.enterprise_number(), src.service_data())
        {
            Some(index) => index,
            None => {
                let service_id = self.allocate_service_id()?;
                let size = TLV_HEADER_SIZE
                    + 1
                    + if src.uses_thread_enterprise() { 0 } else { 4 }
                    + 1
                    + src.service_data().len();
                if !self.can_insert(size) {
                    return Err(Error::NoBufs);
                }
                self.net_data.tlvs_mut().push(NetworkDataTlv::Service(ServiceTlv::new(
                    false,
                    service_id,
                    src.enterprise_number(),
                    src.service_data().to_vec(),
                    vec![],
                )));
                self.net_data.tlvs().len() - 1
            }
        };

        let result = match src.servers().next() {
            Some(server) => self.add_server(dst_index, server, flags),
            None => Ok(()),
        };

        // Recomputes the stable flag, and drops the service again if the
        // server could not be added under it.
        update_parent(self.net_data.tlvs_mut(), dst_index);
        result
    }

    fn add_server(
        &mut self,
        dst_index: usize,
        src: &ServerTlv,
        flags: &mut ChangedFlags,
    ) -> Result<(), Error> {
        let server_present = {
            let NetworkDataTlv::Service(dst_service) = &self.net_data.tlvs()[dst_index] else {
                return Ok(());
            };
            dst_service.servers().any(|server| server == src)
        };
        if server_present {
            return Ok(());
        }
        if !self.can_insert(src.wire_size()) {
            return Err(Error::NoBufs);
        }

        let NetworkDataTlv::Service(dst_service) = &mut self.net_data.tlvs_mut()[dst_index] else {
            return Ok(());
        };
        dst_service
            .sub_tlvs_mut()
            .push(ServiceSubTlv::Server(src.clone()));
        flags.update(src.is_stable());
        Ok(())
    }

    fn allocate_service_id(&self) -> Result<u8, Error> {
        if self.is_clone {
            return Ok(MIN_SERVICE_ID);
        }
        for service_id in MIN_SERVICE_ID..=MAX_SERVICE_ID {
            if self.find_service_by_id(service_id).is_none() {
                info!("allocated service id {service_id}");
                return Ok(service_id);
            }
        }
        Err(Error::NoBufs)
    }

    // Removal engine.

    /// Removes entries matching `rloc16` under `match_mode`, except those
    /// that `exclude` still carries under the same TLV and stable flag.
    fn remove_rloc(
        &mut self,
        rloc16: u16,
        match_mode: MatchMode,
        exclude: Option<&NetworkData>,
        flags: &mut ChangedFlags,
        host: &mut impl LeaderHost,
    ) {
        let Self {
            net_data,
            context_ids,
            ..
        } = self;
        let tlvs = net_data.tlvs_mut();
        let mut index = 0;
        while index < tlvs.len() {
            match &mut tlvs[index] {
                NetworkDataTlv::Prefix(prefix) => {
                    let exclude_prefix = exclude.and_then(|net| net.find_prefix(prefix.prefix()));
                    remove_rloc_in_prefix(
                        prefix,
                        rloc16,
                        match_mode,
                        exclude_prefix,
                        flags,
                        context_ids,
                        host,
                    );
                }
                NetworkDataTlv::Service(service) => {
                    let exclude_service = exclude.and_then(|net| {
                        net.find_service(service.enterprise_number(), service.service_data())
                    });
                    remove_rloc_in_service(service, rloc16, match_mode, exclude_service, flags);
                }
                _ => {
                    index += 1;
                    continue;
                }
            }
            if update_parent(tlvs, index) == UpdateStatus::TlvRemoved {
                // Do not advance when the TLV is removed.
                continue;
            }
            index += 1;
        }
    }
}

/// Removes `rloc16`-matching entries inside one Prefix TLV, then settles
/// its Context TLV: compression stays on only while a Border Router
/// remains; otherwise the Context ID enters its reuse-delay window.
fn remove_rloc_in_prefix(
    prefix: &mut PrefixTlv,
    rloc16: u16,
    match_mode: MatchMode,
    exclude_prefix: Option<&PrefixTlv>,
    flags: &mut ChangedFlags,
    context_ids: &mut ContextIds,
    host: &mut impl LeaderHost,
) {
    let sub_tlvs = prefix.sub_tlvs_mut();
    let mut index = 0;
    while index < sub_tlvs.len() {
        match &mut sub_tlvs[index] {
            PrefixSubTlv::HasRoute(has_route) => {
                let stable = has_route.is_stable();
                has_route.entries_mut().retain(|entry| {
                    let removed = match_mode.matches(entry.rloc16(), rloc16)
                        && !exclude_has_route_entry(exclude_prefix, stable, entry);
                    if removed {
                        flags.update(stable);
                    }
                    !removed
                });
                if has_route.entries().is_empty() {
                    sub_tlvs.remove(index);
                    continue;
                }
            }
            PrefixSubTlv::BorderRouter(border_router) => {
                let stable = border_router.is_stable();
                border_router.entries_mut().retain(|entry| {
                    let removed = match_mode.matches(entry.rloc16(), rloc16)
                        && !exclude_border_router_entry(exclude_prefix, stable, entry);
                    if removed {
                        flags.update(stable);
                    }
                    !removed
                });
                if border_router.entries().is_empty() {
                    sub_tlvs.remove(index);
                    continue;
                }
            }
            _ => {}
        }
        index += 1;
    }

    let has_border_router = prefix.has_border_router();
    if let Some(context) = prefix.find_context_mut() {
        if has_border_router {
            context.set_compress(true);
            context_ids.mark_in_use(context.context_id());
        } else {
            context.set_compress(false);
            context_ids.schedule_to_remove(context.context_id(), host);
        }
    }
}

fn exclude_has_route_entry(
    exclude_prefix: Option<&PrefixTlv>,
    stable: bool,
    entry: &HasRouteEntry,
) -> bool {
    exclude_prefix
        .and_then(|prefix| prefix.find_has_route(stable))
        .is_some_and(|has_route| has_route.entries().contains(entry))
}

fn exclude_border_router_entry(
    exclude_prefix: Option<&PrefixTlv>,
    stable: bool,
    entry: &BorderRouterEntry,
) -> bool {
    exclude_prefix
        .and_then(|prefix| prefix.find_border_router(stable))
        .is_some_and(|border_router| border_router.entries().contains(entry))
}

/// Removes `rloc16`-matching Server sub-TLVs inside one Service TLV.
fn remove_rloc_in_service(
    service: &mut ServiceTlv,
    rloc16: u16,
    match_mode: MatchMode,
    exclude_service: Option<&ServiceTlv>,
    flags: &mut ChangedFlags,
) {
    let sub_tlvs = service.sub_tlvs_mut();
    let mut index = 0;
    while index < sub_tlvs.len() {
        if let ServiceSubTlv::Server(server) = &sub_tlvs[index] {
            let excluded = exclude_service
                .is_some_and(|excluded| excluded.servers().any(|candidate| candidate == server));
            if match_mode.matches(server.server16(), rloc16) && !excluded {
                flags.update(server.is_stable());
                sub_tlvs.remove(index);
                continue;
            }
        }
        index += 1;
    }
}

/// After editing a Prefix or Service TLV's sub-TLVs: removes the TLV when
/// no sub-TLV remains, otherwise recomputes its stable flag from them.
fn update_parent(tlvs: &mut Vec<NetworkDataTlv>, index: usize) -> UpdateStatus {
    let (is_empty, stable) = match &tlvs[index] {
        NetworkDataTlv::Prefix(prefix) => (
            prefix.sub_tlvs().is_empty(),
            prefix.sub_tlvs().iter().any(PrefixSubTlv::is_stable),
        ),
        NetworkDataTlv::Service(service) => (
            service.sub_tlvs().is_empty(),
            service.sub_tlvs().iter().any(ServiceSubTlv::is_stable),
        ),
        _ => return UpdateStatus::TlvUpdated,
    };

    if is_empty {
        tlvs.remove(index);
        return UpdateStatus::TlvRemoved;
    }

    match &mut tlvs[index] {
        NetworkDataTlv::Prefix(prefix) => prefix.set_stable(stable),
        NetworkDataTlv::Service(service) => service.set_stable(stable),
        _ => {}
    }
    UpdateStatus::TlvUpdated
}
