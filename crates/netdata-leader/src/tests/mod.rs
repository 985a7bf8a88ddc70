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

use crate::{router_id, Leader, LeaderConfig, LeaderHost};
use ipnet::Ipv6Net;
use std::time::{Duration, Instant};
use thread_netdata_pkt::{
    iana::RoutePreference, BorderRouterEntry, BorderRouterTlv, HasRouteEntry, HasRouteTlv,
    NetworkData, NetworkDataTlv, PrefixSubTlv, PrefixTlv, ServerTlv, ServiceSubTlv, ServiceTlv,
    MAX_NETWORK_DATA_SIZE,
};

mod reconciliation;
mod removal;

/// Test double for every collaborator of the Leader.
#[derive(Debug)]
pub(crate) struct MockHost {
    pub(crate) now: Instant,
    pub(crate) leader: bool,
    pub(crate) rloc16: u16,
    pub(crate) allocated_router_ids: Vec<u16>,
    pub(crate) net_data_changed_signals: usize,
    pub(crate) net_data_full_signals: usize,
    pub(crate) detached: bool,
    pub(crate) timer_deadline: Option<Instant>,
}

impl MockHost {
    pub(crate) fn new() -> Self {
        Self {
            now: Instant::now(),
            leader: true,
            rloc16: 0x5000,
            allocated_router_ids: vec![],
            net_data_changed_signals: 0,
            net_data_full_signals: 0,
            detached: false,
            timer_deadline: None,
        }
    }

    /// Marks the router id owning `rloc16` as allocated.
    pub(crate) fn allow_router(mut self, rloc16: u16) -> Self {
        self.allocated_router_ids.push(router_id(rloc16));
        self
    }

    pub(crate) fn forget_router(&mut self, rloc16: u16) {
        self.allocated_router_ids
            .retain(|&id| id != router_id(rloc16));
    }

    pub(crate) fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl LeaderHost for MockHost {
    fn now(&self) -> Instant {
        self.now
    }

    fn is_router_allocated(&self, router_id: u16) -> bool {
        self.allocated_router_ids.contains(&router_id)
    }

    fn is_leader(&self) -> bool {
        self.leader
    }

    fn rloc16(&self) -> u16 {
        self.rloc16
    }

    fn become_detached(&mut self) {
        self.detached = true;
    }

    fn signal_net_data_changed(&mut self) {
        self.net_data_changed_signals += 1;
    }

    fn signal_net_data_full(&mut self) {
        self.net_data_full_signals += 1;
    }

    fn timer_start(&mut self, duration: Duration) {
        self.timer_deadline = Some(self.now + duration);
    }

    fn timer_fire_at(&mut self, deadline: Instant) {
        self.timer_deadline = Some(deadline);
    }

    fn timer_fire_at_if_earlier(&mut self, deadline: Instant) {
        match self.timer_deadline {
            Some(current) if current <= deadline => {}
            _ => self.timer_deadline = Some(deadline),
        }
    }
}

pub(crate) fn new_leader() -> Leader {
    Leader::new(&LeaderConfig::default())
}

pub(crate) fn net(prefix: &str) -> Ipv6Net {
    prefix.parse().unwrap()
}

pub(crate) fn registry_bytes(leader: &Leader) -> Vec<u8> {
    leader.to_wire_bytes().unwrap()
}

pub(crate) const BR_FLAGS: u16 = BorderRouterEntry::FLAG_PREFERRED
    | BorderRouterEntry::FLAG_SLAAC
    | BorderRouterEntry::FLAG_DEFAULT_ROUTE;

/// One stable on-mesh prefix with a single border router entry, the shape
/// a border router submits when registering.
pub(crate) fn border_router_net(prefix: &str, rloc16: u16) -> NetworkData {
    NetworkData::new(vec![NetworkDataTlv::Prefix(PrefixTlv::new(
        0,
        net(prefix),
        true,
        vec![PrefixSubTlv::BorderRouter(BorderRouterTlv::new(
            true,
            vec![BorderRouterEntry::new(rloc16, BR_FLAGS)],
        ))],
    ))])
}

/// One non-stable external route under a prefix.
pub(crate) fn has_route_net(prefix: &str, rloc16: u16) -> NetworkData {
    NetworkData::new(vec![NetworkDataTlv::Prefix(PrefixTlv::new(
        0,
        net(prefix),
        false,
        vec![PrefixSubTlv::HasRoute(HasRouteTlv::new(
            false,
            vec![HasRouteEntry::new(rloc16, RoutePreference::Medium)],
        ))],
    ))])
}

/// One stable service registration with a single server.
pub(crate) fn service_net(enterprise_number: u32, service_data: &[u8], rloc16: u16) -> NetworkData {
    NetworkData::new(vec![NetworkDataTlv::Service(ServiceTlv::new(
        true,
        0,
        enterprise_number,
        service_data.to_vec(),
        vec![ServiceSubTlv::Server(ServerTlv::new(true, rloc16, vec![]))],
    ))])
}

/// Structural invariants that must hold after every public operation.
pub(crate) fn assert_invariants(leader: &Leader) {
    let data = leader.network_data();

    assert!(
        data.wire_size() <= MAX_NETWORK_DATA_SIZE,
        "registry exceeds {MAX_NETWORK_DATA_SIZE} octets"
    );

    let prefixes = data.prefixes().collect::<Vec<_>>();
    for (index, prefix) in prefixes.iter().enumerate() {
        assert!(
            !prefixes[..index]
                .iter()
                .any(|other| other.prefix() == prefix.prefix()),
            "duplicate prefix {}",
            prefix.prefix()
        );
        assert!(!prefix.sub_tlvs().is_empty(), "empty prefix TLV");
        assert_eq!(
            prefix.is_stable(),
            prefix.sub_tlvs().iter().any(PrefixSubTlv::is_stable),
            "prefix stable flag out of sync"
        );

        for sub_tlv in prefix.sub_tlvs() {
            match sub_tlv {
                PrefixSubTlv::HasRoute(has_route) => {
                    let entries = has_route.entries();
                    for (i, entry) in entries.iter().enumerate() {
                        assert!(!entries[..i].contains(entry), "duplicate has-route entry");
                    }
                }
                PrefixSubTlv::BorderRouter(border_router) => {
                    let entries = border_router.entries();
                    for (i, entry) in entries.iter().enumerate() {
                        assert!(!entries[..i].contains(entry), "duplicate border-router entry");
                    }
                }
                _ => {}
            }
        }

        if prefix.has_border_router() {
            let context = prefix
                .find_context()
                .expect("prefix with border router lacks a context");
            assert!(context.is_compress());
            assert!(leader.context_id_in_use(context.context_id()));
        } else if let Some(context) = prefix.find_context() {
            assert!(!context.is_compress());
        }
    }

    let services = data.services().collect::<Vec<_>>();
    for (index, service) in services.iter().enumerate() {
        assert!(
            !services[..index]
                .iter()
                .any(|other| other.matches(service.enterprise_number(), service.service_data())),
            "duplicate service TLV"
        );
        assert!(!service.sub_tlvs().is_empty(), "empty service TLV");
        assert_eq!(
            service.is_stable(),
            service.sub_tlvs().iter().any(ServiceSubTlv::is_stable),
            "service stable flag out of sync"
        );
    }
}
