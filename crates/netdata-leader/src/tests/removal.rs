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
    tests::{
        assert_invariants, border_router_net, net, new_leader, registry_bytes, service_net,
        MockHost,
    },
    LeaderConfig, MatchMode,
};
use std::time::Duration;
use thread_netdata_pkt::{NetworkData, THREAD_ENTERPRISE_NUMBER};

#[test]
fn test_empty_submission_sweeps_the_submitter() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400);

    leader
        .register_network_data(0x0400, &border_router_net("2001:db8::/64", 0x0400), &mut host)
        .unwrap();

    leader
        .register_network_data(0x0400, &NetworkData::default(), &mut host)
        .unwrap();

    // The border router entry is gone; the prefix lingers with its
    // decompressed context until the reuse delay expires.
    let prefix = leader.find_prefix(&net("2001:db8::/64")).unwrap();
    assert!(!prefix.has_border_router());
    let context = prefix.find_context().unwrap();
    assert!(!context.is_compress());
    assert!(host.timer_deadline.is_some());

    assert_eq!(leader.version(), 2);
    assert_eq!(leader.stable_version(), 2);
    assert_invariants(&leader);
}

#[test]
fn test_context_reclamation_returns_registry_to_prior_bytes() {
    let config = LeaderConfig {
        context_id_reuse_delay: Duration::from_secs(2),
        ..LeaderConfig::default()
    };
    let mut leader = crate::Leader::new(&config);
    let mut host = MockHost::new().allow_router(0x0400);

    let empty_bytes = registry_bytes(&leader);

    leader
        .register_network_data(0x0400, &border_router_net("2001:db8::/64", 0x0400), &mut host)
        .unwrap();
    leader
        .register_network_data(0x0400, &NetworkData::default(), &mut host)
        .unwrap();

    // Before the deadline the timer pass reclaims nothing.
    host.advance(Duration::from_secs(1));
    leader.handle_timer(&mut host);
    assert!(leader.find_prefix(&net("2001:db8::/64")).is_some());
    assert!(host.timer_deadline.is_some());

    host.advance(Duration::from_secs(2));
    leader.handle_timer(&mut host);

    assert_eq!(registry_bytes(&leader), empty_bytes);
    assert!(!leader.context_id_in_use(1));
    assert_invariants(&leader);

    // The reclaimed id is allocatable again.
    leader
        .register_network_data(0x0400, &border_router_net("2001:db8::/64", 0x0400), &mut host)
        .unwrap();
    let context = leader
        .find_prefix(&net("2001:db8::/64"))
        .unwrap()
        .find_context()
        .unwrap();
    assert_eq!(context.context_id(), 1);
    assert_invariants(&leader);
}

#[test]
fn test_reregistration_cancels_pending_context_removal() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400);

    leader
        .register_network_data(0x0400, &border_router_net("2001:db8::/64", 0x0400), &mut host)
        .unwrap();
    leader
        .register_network_data(0x0400, &NetworkData::default(), &mut host)
        .unwrap();

    // The border router comes back before the reuse delay expires; the
    // context is compressed and in use again.
    leader
        .register_network_data(0x0400, &border_router_net("2001:db8::/64", 0x0400), &mut host)
        .unwrap();

    let context = leader
        .find_prefix(&net("2001:db8::/64"))
        .unwrap()
        .find_context()
        .unwrap();
    assert!(context.is_compress());
    assert!(leader.context_id_in_use(context.context_id()));

    // A much later timer pass must not reclaim it.
    host.advance(Duration::from_secs(3600));
    leader.handle_timer(&mut host);
    assert!(leader.find_prefix(&net("2001:db8::/64")).is_some());
    assert_invariants(&leader);
}

#[test]
fn test_remove_border_router_by_router_id() {
    let mut leader = new_leader();
    // Two children of router 0x0400 and one foreign server.
    let mut host = MockHost::new().allow_router(0x0400).allow_router(0x0c00);
    leader
        .register_network_data(
            0x0401,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x01], 0x0401),
            &mut host,
        )
        .unwrap();
    leader
        .register_network_data(
            0x0402,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x02], 0x0402),
            &mut host,
        )
        .unwrap();
    leader
        .register_network_data(
            0x0c00,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x03], 0x0c00),
            &mut host,
        )
        .unwrap();

    leader.remove_border_router(0x0400, MatchMode::RouterId, &mut host);

    let servers = leader.servers().map(|s| s.server16()).collect::<Vec<_>>();
    assert_eq!(servers, vec![0x0c00]);
    assert_invariants(&leader);
}

#[test]
fn test_server_data_request_sweeps_then_registers() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400).allow_router(0x0800);

    leader
        .register_network_data(
            0x0800,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x01], 0x0800),
            &mut host,
        )
        .unwrap();

    // 0x0800 moved to 0x0400: its request names the old locator and
    // carries the data under the new one.
    let acked = leader.handle_server_data(
        0x0400,
        Some(0x0800),
        Some(&service_net(THREAD_ENTERPRISE_NUMBER, &[0x01], 0x0400)),
        &mut host,
    );

    assert!(acked);
    let servers = leader.servers().map(|s| s.server16()).collect::<Vec<_>>();
    assert_eq!(servers, vec![0x0400]);
    assert_invariants(&leader);

    // Not the leader: the request is ignored without an ack.
    host.leader = false;
    assert!(!leader.handle_server_data(0x0400, None, None, &mut host));
}

#[test]
fn test_remove_border_router_exact_match_spares_siblings() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400);

    leader
        .register_network_data(
            0x0401,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x01], 0x0401),
            &mut host,
        )
        .unwrap();
    leader
        .register_network_data(
            0x0402,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x02], 0x0402),
            &mut host,
        )
        .unwrap();

    leader.remove_border_router(0x0401, MatchMode::Rloc16, &mut host);

    let servers = leader.servers().map(|s| s.server16()).collect::<Vec<_>>();
    assert_eq!(servers, vec![0x0402]);
    assert_invariants(&leader);
}
