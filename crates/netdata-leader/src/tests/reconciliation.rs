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
        assert_invariants, border_router_net, net, new_leader, service_net, MockHost,
    },
    LeaderStartMode,
};
use std::time::Duration;
use thread_netdata_pkt::{iana::MeshcopState, NetworkData, THREAD_ENTERPRISE_NUMBER};

#[test]
fn test_submissions_rejected_while_waiting_for_sync() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400);

    leader.start(LeaderStartMode::RestoringLeaderRoleAfterReset, &mut host);
    assert!(leader.is_waiting_for_net_data_sync());
    assert!(host.timer_deadline.is_some());

    // Server data registrations are ignored (no ack) and commissioner
    // sets are rejected while waiting.
    let acked = leader.handle_server_data(
        0x0400,
        None,
        Some(&border_router_net("2001:db8::/64", 0x0400)),
        &mut host,
    );
    assert!(!acked);
    assert!(leader.network_data().tlvs().is_empty());
    assert_eq!(
        leader.handle_commissioner_set(&[], &mut host),
        Some(MeshcopState::Reject)
    );
}

#[test]
fn test_sync_timeout_detaches() {
    let mut leader = new_leader();
    let mut host = MockHost::new();

    leader.start(LeaderStartMode::RestoringLeaderRoleAfterReset, &mut host);
    host.advance(Duration::from_secs(61));
    leader.handle_timer(&mut host);

    assert!(host.detached);
}

#[test]
fn test_restored_data_sweeps_unallocated_router_ids() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400).allow_router(0x0800);

    // The registry as it looked before the reset: a service and a prefix
    // from 0x0400 (one submission carries both), plus a service from
    // 0x0800.
    let mut tlvs = service_net(THREAD_ENTERPRISE_NUMBER, &[0x01], 0x0400)
        .tlvs()
        .to_vec();
    tlvs.extend(border_router_net("2001:db8::/64", 0x0400).tlvs().to_vec());
    leader
        .register_network_data(0x0400, &NetworkData::new(tlvs), &mut host)
        .unwrap();
    leader
        .register_network_data(
            0x0800,
            &service_net(THREAD_ENTERPRISE_NUMBER, &[0x02], 0x0800),
            &mut host,
        )
        .unwrap();

    // Router 0x0800 lost its id across the reset.
    leader.start(LeaderStartMode::RestoringLeaderRoleAfterReset, &mut host);
    host.forget_router(0x0800);
    leader.handle_network_data_restored(&mut host);

    assert!(!leader.is_waiting_for_net_data_sync());
    let servers = leader.servers().map(|s| s.server16()).collect::<Vec<_>>();
    assert_eq!(servers, vec![0x0400]);
    assert!(leader.find_prefix(&net("2001:db8::/64")).is_some());
    assert_invariants(&leader);
}

#[test]
fn test_restored_data_reseeds_context_ids() {
    let mut leader = new_leader();
    let mut host = MockHost::new().allow_router(0x0400);

    leader
        .register_network_data(0x0400, &border_router_net("2001:db8::/64", 0x0400), &mut host)
        .unwrap();
    let context_id = leader
        .find_prefix(&net("2001:db8::/64"))
        .unwrap()
        .find_context()
        .unwrap()
        .context_id();

    // Simulate the reset: allocator state is lost, the registry comes
    // back from the mesh.
    let restored = leader.network_data().clone();
    let mut leader = new_leader();
    leader.restore_network_data(restored);

    leader.start(LeaderStartMode::RestoringLeaderRoleAfterReset, &mut host);
    leader.handle_network_data_restored(&mut host);

    assert!(leader.context_id_in_use(context_id));
    assert_invariants(&leader);
}
