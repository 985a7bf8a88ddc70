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

#![deny(clippy::upper_case_acronyms)]
#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unreachable_pub)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(clippy::clone_on_ref_ptr)]

use crate::iana::{NetworkDataTlvType, RoutePreference};
use ipnet::Ipv6Net;
use serde::{Deserialize, Serialize};

pub mod iana;
pub mod meshcop;
pub mod wire;

/// Maximum serialized size of the Thread Network Data, in bytes.
pub const MAX_NETWORK_DATA_SIZE: usize = 254;

/// Enterprise number assigned to the Thread Group; Service TLVs carrying it
/// are encoded in the short form (`T` bit set, no explicit enterprise
/// number field).
pub const THREAD_ENTERPRISE_NUMBER: u32 = 44970;

/// Size of the two-octet (type, length) header shared by all Network Data
/// TLVs.
pub const TLV_HEADER_SIZE: usize = 2;

/// A full Thread Network Data set: a sequence of top-level TLVs in wire
/// order.
///
/// The serialized representation (see [`crate::wire`]) is the canonical
/// form; lookups and equality on the typed tree mirror byte-level
/// comparisons of that form.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    tlvs: Vec<NetworkDataTlv>,
}

impl NetworkData {
    pub const fn new(tlvs: Vec<NetworkDataTlv>) -> Self {
        Self { tlvs }
    }

    pub fn tlvs(&self) -> &[NetworkDataTlv] {
        &self.tlvs
    }

    pub fn tlvs_mut(&mut self) -> &mut Vec<NetworkDataTlv> {
        &mut self.tlvs
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &PrefixTlv> {
        self.tlvs.iter().filter_map(|tlv| match tlv {
            NetworkDataTlv::Prefix(prefix) => Some(prefix),
            _ => None,
        })
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceTlv> {
        self.tlvs.iter().filter_map(|tlv| match tlv {
            NetworkDataTlv::Service(service) => Some(service),
            _ => None,
        })
    }

    /// First Prefix TLV matching `prefix` by (prefix length, prefix bits).
    pub fn find_prefix(&self, prefix: &Ipv6Net) -> Option<&PrefixTlv> {
        self.prefixes().find(|p| p.prefix() == prefix)
    }

    /// First Service TLV matching (enterprise number, service data) exactly.
    pub fn find_service(
        &self,
        enterprise_number: u32,
        service_data: &[u8],
    ) -> Option<&ServiceTlv> {
        self.services()
            .find(|s| s.matches(enterprise_number, service_data))
    }

    /// Serialized size of the whole set, in bytes.
    pub fn wire_size(&self) -> usize {
        self.tlvs.iter().map(NetworkDataTlv::wire_size).sum()
    }
}

/// A top-level Network Data TLV.
///
/// ```text
///  0                   1
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type    |S|    Length     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            Value ...
/// +-+-+-+-+-+-+-+-
/// ```
///
/// The low bit of the first octet is the *stable* flag; the TLV type
/// occupies the remaining seven bits.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum NetworkDataTlv {
    Prefix(PrefixTlv),
    Service(ServiceTlv),
    CommissioningData(CommissioningDataTlv),
    Unknown(UnknownTlv),
}

impl NetworkDataTlv {
    pub const fn is_stable(&self) -> bool {
        match self {
            Self::Prefix(prefix) => prefix.is_stable(),
            Self::Service(service) => service.is_stable(),
            Self::CommissioningData(data) => data.is_stable(),
            Self::Unknown(unknown) => unknown.is_stable(),
        }
    }

    /// Raw value of the seven-bit type field.
    pub const fn type_value(&self) -> u8 {
        match self {
            Self::Prefix(_) => NetworkDataTlvType::Prefix as u8,
            Self::Service(_) => NetworkDataTlvType::Service as u8,
            Self::CommissioningData(_) => NetworkDataTlvType::CommissioningData as u8,
            Self::Unknown(unknown) => unknown.type_value(),
        }
    }

    pub fn wire_size(&self) -> usize {
        match self {
            Self::Prefix(prefix) => prefix.wire_size(),
            Self::Service(service) => service.wire_size(),
            Self::CommissioningData(data) => data.wire_size(),
            Self::Unknown(unknown) => unknown.wire_size(),
        }
    }
}

/// Prefix TLV: an on-mesh prefix with its route, border-router, and
/// 6LoWPAN-context sub-TLVs.
///
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Domain ID   | Prefix Length |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    Prefix (variable) ...      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    Sub-TLVs (variable) ...    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Prefix Length is in bits; `ceil(length / 8)` prefix octets follow it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrefixTlv {
    domain_id: u8,
    prefix: Ipv6Net,
    stable: bool,
    sub_tlvs: Vec<PrefixSubTlv>,
}

impl PrefixTlv {
    pub const fn new(
        domain_id: u8,
        prefix: Ipv6Net,
        stable: bool,
        sub_tlvs: Vec<PrefixSubTlv>,
    ) -> Self {
        Self {
            domain_id,
            prefix,
            stable,
            sub_tlvs,
        }
    }

    pub const fn domain_id(&self) -> u8 {
        self.domain_id
    }

    pub const fn prefix(&self) -> &Ipv6Net {
        &self.prefix
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn set_stable(&mut self, stable: bool) {
        self.stable = stable;
    }

    pub fn sub_tlvs(&self) -> &[PrefixSubTlv] {
        &self.sub_tlvs
    }

    pub fn sub_tlvs_mut(&mut self) -> &mut Vec<PrefixSubTlv> {
        &mut self.sub_tlvs
    }

    /// Number of prefix octets on the wire.
    pub fn prefix_wire_len(&self) -> usize {
        (usize::from(self.prefix.prefix_len()) + 7) / 8
    }

    pub fn find_has_route(&self, stable: bool) -> Option<&HasRouteTlv> {
        self.sub_tlvs.iter().find_map(|sub| match sub {
            PrefixSubTlv::HasRoute(has_route) if has_route.is_stable() == stable => Some(has_route),
            _ => None,
        })
    }

    pub fn find_has_route_mut(&mut self, stable: bool) -> Option<&mut HasRouteTlv> {
        self.sub_tlvs.iter_mut().find_map(|sub| match sub {
            PrefixSubTlv::HasRoute(has_route) if has_route.is_stable() == stable => Some(has_route),
            _ => None,
        })
    }

    pub fn find_border_router(&self, stable: bool) -> Option<&BorderRouterTlv> {
        self.sub_tlvs.iter().find_map(|sub| match sub {
            PrefixSubTlv::BorderRouter(border_router) if border_router.is_stable() == stable => {
                Some(border_router)
            }
            _ => None,
        })
    }

    pub fn find_border_router_mut(&mut self, stable: bool) -> Option<&mut BorderRouterTlv> {
        self.sub_tlvs.iter_mut().find_map(|sub| match sub {
            PrefixSubTlv::BorderRouter(border_router) if border_router.is_stable() == stable => {
                Some(border_router)
            }
            _ => None,
        })
    }

    pub fn has_border_router(&self) -> bool {
        self.sub_tlvs
            .iter()
            .any(|sub| matches!(sub, PrefixSubTlv::BorderRouter(_)))
    }

    pub fn find_context(&self) -> Option<&ContextTlv> {
        self.sub_tlvs.iter().find_map(|sub| match sub {
            PrefixSubTlv::Context(context) => Some(context),
            _ => None,
        })
    }

    pub fn find_context_mut(&mut self) -> Option<&mut ContextTlv> {
        self.sub_tlvs.iter_mut().find_map(|sub| match sub {
            PrefixSubTlv::Context(context) => Some(context),
            _ => None,
        })
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE
            + 2
            + self.prefix_wire_len()
            + self
                .sub_tlvs
                .iter()
                .map(PrefixSubTlv::wire_size)
                .sum::<usize>()
    }
}

/// A sub-TLV nested inside a Prefix TLV value.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum PrefixSubTlv {
    HasRoute(HasRouteTlv),
    BorderRouter(BorderRouterTlv),
    Context(ContextTlv),
    Unknown(UnknownTlv),
}

impl PrefixSubTlv {
    pub const fn is_stable(&self) -> bool {
        match self {
            Self::HasRoute(has_route) => has_route.is_stable(),
            Self::BorderRouter(border_router) => border_router.is_stable(),
            Self::Context(context) => context.is_stable(),
            Self::Unknown(unknown) => unknown.is_stable(),
        }
    }

    pub fn wire_size(&self) -> usize {
        match self {
            Self::HasRoute(has_route) => has_route.wire_size(),
            Self::BorderRouter(border_router) => border_router.wire_size(),
            Self::Context(context) => context.wire_size(),
            Self::Unknown(unknown) => unknown.wire_size(),
        }
    }
}

/// Has Route sub-TLV: off-mesh routes advertised under a prefix, one entry
/// per advertising router.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HasRouteTlv {
    stable: bool,
    entries: Vec<HasRouteEntry>,
}

impl HasRouteTlv {
    pub const fn new(stable: bool, entries: Vec<HasRouteEntry>) -> Self {
        Self { stable, entries }
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn entries(&self) -> &[HasRouteEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<HasRouteEntry> {
        &mut self.entries
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE + self.entries.len() * HasRouteEntry::WIRE_SIZE
    }
}

/// One Has Route entry.
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            R_border_router_16 |Prf| Reserved  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HasRouteEntry {
    rloc16: u16,
    flags: u8,
}

impl HasRouteEntry {
    pub const WIRE_SIZE: usize = 3;

    const PREFERENCE_OFFSET: u8 = 6;

    pub const fn new(rloc16: u16, preference: RoutePreference) -> Self {
        Self {
            rloc16,
            flags: (preference as u8) << Self::PREFERENCE_OFFSET,
        }
    }

    pub const fn rloc16(&self) -> u16 {
        self.rloc16
    }

    pub const fn flags(&self) -> u8 {
        self.flags
    }

    pub fn preference(&self) -> RoutePreference {
        // The two preference bits cover all `RoutePreference` variants.
        RoutePreference::from_repr(self.flags >> Self::PREFERENCE_OFFSET)
            .unwrap_or(RoutePreference::Medium)
    }
}

/// Border Router sub-TLV: border routers advertising external connectivity
/// under a prefix, one entry per router.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BorderRouterTlv {
    stable: bool,
    entries: Vec<BorderRouterEntry>,
}

impl BorderRouterTlv {
    pub const fn new(stable: bool, entries: Vec<BorderRouterEntry>) -> Self {
        Self { stable, entries }
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn entries(&self) -> &[BorderRouterEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<BorderRouterEntry> {
        &mut self.entries
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE + self.entries.len() * BorderRouterEntry::WIRE_SIZE
    }
}

/// One Border Router entry: a 16-bit locator followed by 16 bits of flags.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            P_border_router_16 |Prf|P|S|D|C|R|O|N|DP| Reserved  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BorderRouterEntry {
    rloc16: u16,
    flags: u16,
}

impl BorderRouterEntry {
    pub const WIRE_SIZE: usize = 4;

    /// Route preference (two-bit field).
    pub const FLAG_PREFERENCE: u16 = 0xc000;
    /// P: preferred for address autoconfiguration.
    pub const FLAG_PREFERRED: u16 = 0x2000;
    /// S: SLAAC allowed.
    pub const FLAG_SLAAC: u16 = 0x1000;
    /// D: DHCPv6 address configuration available.
    pub const FLAG_DHCP: u16 = 0x0800;
    /// C: DHCPv6 other-configuration available.
    pub const FLAG_CONFIGURE: u16 = 0x0400;
    /// R: default route through this border router.
    pub const FLAG_DEFAULT_ROUTE: u16 = 0x0200;
    /// O: prefix is on-mesh.
    pub const FLAG_ON_MESH: u16 = 0x0100;
    /// N: prefix hosts an ND-DNS server.
    pub const FLAG_ND_DNS: u16 = 0x0080;
    /// DP: prefix is a Thread Domain Prefix.
    pub const FLAG_DOMAIN_PREFIX: u16 = 0x0040;

    pub const fn new(rloc16: u16, flags: u16) -> Self {
        Self { rloc16, flags }
    }

    pub const fn rloc16(&self) -> u16 {
        self.rloc16
    }

    pub const fn flags(&self) -> u16 {
        self.flags
    }

    pub const fn is_preferred(&self) -> bool {
        self.flags & Self::FLAG_PREFERRED != 0
    }

    pub const fn is_slaac(&self) -> bool {
        self.flags & Self::FLAG_SLAAC != 0
    }

    pub const fn is_default_route(&self) -> bool {
        self.flags & Self::FLAG_DEFAULT_ROUTE != 0
    }

    pub const fn is_on_mesh(&self) -> bool {
        self.flags & Self::FLAG_ON_MESH != 0
    }
}

/// 6LoWPAN Context ID sub-TLV.
///
/// First value octet is `compress << 4 | context_id`, second is the context
/// length in bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContextTlv {
    stable: bool,
    compress: bool,
    context_id: u8,
    context_length: u8,
}

impl ContextTlv {
    pub const WIRE_SIZE: usize = TLV_HEADER_SIZE + 2;

    pub const fn new(stable: bool, compress: bool, context_id: u8, context_length: u8) -> Self {
        Self {
            stable,
            compress,
            context_id,
            context_length,
        }
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn set_stable(&mut self, stable: bool) {
        self.stable = stable;
    }

    pub const fn is_compress(&self) -> bool {
        self.compress
    }

    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    pub const fn context_id(&self) -> u8 {
        self.context_id
    }

    pub const fn context_length(&self) -> u8 {
        self.context_length
    }

    pub const fn wire_size(&self) -> usize {
        Self::WIRE_SIZE
    }
}

/// Service TLV: an application-level service registration keyed by
/// (enterprise number, service data).
///
/// The first value octet is `T << 7 | service_id`; when `T` is set the
/// enterprise number is [`THREAD_ENTERPRISE_NUMBER`] and carried
/// implicitly.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServiceTlv {
    stable: bool,
    service_id: u8,
    enterprise_number: u32,
    service_data: Vec<u8>,
    sub_tlvs: Vec<ServiceSubTlv>,
}

impl ServiceTlv {
    pub const fn new(
        stable: bool,
        service_id: u8,
        enterprise_number: u32,
        service_data: Vec<u8>,
        sub_tlvs: Vec<ServiceSubTlv>,
    ) -> Self {
        Self {
            stable,
            service_id,
            enterprise_number,
            service_data,
            sub_tlvs,
        }
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn set_stable(&mut self, stable: bool) {
        self.stable = stable;
    }

    pub const fn service_id(&self) -> u8 {
        self.service_id
    }

    pub const fn enterprise_number(&self) -> u32 {
        self.enterprise_number
    }

    pub fn service_data(&self) -> &[u8] {
        &self.service_data
    }

    pub const fn uses_thread_enterprise(&self) -> bool {
        self.enterprise_number == THREAD_ENTERPRISE_NUMBER
    }

    pub fn matches(&self, enterprise_number: u32, service_data: &[u8]) -> bool {
        self.enterprise_number == enterprise_number && self.service_data == service_data
    }

    pub fn sub_tlvs(&self) -> &[ServiceSubTlv] {
        &self.sub_tlvs
    }

    pub fn sub_tlvs_mut(&mut self) -> &mut Vec<ServiceSubTlv> {
        &mut self.sub_tlvs
    }

    pub fn servers(&self) -> impl Iterator<Item = &ServerTlv> {
        self.sub_tlvs.iter().filter_map(|sub| match sub {
            ServiceSubTlv::Server(server) => Some(server),
            _ => None,
        })
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE
            + 1
            + if self.uses_thread_enterprise() { 0 } else { 4 }
            + 1
            + self.service_data.len()
            + self
                .sub_tlvs
                .iter()
                .map(ServiceSubTlv::wire_size)
                .sum::<usize>()
    }
}

/// A sub-TLV nested inside a Service TLV value.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ServiceSubTlv {
    Server(ServerTlv),
    Unknown(UnknownTlv),
}

impl ServiceSubTlv {
    pub const fn is_stable(&self) -> bool {
        match self {
            Self::Server(server) => server.is_stable(),
            Self::Unknown(unknown) => unknown.is_stable(),
        }
    }

    pub fn wire_size(&self) -> usize {
        match self {
            Self::Server(server) => server.wire_size(),
            Self::Unknown(unknown) => unknown.wire_size(),
        }
    }
}

/// Server sub-TLV: one server offering the enclosing service.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServerTlv {
    stable: bool,
    server16: u16,
    server_data: Vec<u8>,
}

impl ServerTlv {
    pub const fn new(stable: bool, server16: u16, server_data: Vec<u8>) -> Self {
        Self {
            stable,
            server16,
            server_data,
        }
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub const fn server16(&self) -> u16 {
        self.server16
    }

    pub fn server_data(&self) -> &[u8] {
        &self.server_data
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE + 2 + self.server_data.len()
    }
}

/// Commissioning Data TLV: an opaque MeshCoP TLV sequence attached to the
/// Network Data (see [`crate::meshcop`]).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommissioningDataTlv {
    stable: bool,
    data: Vec<u8>,
}

impl CommissioningDataTlv {
    pub const fn new(data: Vec<u8>) -> Self {
        Self {
            stable: false,
            data,
        }
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE + self.data.len()
    }
}

/// A TLV whose type is not understood; the value octets are carried
/// verbatim so unknown TLVs survive a parse/write round trip.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UnknownTlv {
    type_value: u8,
    stable: bool,
    value: Vec<u8>,
}

impl UnknownTlv {
    pub const fn new(type_value: u8, stable: bool, value: Vec<u8>) -> Self {
        Self {
            type_value,
            stable,
            value,
        }
    }

    pub const fn type_value(&self) -> u8 {
        self.type_value
    }

    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn wire_size(&self) -> usize {
        TLV_HEADER_SIZE + self.value.len()
    }
}
