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

//! Code registries for the Thread Network Data and MeshCoP TLV families.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, FromRepr};

/// Network Data TLV types. Top-level TLVs and sub-TLVs share one number
/// space; the type occupies the upper seven bits of the first header octet
/// and the low bit carries the stable flag.
#[repr(u8)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NetworkDataTlvType {
    HasRoute = 0,
    Prefix = 1,
    BorderRouter = 2,
    Context = 3,
    CommissioningData = 4,
    Service = 5,
    Server = 6,
}

/// Network Data TLV type is not one of [`NetworkDataTlvType`]; the carried
/// value is the undefined code.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedNetworkDataTlvType(pub u8);

impl From<NetworkDataTlvType> for u8 {
    fn from(value: NetworkDataTlvType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for NetworkDataTlvType {
    type Error = UndefinedNetworkDataTlvType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedNetworkDataTlvType(value)),
        }
    }
}

/// MeshCoP TLV types appearing in Commissioning Data and in the
/// MGMT_COMMISSIONER_SET/GET exchanges. Only the types this crate needs to
/// recognize are listed; every other code is carried opaquely.
#[repr(u8)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MeshcopTlvType {
    SteeringData = 8,
    BorderAgentLocator = 9,
    CommissionerId = 10,
    CommissionerSessionId = 11,
    Get = 13,
    State = 16,
    JoinerUdpPort = 18,
}

/// MeshCoP TLV type is not one of [`MeshcopTlvType`], the carried value is
/// the undefined code.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UndefinedMeshcopTlvType(pub u8);

impl From<MeshcopTlvType> for u8 {
    fn from(value: MeshcopTlvType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for MeshcopTlvType {
    type Error = UndefinedMeshcopTlvType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match Self::from_repr(value) {
            Some(val) => Ok(val),
            None => Err(UndefinedMeshcopTlvType(value)),
        }
    }
}

/// Values of the MeshCoP State TLV carried in MGMT responses.
#[repr(i8)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MeshcopState {
    Reject = -1,
    Pending = 0,
    Accept = 1,
}

impl From<MeshcopState> for u8 {
    fn from(value: MeshcopState) -> Self {
        value as i8 as u8
    }
}

/// Two-bit signed route preference used by Has Route and Border Router
/// entries. The wire value `0b10` is reserved.
#[repr(u8)]
#[derive(Display, FromRepr, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum RoutePreference {
    Medium = 0,
    High = 1,
    Reserved = 2,
    Low = 3,
}
