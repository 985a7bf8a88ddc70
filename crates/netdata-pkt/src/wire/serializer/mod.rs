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

//! Serializer library for the Thread Network Data wire protocol

use crate::{
    iana::NetworkDataTlvType, BorderRouterEntry, BorderRouterTlv, CommissioningDataTlv,
    ContextTlv, HasRouteEntry, HasRouteTlv, NetworkData, NetworkDataTlv, PrefixSubTlv, PrefixTlv,
    ServerTlv, ServiceSubTlv, ServiceTlv, UnknownTlv, TLV_HEADER_SIZE,
};
use byteorder::{NetworkEndian, WriteBytesExt};
use netgauze_parse_utils::WritablePdu;
use netgauze_serde_macros::WritingError;
use std::io::Write;

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum TlvHeaderWritingError {
    StdIOError(#[from_std_io_error] String),
    /// TLV value does not fit the one-octet length field.
    ValueTooLong(usize),
}

/// Writes the two-octet (type, stable, length) header common to every
/// Network Data TLV.
pub fn write_tlv_header<T: Write>(
    writer: &mut T,
    type_value: u8,
    stable: bool,
    value_len: usize,
) -> Result<(), TlvHeaderWritingError> {
    if value_len > usize::from(u8::MAX) {
        return Err(TlvHeaderWritingError::ValueTooLong(value_len));
    }
    writer.write_u8(type_value << 1 | u8::from(stable))?;
    writer.write_u8(value_len as u8)?;
    Ok(())
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum NetworkDataWritingError {
    StdIOError(#[from_std_io_error] String),
    TlvError(#[from] NetworkDataTlvWritingError),
}

impl WritablePdu<NetworkDataWritingError> for NetworkData {
    const BASE_LENGTH: usize = 0;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), NetworkDataWritingError> {
        for tlv in self.tlvs() {
            tlv.write(writer)?;
        }
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum NetworkDataTlvWritingError {
    StdIOError(#[from_std_io_error] String),
    PrefixError(#[from] PrefixWritingError),
    ServiceError(#[from] ServiceWritingError),
    CommissioningDataError(#[from] CommissioningDataWritingError),
    UnknownError(#[from] UnknownTlvWritingError),
}

impl WritablePdu<NetworkDataTlvWritingError> for NetworkDataTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), NetworkDataTlvWritingError> {
        match self {
            Self::Prefix(prefix) => prefix.write(writer)?,
            Self::Service(service) => service.write(writer)?,
            Self::CommissioningData(data) => data.write(writer)?,
            Self::Unknown(unknown) => unknown.write(writer)?,
        }
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum PrefixWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
    SubTlvError(#[from] PrefixSubTlvWritingError),
}

impl WritablePdu<PrefixWritingError> for PrefixTlv {
    /// 2-octet header, 1-octet domain id, 1-octet prefix length
    const BASE_LENGTH: usize = TLV_HEADER_SIZE + 2;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), PrefixWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::Prefix.into(),
            self.is_stable(),
            self.len() - TLV_HEADER_SIZE,
        )?;
        writer.write_u8(self.domain_id())?;
        writer.write_u8(self.prefix().prefix_len())?;
        writer.write_all(&self.prefix().addr().octets()[..self.prefix_wire_len()])?;
        for sub_tlv in self.sub_tlvs() {
            sub_tlv.write(writer)?;
        }
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum PrefixSubTlvWritingError {
    StdIOError(#[from_std_io_error] String),
    HasRouteError(#[from] HasRouteWritingError),
    BorderRouterError(#[from] BorderRouterWritingError),
    ContextError(#[from] ContextWritingError),
    UnknownError(#[from] UnknownTlvWritingError),
}

impl WritablePdu<PrefixSubTlvWritingError> for PrefixSubTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), PrefixSubTlvWritingError> {
        match self {
            Self::HasRoute(has_route) => has_route.write(writer)?,
            Self::BorderRouter(border_router) => border_router.write(writer)?,
            Self::Context(context) => context.write(writer)?,
            Self::Unknown(unknown) => unknown.write(writer)?,
        }
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum HasRouteWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
}

impl WritablePdu<HasRouteWritingError> for HasRouteTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), HasRouteWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::HasRoute.into(),
            self.is_stable(),
            self.len() - TLV_HEADER_SIZE,
        )?;
        for entry in self.entries() {
            entry.write(writer)?;
        }
        Ok(())
    }
}

impl WritablePdu<HasRouteWritingError> for HasRouteEntry {
    /// 2-octet RLOC16, 1-octet flags
    const BASE_LENGTH: usize = HasRouteEntry::WIRE_SIZE;

    fn len(&self) -> usize {
        Self::BASE_LENGTH
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), HasRouteWritingError> {
        writer.write_u16::<NetworkEndian>(self.rloc16())?;
        writer.write_u8(self.flags())?;
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum BorderRouterWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
}

impl WritablePdu<BorderRouterWritingError> for BorderRouterTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), BorderRouterWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::BorderRouter.into(),
            self.is_stable(),
            self.len() - TLV_HEADER_SIZE,
        )?;
        for entry in self.entries() {
            entry.write(writer)?;
        }
        Ok(())
    }
}

impl WritablePdu<BorderRouterWritingError> for BorderRouterEntry {
    /// 2-octet RLOC16, 2-octet flags
    const BASE_LENGTH: usize = BorderRouterEntry::WIRE_SIZE;

    fn len(&self) -> usize {
        Self::BASE_LENGTH
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), BorderRouterWritingError> {
        writer.write_u16::<NetworkEndian>(self.rloc16())?;
        writer.write_u16::<NetworkEndian>(self.flags())?;
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum ContextWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
}

impl WritablePdu<ContextWritingError> for ContextTlv {
    /// 2-octet header, compress/context-id octet, context-length octet
    const BASE_LENGTH: usize = ContextTlv::WIRE_SIZE;

    fn len(&self) -> usize {
        Self::BASE_LENGTH
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), ContextWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::Context.into(),
            self.is_stable(),
            self.len() - TLV_HEADER_SIZE,
        )?;
        writer.write_u8(u8::from(self.is_compress()) << 4 | (self.context_id() & 0x0f))?;
        writer.write_u8(self.context_length())?;
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum ServiceWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
    SubTlvError(#[from] ServiceSubTlvWritingError),
}

impl WritablePdu<ServiceWritingError> for ServiceTlv {
    /// 2-octet header, T/service-id octet, 1-octet service data length
    const BASE_LENGTH: usize = TLV_HEADER_SIZE + 2;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), ServiceWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::Service.into(),
            self.is_stable(),
            self.len() - TLV_HEADER_SIZE,
        )?;
        let thread_enterprise_flag = u8::from(self.uses_thread_enterprise()) << 7;
        writer.write_u8(thread_enterprise_flag | (self.service_id() & 0x0f))?;
        if !self.uses_thread_enterprise() {
            writer.write_u32::<NetworkEndian>(self.enterprise_number())?;
        }
        writer.write_u8(self.service_data().len() as u8)?;
        writer.write_all(self.service_data())?;
        for sub_tlv in self.sub_tlvs() {
            sub_tlv.write(writer)?;
        }
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum ServiceSubTlvWritingError {
    StdIOError(#[from_std_io_error] String),
    ServerError(#[from] ServerWritingError),
    UnknownError(#[from] UnknownTlvWritingError),
}

impl WritablePdu<ServiceSubTlvWritingError> for ServiceSubTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), ServiceSubTlvWritingError> {
        match self {
            Self::Server(server) => server.write(writer)?,
            Self::Unknown(unknown) => unknown.write(writer)?,
        }
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum ServerWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
}

impl WritablePdu<ServerWritingError> for ServerTlv {
    /// 2-octet header, 2-octet server RLOC16
    const BASE_LENGTH: usize = TLV_HEADER_SIZE + 2;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), ServerWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::Server.into(),
            self.is_stable(),
            self.len() - TLV_HEADER_SIZE,
        )?;
        writer.write_u16::<NetworkEndian>(self.server16())?;
        writer.write_all(self.server_data())?;
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum CommissioningDataWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
}

impl WritablePdu<CommissioningDataWritingError> for CommissioningDataTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), CommissioningDataWritingError> {
        write_tlv_header(
            writer,
            NetworkDataTlvType::CommissioningData.into(),
            self.is_stable(),
            self.data().len(),
        )?;
        writer.write_all(self.data())?;
        Ok(())
    }
}

#[derive(WritingError, Eq, PartialEq, Clone, Debug)]
pub enum UnknownTlvWritingError {
    StdIOError(#[from_std_io_error] String),
    HeaderError(#[from] TlvHeaderWritingError),
}

impl WritablePdu<UnknownTlvWritingError> for UnknownTlv {
    const BASE_LENGTH: usize = TLV_HEADER_SIZE;

    fn len(&self) -> usize {
        self.wire_size()
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), UnknownTlvWritingError> {
        write_tlv_header(writer, self.type_value(), self.is_stable(), self.value().len())?;
        writer.write_all(self.value())?;
        Ok(())
    }
}
