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

//! Deserializer library for the Thread Network Data wire protocol

use crate::{
    iana::NetworkDataTlvType, BorderRouterEntry, BorderRouterTlv, CommissioningDataTlv,
    ContextTlv, HasRouteEntry, HasRouteTlv, NetworkData, NetworkDataTlv, PrefixSubTlv, PrefixTlv,
    ServerTlv, ServiceSubTlv, ServiceTlv, UnknownTlv, THREAD_ENTERPRISE_NUMBER,
};
use ipnet::Ipv6Net;
use netgauze_parse_utils::{
    parse_into_located_one_input, parse_till_empty, parse_till_empty_into_located,
    ErrorKindSerdeDeref, ReadablePdu, ReadablePduWithOneInput, Span,
};
use netgauze_serde_macros::LocatedError;
use nom::{
    error::ErrorKind,
    number::complete::{be_u16, be_u32, be_u8},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

/// Context ID lives in the low four bits of the first Context TLV value
/// octet; the compress flag is the bit above them.
const CONTEXT_ID_MASK: u8 = 0x0f;
const CONTEXT_COMPRESS_FLAG: u8 = 0x10;

/// `T` bit and service-id field of the first Service TLV value octet.
const SERVICE_THREAD_ENTERPRISE_FLAG: u8 = 0x80;
const SERVICE_ID_MASK: u8 = 0x0f;

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum NetworkDataParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
    TlvError(#[from_located(module = "self")] NetworkDataTlvParsingError),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum NetworkDataTlvParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
    PrefixError(#[from_located(module = "self")] PrefixParsingError),
    ServiceError(#[from_located(module = "self")] ServiceParsingError),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum PrefixParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
    InvalidPrefixLength(u8),
    SubTlvError(#[from_located(module = "self")] PrefixSubTlvParsingError),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum PrefixSubTlvParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
    HasRouteError(#[from_located(module = "self")] HasRouteParsingError),
    BorderRouterError(#[from_located(module = "self")] BorderRouterParsingError),
    ContextError(#[from_located(module = "self")] ContextParsingError),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum HasRouteParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum BorderRouterParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum ContextParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum ServiceParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
    SubTlvError(#[from_located(module = "self")] ServiceSubTlvParsingError),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum ServiceSubTlvParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
    ServerError(#[from_located(module = "self")] ServerParsingError),
}

#[derive(LocatedError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum ServerParsingError {
    #[serde(with = "ErrorKindSerdeDeref")]
    NomError(#[from_nom] ErrorKind),
}

/// Splits one (type, stable, length)-prefixed value out of `buf`.
fn parse_tlv_header(
    buf: Span<'_>,
) -> IResult<Span<'_>, (u8, bool, Span<'_>), nom::error::Error<Span<'_>>> {
    let (buf, type_byte) = be_u8(buf)?;
    let (buf, length) = be_u8(buf)?;
    let (buf, value_buf) = nom::bytes::complete::take(length)(buf)?;
    Ok((buf, (type_byte >> 1, type_byte & 0x01 != 0, value_buf)))
}

impl<'a> ReadablePdu<'a, LocatedNetworkDataParsingError<'a>> for NetworkData {
    fn from_wire(buf: Span<'a>) -> IResult<Span<'a>, Self, LocatedNetworkDataParsingError<'a>> {
        let (buf, tlvs) = parse_till_empty_into_located(buf)?;
        Ok((buf, NetworkData::new(tlvs)))
    }
}

impl<'a> ReadablePdu<'a, LocatedNetworkDataTlvParsingError<'a>> for NetworkDataTlv {
    fn from_wire(buf: Span<'a>) -> IResult<Span<'a>, Self, LocatedNetworkDataTlvParsingError<'a>> {
        let (remainder, (type_value, stable, value_buf)) =
            parse_tlv_header(buf).map_err(|err: nom::Err<nom::error::Error<Span<'_>>>| {
                err.map(|e| {
                    LocatedNetworkDataTlvParsingError::new(
                        e.input,
                        NetworkDataTlvParsingError::NomError(e.code),
                    )
                })
            })?;
        let tlv = match NetworkDataTlvType::try_from(type_value) {
            Ok(NetworkDataTlvType::Prefix) => {
                let (rest, prefix) = parse_into_located_one_input(value_buf, stable)?;
                check_fully_parsed(rest)?;
                NetworkDataTlv::Prefix(prefix)
            }
            Ok(NetworkDataTlvType::Service) => {
                let (rest, service) = parse_into_located_one_input(value_buf, stable)?;
                check_fully_parsed(rest)?;
                NetworkDataTlv::Service(service)
            }
            Ok(NetworkDataTlvType::CommissioningData) => {
                NetworkDataTlv::CommissioningData(CommissioningDataTlv {
                    stable,
                    data: value_buf.fragment().to_vec(),
                })
            }
            _ => NetworkDataTlv::Unknown(UnknownTlv::new(
                type_value,
                stable,
                value_buf.fragment().to_vec(),
            )),
        };
        Ok((remainder, tlv))
    }
}

/// A typed TLV value parser left octets behind; the value length lied about
/// the structure, so reject rather than silently dropping bytes.
fn check_fully_parsed(
    rest: Span<'_>,
) -> Result<(), nom::Err<LocatedNetworkDataTlvParsingError<'_>>> {
    if rest.fragment().is_empty() {
        Ok(())
    } else {
        Err(nom::Err::Error(LocatedNetworkDataTlvParsingError::new(
            rest,
            NetworkDataTlvParsingError::NomError(ErrorKind::NonEmpty),
        )))
    }
}

impl<'a> ReadablePduWithOneInput<'a, bool, LocatedPrefixParsingError<'a>> for PrefixTlv {
    fn from_wire(
        buf: Span<'a>,
        stable: bool,
    ) -> IResult<Span<'a>, Self, LocatedPrefixParsingError<'a>> {
        let (buf, domain_id) = be_u8(buf)?;
        let input = buf;
        let (buf, prefix_length) = be_u8(buf)?;
        if prefix_length > 128 {
            return Err(nom::Err::Error(LocatedPrefixParsingError::new(
                input,
                PrefixParsingError::InvalidPrefixLength(prefix_length),
            )));
        }
        let prefix_octet_count = (usize::from(prefix_length) + 7) / 8;
        let (buf, prefix_octets) = nom::bytes::complete::take(prefix_octet_count)(buf)?;
        let mut octets = [0u8; 16];
        octets[..prefix_octet_count].copy_from_slice(prefix_octets.fragment());
        let prefix = match Ipv6Net::new(Ipv6Addr::from(octets), prefix_length) {
            Ok(prefix) => prefix,
            Err(_) => {
                return Err(nom::Err::Error(LocatedPrefixParsingError::new(
                    input,
                    PrefixParsingError::InvalidPrefixLength(prefix_length),
                )))
            }
        };
        let (buf, sub_tlvs) = parse_till_empty_into_located(buf)?;
        Ok((
            buf,
            PrefixTlv {
                domain_id,
                prefix,
                stable,
                sub_tlvs,
            },
        ))
    }
}

impl<'a> ReadablePdu<'a, LocatedPrefixSubTlvParsingError<'a>> for PrefixSubTlv {
    fn from_wire(buf: Span<'a>) -> IResult<Span<'a>, Self, LocatedPrefixSubTlvParsingError<'a>> {
        let (remainder, (type_value, stable, value_buf)) =
            parse_tlv_header(buf).map_err(|err: nom::Err<nom::error::Error<Span<'_>>>| {
                err.map(|e| {
                    LocatedPrefixSubTlvParsingError::new(
                        e.input,
                        PrefixSubTlvParsingError::NomError(e.code),
                    )
                })
            })?;
        let sub_tlv = match NetworkDataTlvType::try_from(type_value) {
            Ok(NetworkDataTlvType::HasRoute) => {
                let (rest, has_route) = parse_into_located_one_input(value_buf, stable)?;
                check_sub_fully_parsed(rest)?;
                PrefixSubTlv::HasRoute(has_route)
            }
            Ok(NetworkDataTlvType::BorderRouter) => {
                let (rest, border_router) = parse_into_located_one_input(value_buf, stable)?;
                check_sub_fully_parsed(rest)?;
                PrefixSubTlv::BorderRouter(border_router)
            }
            Ok(NetworkDataTlvType::Context) => {
                let (rest, context) = parse_into_located_one_input(value_buf, stable)?;
                check_sub_fully_parsed(rest)?;
                PrefixSubTlv::Context(context)
            }
            _ => PrefixSubTlv::Unknown(UnknownTlv::new(
                type_value,
                stable,
                value_buf.fragment().to_vec(),
            )),
        };
        Ok((remainder, sub_tlv))
    }
}

fn check_sub_fully_parsed(
    rest: Span<'_>,
) -> Result<(), nom::Err<LocatedPrefixSubTlvParsingError<'_>>> {
    if rest.fragment().is_empty() {
        Ok(())
    } else {
        Err(nom::Err::Error(LocatedPrefixSubTlvParsingError::new(
            rest,
            PrefixSubTlvParsingError::NomError(ErrorKind::NonEmpty),
        )))
    }
}

impl<'a> ReadablePduWithOneInput<'a, bool, LocatedHasRouteParsingError<'a>> for HasRouteTlv {
    fn from_wire(
        buf: Span<'a>,
        stable: bool,
    ) -> IResult<Span<'a>, Self, LocatedHasRouteParsingError<'a>> {
        let (buf, entries) = parse_till_empty(buf)?;
        Ok((buf, HasRouteTlv::new(stable, entries)))
    }
}

impl<'a> ReadablePdu<'a, LocatedHasRouteParsingError<'a>> for HasRouteEntry {
    fn from_wire(buf: Span<'a>) -> IResult<Span<'a>, Self, LocatedHasRouteParsingError<'a>> {
        let (buf, rloc16) = be_u16(buf)?;
        let (buf, flags) = be_u8(buf)?;
        Ok((buf, HasRouteEntry { rloc16, flags }))
    }
}

impl<'a> ReadablePduWithOneInput<'a, bool, LocatedBorderRouterParsingError<'a>>
    for BorderRouterTlv
{
    fn from_wire(
        buf: Span<'a>,
        stable: bool,
    ) -> IResult<Span<'a>, Self, LocatedBorderRouterParsingError<'a>> {
        let (buf, entries) = parse_till_empty(buf)?;
        Ok((buf, BorderRouterTlv::new(stable, entries)))
    }
}

impl<'a> ReadablePdu<'a, LocatedBorderRouterParsingError<'a>> for BorderRouterEntry {
    fn from_wire(buf: Span<'a>) -> IResult<Span<'a>, Self, LocatedBorderRouterParsingError<'a>> {
        let (buf, rloc16) = be_u16(buf)?;
        let (buf, flags) = be_u16(buf)?;
        Ok((buf, BorderRouterEntry { rloc16, flags }))
    }
}

impl<'a> ReadablePduWithOneInput<'a, bool, LocatedContextParsingError<'a>> for ContextTlv {
    fn from_wire(
        buf: Span<'a>,
        stable: bool,
    ) -> IResult<Span<'a>, Self, LocatedContextParsingError<'a>> {
        let (buf, flags) = be_u8(buf)?;
        let (buf, context_length) = be_u8(buf)?;
        Ok((
            buf,
            ContextTlv {
                stable,
                compress: flags & CONTEXT_COMPRESS_FLAG != 0,
                context_id: flags & CONTEXT_ID_MASK,
                context_length,
            },
        ))
    }
}

impl<'a> ReadablePduWithOneInput<'a, bool, LocatedServiceParsingError<'a>> for ServiceTlv {
    fn from_wire(
        buf: Span<'a>,
        stable: bool,
    ) -> IResult<Span<'a>, Self, LocatedServiceParsingError<'a>> {
        let (buf, flags) = be_u8(buf)?;
        let service_id = flags & SERVICE_ID_MASK;
        let (buf, enterprise_number) = if flags & SERVICE_THREAD_ENTERPRISE_FLAG != 0 {
            (buf, THREAD_ENTERPRISE_NUMBER)
        } else {
            be_u32(buf)?
        };
        let (buf, service_data_length) = be_u8(buf)?;
        let (buf, service_data) = nom::bytes::complete::take(service_data_length)(buf)?;
        let (buf, sub_tlvs) = parse_till_empty_into_located(buf)?;
        Ok((
            buf,
            ServiceTlv {
                stable,
                service_id,
                enterprise_number,
                service_data: service_data.fragment().to_vec(),
                sub_tlvs,
            },
        ))
    }
}

impl<'a> ReadablePdu<'a, LocatedServiceSubTlvParsingError<'a>> for ServiceSubTlv {
    fn from_wire(buf: Span<'a>) -> IResult<Span<'a>, Self, LocatedServiceSubTlvParsingError<'a>> {
        let (remainder, (type_value, stable, value_buf)) =
            parse_tlv_header(buf).map_err(|err: nom::Err<nom::error::Error<Span<'_>>>| {
                err.map(|e| {
                    LocatedServiceSubTlvParsingError::new(
                        e.input,
                        ServiceSubTlvParsingError::NomError(e.code),
                    )
                })
            })?;
        let sub_tlv = match NetworkDataTlvType::try_from(type_value) {
            Ok(NetworkDataTlvType::Server) => {
                let (_, server) = parse_into_located_one_input(value_buf, stable)?;
                ServiceSubTlv::Server(server)
            }
            _ => ServiceSubTlv::Unknown(UnknownTlv::new(
                type_value,
                stable,
                value_buf.fragment().to_vec(),
            )),
        };
        Ok((remainder, sub_tlv))
    }
}

impl<'a> ReadablePduWithOneInput<'a, bool, LocatedServerParsingError<'a>> for ServerTlv {
    fn from_wire(
        buf: Span<'a>,
        stable: bool,
    ) -> IResult<Span<'a>, Self, LocatedServerParsingError<'a>> {
        let (buf, server16) = be_u16(buf)?;
        let data_len = buf.fragment().len();
        let (buf, server_data) = nom::bytes::complete::take(data_len)(buf)?;
        Ok((
            buf,
            ServerTlv {
                stable,
                server16,
                server_data: server_data.fragment().to_vec(),
            },
        ))
    }
}
