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
    wire::{
        deserializer::{
            LocatedNetworkDataParsingError, NetworkDataParsingError, NetworkDataTlvParsingError,
        },
        serializer::NetworkDataWritingError,
    },
    CommissioningDataTlv, NetworkData, NetworkDataTlv, UnknownTlv,
};
use netgauze_parse_utils::{
    test_helpers::{combine, test_parse_error, test_parsed_completely, test_write},
    Span,
};
use nom::error::ErrorKind;

mod service;

#[test]
fn test_empty_network_data() -> Result<(), NetworkDataWritingError> {
    let good_wire = [];
    let good = NetworkData::new(vec![]);

    test_parsed_completely(&good_wire[..], &good);
    test_write(&good, &good_wire[..])?;
    Ok(())
}

#[test]
fn test_commissioning_data_tlv() -> Result<(), NetworkDataWritingError> {
    let good_wire = combine(vec![
        &[0x08, 0x04], // Commissioning Data TLV, non-stable, length 4
        &[0x0b, 0x02, 0x00, 0x2a], // Commissioner Session ID = 42
    ]);

    let good = NetworkData::new(vec![NetworkDataTlv::CommissioningData(
        CommissioningDataTlv::new(vec![0x0b, 0x02, 0x00, 0x2a]),
    )]);

    test_parsed_completely(&good_wire[..], &good);
    test_write(&good, &good_wire[..])?;
    Ok(())
}

#[test]
fn test_unknown_tlv_round_trip() -> Result<(), NetworkDataWritingError> {
    // Type 7 is unassigned; the value octets must survive untouched.
    let good_wire = combine(vec![&[0x0f, 0x03], &[0xca, 0xfe, 0x42]]);

    let good = NetworkData::new(vec![NetworkDataTlv::Unknown(UnknownTlv::new(
        7,
        true,
        vec![0xca, 0xfe, 0x42],
    ))]);

    test_parsed_completely(&good_wire[..], &good);
    test_write(&good, &good_wire[..])?;
    Ok(())
}

#[test]
fn test_truncated_tlv_header() {
    let bad_wire = [0x03];

    let invalid = LocatedNetworkDataParsingError::new(
        unsafe { Span::new_from_raw_offset(1, &bad_wire[1..]) },
        NetworkDataParsingError::TlvError(NetworkDataTlvParsingError::NomError(ErrorKind::Eof)),
    );
    test_parse_error::<NetworkData, LocatedNetworkDataParsingError<'_>>(&bad_wire, &invalid);
}

#[test]
fn test_tlv_length_past_end() {
    // Header announces five value octets, only one follows.
    let bad_wire = [0x03, 0x05, 0x00];

    let invalid = LocatedNetworkDataParsingError::new(
        unsafe { Span::new_from_raw_offset(2, &bad_wire[2..]) },
        NetworkDataParsingError::TlvError(NetworkDataTlvParsingError::NomError(ErrorKind::Eof)),
    );
    test_parse_error::<NetworkData, LocatedNetworkDataParsingError<'_>>(&bad_wire, &invalid);
}
