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
    wire::serializer::NetworkDataWritingError, NetworkData, NetworkDataTlv, ServerTlv,
    ServiceSubTlv, ServiceTlv, UnknownTlv, THREAD_ENTERPRISE_NUMBER,
};
use netgauze_parse_utils::test_helpers::{combine, test_parsed_completely, test_write};

#[test]
fn test_service_thread_enterprise_form() -> Result<(), NetworkDataWritingError> {
    let good_wire = combine(vec![
        &[0x0b, 0x09], // Service TLV, stable, length 9
        &[0x85],       // T bit set, service id 5
        &[0x01, 0x01], // service data length 1, service data
        &[0x0d, 0x04], // Server sub-TLV, stable, length 4
        &[0x0c, 0x00, 0xde, 0xad],
    ]);

    let good = NetworkData::new(vec![NetworkDataTlv::Service(ServiceTlv::new(
        true,
        5,
        THREAD_ENTERPRISE_NUMBER,
        vec![0x01],
        vec![ServiceSubTlv::Server(ServerTlv::new(
            true,
            0x0c00,
            vec![0xde, 0xad],
        ))],
    ))]);

    test_parsed_completely(&good_wire[..], &good);
    test_write(&good, &good_wire[..])?;
    Ok(())
}

#[test]
fn test_service_explicit_enterprise_number() -> Result<(), NetworkDataWritingError> {
    let good_wire = combine(vec![
        &[0x0a, 0x0c], // Service TLV, non-stable, length 12
        &[0x02],       // T bit clear, service id 2
        &[0x00, 0x00, 0x12, 0x34], // enterprise number 4660
        &[0x02, 0xaa, 0xbb], // service data length 2, service data
        &[0x0c, 0x02], // Server sub-TLV, non-stable, length 2
        &[0x20, 0x00],
    ]);

    let good = NetworkData::new(vec![NetworkDataTlv::Service(ServiceTlv::new(
        false,
        2,
        0x1234,
        vec![0xaa, 0xbb],
        vec![ServiceSubTlv::Server(ServerTlv::new(false, 0x2000, vec![]))],
    ))]);

    test_parsed_completely(&good_wire[..], &good);
    test_write(&good, &good_wire[..])?;
    Ok(())
}

#[test]
fn test_service_with_unknown_sub_tlv() -> Result<(), NetworkDataWritingError> {
    // An unassigned sub-TLV type rides along untouched.
    let good_wire = combine(vec![
        &[0x0b, 0x09], // Service TLV, stable, length 9
        &[0x81],       // T bit set, service id 1
        &[0x00],       // empty service data
        &[0x0d, 0x02], // Server sub-TLV, stable, length 2
        &[0x0c, 0x00],
        &[0x10, 0x01, 0x7f], // type 8, non-stable, one value octet
    ]);

    let good = NetworkData::new(vec![NetworkDataTlv::Service(ServiceTlv::new(
        true,
        1,
        THREAD_ENTERPRISE_NUMBER,
        vec![],
        vec![
            ServiceSubTlv::Server(ServerTlv::new(true, 0x0c00, vec![])),
            ServiceSubTlv::Unknown(UnknownTlv::new(8, false, vec![0x7f])),
        ],
    ))]);

    test_parsed_completely(&good_wire[..], &good);
    test_write(&good, &good_wire[..])?;
    Ok(())
}
