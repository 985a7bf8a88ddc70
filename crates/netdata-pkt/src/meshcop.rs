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

//! Byte-level views over MeshCoP TLV sequences.
//!
//! Commissioning Data is carried as an opaque MeshCoP TLV blob inside the
//! Network Data; the MGMT_COMMISSIONER_SET/GET handlers splice TLVs in and
//! out of it verbatim, so this module works on raw octets rather than a
//! decoded tree. Only the basic (type, length) header form is handled; a
//! length octet of 255 announces the extended form, which the commissioning
//! handlers reject.

use crate::iana::MeshcopTlvType;
use serde::{Deserialize, Serialize};

/// Length octet announcing the extended MeshCoP header form.
pub const EXTENDED_LENGTH_MARKER: u8 = 255;

/// A borrowed view of one MeshCoP TLV.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MeshcopTlv<'a> {
    type_value: u8,
    value: &'a [u8],
}

impl<'a> MeshcopTlv<'a> {
    pub const fn new(type_value: u8, value: &'a [u8]) -> Self {
        Self { type_value, value }
    }

    pub const fn type_value(&self) -> u8 {
        self.type_value
    }

    pub const fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Total size on the wire, header included.
    pub const fn size(&self) -> usize {
        2 + self.value.len()
    }

    pub fn is(&self, tlv_type: MeshcopTlvType) -> bool {
        self.type_value == u8::from(tlv_type)
    }

    /// Value as a big-endian `u16`, for session-id and locator TLVs. The
    /// value must be at least two octets; extra octets are ignored.
    pub fn as_u16(&self) -> Option<u16> {
        match self.value {
            [high, low, ..] => Some(u16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }

    /// Appends this TLV, header included, to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.type_value);
        out.push(self.value.len() as u8);
        out.extend_from_slice(self.value);
    }
}

/// Error walking a MeshCoP TLV sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum MeshcopTlvError {
    TruncatedHeader,
    TruncatedValue,
    ExtendedLength,
}

/// Iterator over the TLVs in a raw MeshCoP sequence. Yields an error and
/// then stops if a header is truncated, extended, or runs past the buffer.
#[derive(Debug, Clone)]
pub struct MeshcopTlvIterator<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> Iterator for MeshcopTlvIterator<'a> {
    type Item = Result<MeshcopTlv<'a>, MeshcopTlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }
        if self.buf.len() < 2 {
            self.failed = true;
            return Some(Err(MeshcopTlvError::TruncatedHeader));
        }
        let type_value = self.buf[0];
        let length = self.buf[1];
        if length == EXTENDED_LENGTH_MARKER {
            self.failed = true;
            return Some(Err(MeshcopTlvError::ExtendedLength));
        }
        let end = 2 + usize::from(length);
        if self.buf.len() < end {
            self.failed = true;
            return Some(Err(MeshcopTlvError::TruncatedValue));
        }
        let tlv = MeshcopTlv::new(type_value, &self.buf[2..end]);
        self.buf = &self.buf[end..];
        Some(Ok(tlv))
    }
}

/// Walks the TLVs in `buf`.
pub const fn meshcop_tlvs(buf: &[u8]) -> MeshcopTlvIterator<'_> {
    MeshcopTlvIterator { buf, failed: false }
}

/// First well-formed TLV of raw type `type_value`; `None` when absent or
/// when the sequence is malformed before a match.
pub fn find_meshcop_tlv(buf: &[u8], type_value: u8) -> Option<MeshcopTlv<'_>> {
    meshcop_tlvs(buf)
        .map_while(Result::ok)
        .find(|tlv| tlv.type_value() == type_value)
}

/// Appends a TLV built from parts to `out`.
pub fn push_meshcop_tlv(out: &mut Vec<u8>, tlv_type: MeshcopTlvType, value: &[u8]) {
    MeshcopTlv::new(u8::from(tlv_type), value).write_to(out);
}
