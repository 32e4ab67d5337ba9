//! Payload formats carried inside [`Envelope`][crate::Envelope]s.
//!
//! | Tag                          | Payload                                    |
//! |------------------------------|--------------------------------------------|
//! | `VehicleIn` / `VehicleOut`   | JSON `VehicleMessage`                      |
//! | `EdgeRequest`                | JSON [`EdgeLengthRequest`]                 |
//! | `EdgeResponse`               | JSON [`EdgeLengthResponse`]                |
//! | `DoneReport`                 | one little-endian `i32`: [`Completion`] code |
//! | `DoneBroadcast`              | one little-endian `i32`: [`DONE_FLAG`]     |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ps_core::VertexId;

use crate::{DistError, DistResult, Tag};

/// Value of the termination broadcast.
pub const DONE_FLAG: i32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeLengthRequest {
    pub src_vertex_id:  VertexId,
    pub dest_vertex_id: VertexId,
    /// Echoed by the response so the leaf can pair them.
    pub seq:            u64,
}

/// `length` is `None` when the edge is absent from the full graph or its
/// length is not positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeLengthResponse {
    pub seq:    u64,
    pub length: Option<f64>,
}

/// How a vehicle's lifecycle ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// Reached the end of its path.
    Parked,
    /// Dropped after a routing or consistency failure.
    Abandoned,
}

impl Completion {
    pub const fn code(self) -> i32 {
        match self {
            Completion::Parked    => 1,
            Completion::Abandoned => -1,
        }
    }

    pub fn from_code(code: i32) -> Option<Completion> {
        match code {
            1  => Some(Completion::Parked),
            -1 => Some(Completion::Abandoned),
            _  => None,
        }
    }

    pub fn encode(self) -> Vec<u8> {
        encode_int(self.code())
    }

    pub fn decode(bytes: &[u8]) -> DistResult<Completion> {
        let code = decode_int(Tag::DoneReport, bytes)?;
        Completion::from_code(code).ok_or_else(|| DistError::Payload {
            tag:    Tag::DoneReport,
            reason: format!("unknown completion code {code}"),
        })
    }
}

pub fn encode_int(value: i32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

pub fn decode_int(tag: Tag, bytes: &[u8]) -> DistResult<i32> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| DistError::Payload {
        tag,
        reason: format!("expected 4 bytes, got {}", bytes.len()),
    })?;
    Ok(i32::from_le_bytes(raw))
}

pub fn encode_json<T: Serialize>(tag: Tag, value: &T) -> DistResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| DistError::Payload { tag, reason: e.to_string() })
}

pub fn decode_json<T: DeserializeOwned>(tag: Tag, bytes: &[u8]) -> DistResult<T> {
    serde_json::from_slice(bytes).map_err(|e| DistError::Payload { tag, reason: e.to_string() })
}
