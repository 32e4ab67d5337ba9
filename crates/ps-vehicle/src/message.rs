//! Wire form of a vehicle.
//!
//! Encoded as a JSON object:
//!
//! ```json
//! { "id": "aB3dE5gH7j", "path_ids": [1, 2, 3], "speed": 4.0, "delta": 2.0,
//!   "next_id": 3, "prev_id": 2, "is_parked": false, "distance_remaining": 0.0 }
//! ```
//!
//! `marked_for_deletion` is process-local and not part of the message; a
//! decoded vehicle always has it cleared.

use serde::{Deserialize, Serialize};

use ps_core::{VehicleId, VertexId};

use crate::{Vehicle, VehicleResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleMessage {
    pub id:                 VehicleId,
    pub path_ids:           Vec<VertexId>,
    pub speed:              f64,
    pub delta:              f64,
    pub next_id:            VertexId,
    pub prev_id:            VertexId,
    pub is_parked:          bool,
    pub distance_remaining: f64,
}

impl VehicleMessage {
    pub fn encode(&self) -> VehicleResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> VehicleResult<VehicleMessage> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<&Vehicle> for VehicleMessage {
    fn from(v: &Vehicle) -> Self {
        VehicleMessage {
            id:                 v.id().clone(),
            path_ids:           v.path().to_vec(),
            speed:              v.speed(),
            delta:              v.delta(),
            next_id:            v.next_id(),
            prev_id:            v.prev_id(),
            is_parked:          v.is_parked(),
            distance_remaining: v.distance_remaining(),
        }
    }
}

impl TryFrom<VehicleMessage> for Vehicle {
    type Error = crate::VehicleError;

    fn try_from(m: VehicleMessage) -> VehicleResult<Vehicle> {
        Vehicle::from_parts(
            m.id,
            m.path_ids,
            m.speed,
            m.delta,
            m.prev_id,
            m.next_id,
            m.is_parked,
            m.distance_remaining,
        )
    }
}

impl Vehicle {
    /// Serialise for migration.
    pub fn encode(&self) -> VehicleResult<Vec<u8>> {
        VehicleMessage::from(self).encode()
    }

    /// Deserialise and validate a migrated vehicle.
    pub fn decode(bytes: &[u8]) -> VehicleResult<Vehicle> {
        Vehicle::try_from(VehicleMessage::decode(bytes)?)
    }
}
