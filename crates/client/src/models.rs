use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Backend records
// ---------------------------------------------------------------------------

/// One irrigation zone as the backend stores it. Beds are created and
/// deleted on the backend only; the client reads the list and updates
/// `active`, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantBed {
    pub id: i64,
    pub name: String,
    /// Foreign keys are nullable columns on the backend, so a bed can
    /// legitimately reference nothing.
    pub sensor_id: Option<i64>,
    pub valve_id: Option<i64>,
    pub active: bool,
}

/// Soil sensor record. `address` and `bus` describe the I2C wiring and are
/// opaque to the dashboard beyond display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub bus: i64,
}

/// Water valve record. `pin` is the relay GPIO pin, display-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valve {
    pub id: i64,
    pub name: String,
    pub pin: i64,
}

/// Historical telemetry row from `/api/readings`. The timestamp stays in
/// whatever string form the backend's JSON encoder produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
    pub sensor_id: i64,
}

// ===========================================================================
// Tests
// ===========================================================================
