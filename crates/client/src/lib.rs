//! Typed client for the watering-system backend: the record types its JSON
//! API serves and an async HTTP client for reading and updating them.
//!
//! The backend owns all persistence and business rules; this crate only
//! mirrors its REST surface. See `ApiClient` for the full set of calls.

pub mod api;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use models::{PlantBed, Reading, Sensor, Valve};
