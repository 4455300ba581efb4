//! Async client for the watering backend's REST surface. JSON over HTTP,
//! 2xx for success; no auth, no content negotiation, no error-body schema.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::models::{PlantBed, Reading, Sensor, Valve};

/// The backend's required timestamp format for the readings query.
const READINGS_TS_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Single error family for every backend interaction: either the request
/// never completed, or it came back non-2xx. Callers treat both the same.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
    },
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` examples: "http://127.0.0.1:5000", "http://pi.local:5000/".
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "GET",
                url,
                status,
            });
        }
        Ok(resp.json().await?)
    }

    // ----------------------------
    // Collection reads
    // ----------------------------

    /// `GET /api/plantbed` — the full bed collection, in backend order.
    pub async fn list_plant_beds(&self) -> Result<Vec<PlantBed>, ApiError> {
        self.get_json("/api/plantbed").await
    }

    /// `GET /api/sensor`
    pub async fn list_sensors(&self) -> Result<Vec<Sensor>, ApiError> {
        self.get_json("/api/sensor").await
    }

    /// `GET /api/valve`
    pub async fn list_valves(&self) -> Result<Vec<Valve>, ApiError> {
        self.get_json("/api/valve").await
    }

    // ----------------------------
    // Bed mutation
    // ----------------------------

    /// `PUT /api/plantbed/{id}` with the complete record as the body. The
    /// backend replaces the stored row wholesale; the caller is expected to
    /// send every field, changed or not.
    pub async fn update_plant_bed(&self, bed: &PlantBed) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/plantbed/{}", bed.id));
        tracing::debug!(%url, active = bed.active, "PUT");
        let resp = self.http.put(&url).json(bed).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "PUT",
                url,
                status,
            });
        }
        Ok(())
    }

    /// `PUT /api/plantbed/{id}/activate` — backend convenience route that
    /// sets `active` without a full-record body.
    pub async fn activate(&self, bed_id: i64) -> Result<(), ApiError> {
        self.put_flag(bed_id, "activate").await
    }

    /// `PUT /api/plantbed/{id}/deactivate`
    pub async fn deactivate(&self, bed_id: i64) -> Result<(), ApiError> {
        self.put_flag(bed_id, "deactivate").await
    }

    async fn put_flag(&self, bed_id: i64, action: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/plantbed/{bed_id}/{action}"));
        tracing::debug!(%url, "PUT");
        let resp = self.http.put(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "PUT",
                url,
                status,
            });
        }
        Ok(())
    }

    // ----------------------------
    // Telemetry history
    // ----------------------------

    /// `GET /api/readings?from=..&to=..` — the backend insists on
    /// `YYYY-MM-DD HH:MM:SS` bounds and 400s anything else.
    pub async fn readings_between(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Reading>, ApiError> {
        let from_s = from
            .format(READINGS_TS_FORMAT)
            .expect("timestamp format is infallible for valid datetimes");
        let to_s = to
            .format(READINGS_TS_FORMAT)
            .expect("timestamp format is infallible for valid datetimes");

        let url = self.url("/api/readings");
        let resp = self
            .http
            .get(&url)
            .query(&[("from", from_s), ("to", to_s)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method: "GET",
                url,
                status,
            });
        }
        Ok(resp.json().await?)
    }
}

// ===========================================================================
// Tests — against an in-process axum stand-in for the Flask backend
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Bind a router on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(2)).unwrap()
    }

    fn sample_beds() -> Vec<PlantBed> {
        vec![
            PlantBed {
                id: 1,
                name: "Bed A".into(),
                sensor_id: Some(5),
                valve_id: Some(9),
                active: false,
            },
            PlantBed {
                id: 2,
                name: "Bed B".into(),
                sensor_id: None,
                valve_id: Some(10),
                active: true,
            },
        ]
    }

    // -- collection reads ---------------------------------------------------

    #[tokio::test]
    async fn list_plant_beds_returns_backend_array_unchanged() {
        let beds = sample_beds();
        let payload = beds.clone();
        let app = Router::new().route(
            "/api/plantbed",
            get(move || {
                let payload = payload.clone();
                async move { Json(payload) }
            }),
        );
        let base = serve(app).await;

        let got = client(&base).list_plant_beds().await.unwrap();
        assert_eq!(got, beds);
    }

    #[tokio::test]
    async fn list_sensors_and_valves() {
        let app = Router::new()
            .route(
                "/api/sensor",
                get(|| async {
                    Json(vec![Sensor {
                        id: 5,
                        name: "Soil-5".into(),
                        address: "0x44".into(),
                        bus: 1,
                    }])
                }),
            )
            .route(
                "/api/valve",
                get(|| async {
                    Json(vec![Valve {
                        id: 9,
                        name: "Valve-9".into(),
                        pin: 11,
                    }])
                }),
            );
        let base = serve(app).await;
        let c = client(&base);

        let sensors = c.list_sensors().await.unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].name, "Soil-5");

        let valves = c.list_valves().await.unwrap();
        assert_eq!(valves[0].pin, 11);
    }

    #[tokio::test]
    async fn non_2xx_yields_status_error() {
        let app = Router::new().route(
            "/api/plantbed",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;

        let err = client(&base).list_plant_beds().await.unwrap_err();
        match err {
            ApiError::Status { status, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_yields_http_error() {
        // Nothing listens here.
        let c = client("http://127.0.0.1:1");
        let err = c.list_plant_beds().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }

    // -- bed mutation -------------------------------------------------------

    #[tokio::test]
    async fn update_plant_bed_puts_full_record() {
        let received: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&received);

        let app = Router::new()
            .route(
                "/api/plantbed/{id}",
                put(
                    |State(captured): State<Arc<Mutex<Option<serde_json::Value>>>>,
                     Path(id): Path<i64>,
                     Json(body): Json<serde_json::Value>| async move {
                        assert_eq!(id, 1);
                        *captured.lock().unwrap() = Some(body);
                        Json(serde_json::json!({"message": "PlantBed updated successfully"}))
                    },
                ),
            )
            .with_state(captured);
        let base = serve(app).await;

        let bed = PlantBed {
            id: 1,
            name: "Bed A".into(),
            sensor_id: Some(5),
            valve_id: Some(9),
            active: true,
        };
        client(&base).update_plant_bed(&bed).await.unwrap();

        let body = received.lock().unwrap().take().unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Bed A");
        assert_eq!(body["sensor_id"], 5);
        assert_eq!(body["valve_id"], 9);
        assert_eq!(body["active"], true);
    }

    #[tokio::test]
    async fn update_plant_bed_404_is_error() {
        let app = Router::new(); // no routes at all
        let base = serve(app).await;

        let bed = sample_beds().remove(0);
        let err = client(&base).update_plant_bed(&bed).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status {
                status: StatusCode::NOT_FOUND,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn activate_and_deactivate_hit_flag_routes() {
        let hits: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::clone(&hits);

        let app = Router::new()
            .route(
                "/api/plantbed/{id}/{action}",
                put(
                    |State(hits): State<Arc<Mutex<Vec<String>>>>,
                     Path((id, action)): Path<(i64, String)>| async move {
                        hits.lock().unwrap().push(format!("{id}/{action}"));
                        Json(serde_json::json!({"message": "ok"}))
                    },
                ),
            )
            .with_state(state);
        let base = serve(app).await;
        let c = client(&base);

        c.activate(3).await.unwrap();
        c.deactivate(3).await.unwrap();

        let hits = hits.lock().unwrap();
        assert_eq!(*hits, vec!["3/activate".to_string(), "3/deactivate".to_string()]);
    }

    // -- readings -----------------------------------------------------------

    #[tokio::test]
    async fn readings_between_formats_query_bounds() {
        let seen: Arc<Mutex<Option<HashMap<String, String>>>> = Arc::new(Mutex::new(None));
        let state = Arc::clone(&seen);

        let app = Router::new()
            .route(
                "/api/readings",
                get(
                    |State(seen): State<Arc<Mutex<Option<HashMap<String, String>>>>>,
                     Query(params): Query<HashMap<String, String>>| async move {
                        *seen.lock().unwrap() = Some(params);
                        Json(vec![Reading {
                            id: 1,
                            timestamp: "2024-06-01 12:00:00".into(),
                            temperature: 20.0,
                            humidity: 55.0,
                            sensor_id: 5,
                        }])
                    },
                ),
            )
            .with_state(state);
        let base = serve(app).await;

        let from = time::macros::datetime!(2024-06-01 11:00:00 UTC);
        let to = time::macros::datetime!(2024-06-01 12:00:00 UTC);
        let readings = client(&base).readings_between(from, to).await.unwrap();
        assert_eq!(readings.len(), 1);

        let params = seen.lock().unwrap().take().unwrap();
        assert_eq!(params["from"], "2024-06-01 11:00:00");
        assert_eq!(params["to"], "2024-06-01 12:00:00");
    }

    // -- url handling -------------------------------------------------------

    #[tokio::test]
    async fn trailing_slash_on_base_url_is_tolerated() {
        let app = Router::new().route("/api/valve", get(|| async { Json(Vec::<Valve>::new()) }));
        let base = serve(app).await;

        let c = client(&format!("{base}/"));
        let valves = c.list_valves().await.unwrap();
        assert!(valves.is_empty());
    }
}
