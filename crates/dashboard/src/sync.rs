//! Backend synchronization: collection loads into the shared state and the
//! confirmed-write active toggle. Every failure is caught here, logged, and
//! recorded to the event ring; nothing propagates and no state is rolled
//! back or retried. Stale responses are discarded by the supersession
//! counters in `DashboardState`.

use tracing::{debug, info, warn};

use watering_client::ApiClient;

use crate::state::SharedState;

/// Fetch the authoritative bed list, then the sensor and valve collections.
///
/// The bed fetch gates the rest: if it fails, the previous list (and caches)
/// stay as they are. The two cache fetches run concurrently with no ordering
/// between them. Each response is applied only if this call's load
/// generation is still the newest.
pub async fn load(shared: &SharedState, client: &ApiClient) {
    let gen = shared.write().await.begin_load();

    let beds = match client.list_plant_beds().await {
        Ok(beds) => beds,
        Err(e) => {
            warn!(error = %e, "plant bed fetch failed; keeping previous list");
            shared
                .write()
                .await
                .record_error(format!("bed load failed: {e}"));
            return;
        }
    };

    {
        let mut st = shared.write().await;
        if !st.apply_beds(gen, beds) {
            debug!(gen, "bed list superseded by a newer load; discarded");
            return;
        }
        info!(beds = st.beds.len(), "bed list loaded");
    }

    let (sensors, valves) = tokio::join!(client.list_sensors(), client.list_valves());

    match sensors {
        Ok(sensors) => {
            let mut st = shared.write().await;
            if !st.apply_sensors(gen, sensors) {
                debug!(gen, "sensor cache superseded by a newer load; discarded");
            }
        }
        Err(e) => {
            warn!(error = %e, "sensor fetch failed; cache unchanged");
            shared
                .write()
                .await
                .record_error(format!("sensor load failed: {e}"));
        }
    }

    match valves {
        Ok(valves) => {
            let mut st = shared.write().await;
            if !st.apply_valves(gen, valves) {
                debug!(gen, "valve cache superseded by a newer load; discarded");
            }
        }
        Err(e) => {
            warn!(error = %e, "valve fetch failed; cache unchanged");
            shared
                .write()
                .await
                .record_error(format!("valve load failed: {e}"));
        }
    }
}

/// Flip one bed's `active` flag on the backend and, once acknowledged,
/// locally. The full record is sent with only `active` inverted. The local
/// flip happens strictly after the acknowledgment (confirmed-write); on
/// failure the displayed value is left exactly as it was.
pub async fn toggle_active(shared: &SharedState, client: &ApiClient, bed_id: i64) {
    let Some((bed, seq)) = shared.write().await.begin_toggle(bed_id) else {
        warn!(bed_id, "toggle requested for unknown bed id");
        return;
    };

    let mut updated = bed.clone();
    updated.active = !bed.active;

    match client.update_plant_bed(&updated).await {
        Ok(()) => {
            let mut st = shared.write().await;
            if st.confirm_toggle(bed_id, seq, updated.active) {
                info!(bed_id, active = updated.active, "toggle confirmed");
            } else {
                debug!(bed_id, seq, "toggle ack superseded; discarded");
            }
        }
        Err(e) => {
            warn!(bed_id, error = %e, "toggle failed; local state unchanged");
            shared
                .write()
                .await
                .record_error(format!("toggle failed for bed {bed_id}: {e}"));
        }
    }
}

// ===========================================================================
// Tests — against an in-process axum stand-in for the backend
// ===========================================================================
