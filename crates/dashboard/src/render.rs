//! Text rendering of the dashboard: one summary line per bed, an indented
//! detail block for expanded cards, and the diagnostic event log. Pure
//! functions over state; nothing here touches the network.

use std::fmt::Write;

use time::macros::format_description;

use watering_client::{PlantBed, Reading, Sensor, Valve};

use crate::cache::{EntityCache, Resolution};
use crate::state::DashboardState;

const EVENT_TS_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// Booleans are never shown raw.
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn sensor_field(cache: &EntityCache<Sensor>, id: Option<i64>) -> String {
    match cache.resolve(id) {
        Resolution::Found(s) => format!("{} (addr {}, bus {})", s.name, s.address, s.bus),
        Resolution::Loading => "(loading)".to_string(),
        Resolution::Missing => "(not found)".to_string(),
    }
}

fn valve_field(cache: &EntityCache<Valve>, id: Option<i64>) -> String {
    match cache.resolve(id) {
        Resolution::Found(v) => format!("{} (pin {})", v.name, v.pin),
        Resolution::Loading => "(loading)".to_string(),
        Resolution::Missing => "(not found)".to_string(),
    }
}

fn reference_id(id: Option<i64>) -> String {
    match id {
        Some(id) => format!("#{id}"),
        None => "-".to_string(),
    }
}

fn summary_line(bed: &PlantBed, expanded: bool) -> String {
    let marker = if expanded { '-' } else { '+' };
    format!(
        "[{marker}] #{} {:<20} active: {}",
        bed.id,
        bed.name,
        yes_no(bed.active)
    )
}

fn detail_block(out: &mut String, bed: &PlantBed, st: &DashboardState) {
    let _ = writeln!(
        out,
        "      sensor {}: {}",
        reference_id(bed.sensor_id),
        sensor_field(&st.sensors, bed.sensor_id)
    );
    let _ = writeln!(
        out,
        "      valve  {}: {}",
        reference_id(bed.valve_id),
        valve_field(&st.valves, bed.valve_id)
    );
    let _ = writeln!(out, "      irrigated: {}", yes_no(bed.active));
}

/// Render every card: summary always, detail only when expanded.
pub fn render_cards(st: &DashboardState) -> String {
    if st.beds.is_empty() {
        return "(no plant beds)\n".to_string();
    }

    let mut out = String::new();
    for bed in &st.beds {
        let expanded = st.cards.get(&bed.id).map(|c| c.expanded).unwrap_or(false);
        let _ = writeln!(out, "{}", summary_line(bed, expanded));
        if expanded {
            detail_block(&mut out, bed, st);
        }
    }
    out
}

/// Render the diagnostic event ring, newest first.
pub fn render_events(st: &DashboardState) -> String {
    if st.events.is_empty() {
        return "(no events)\n".to_string();
    }

    let mut out = String::new();
    for ev in st.events.iter().rev() {
        let ts = ev
            .ts
            .format(EVENT_TS_FORMAT)
            .unwrap_or_else(|_| "--:--:--".to_string());
        let _ = writeln!(out, "{ts} [{}] {}", ev.kind.label(), ev.detail);
    }
    out
}

/// Render a telemetry history slice for one sensor.
pub fn render_readings(readings: &[Reading]) -> String {
    if readings.is_empty() {
        return "(no readings in range)\n".to_string();
    }

    let mut out = String::new();
    for r in readings {
        let _ = writeln!(
            out,
            "{}  {:.1}°C  {:.1}% rh  (sensor #{})",
            r.timestamp, r.temperature, r.humidity, r.sensor_id
        );
    }
    out
}

// ===========================================================================
// Tests
// ===========================================================================
