use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use watering_client::{PlantBed, Sensor, Valve};

use crate::cache::EntityCache;

/// Maximum number of diagnostic events retained in the ring buffer.
const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

pub type SharedState = Arc<RwLock<DashboardState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

pub struct DashboardState {
    /// Last bed collection fetched, in backend order.
    pub beds: Vec<PlantBed>,
    /// Per-bed UI state, keyed by bed id. Rebuilt whenever `beds` is.
    pub cards: HashMap<i64, CardState>,
    pub sensors: EntityCache<Sensor>,
    pub valves: EntityCache<Valve>,
    /// Bumped at the start of every collection load. Responses carry the
    /// generation they were issued under and are discarded if it has moved
    /// on, so a superseded load can never clobber a newer one's result.
    load_gen: u64,
    pub events: VecDeque<DashboardEvent>,
}

#[derive(Debug, Clone)]
pub struct CardState {
    pub expanded: bool,
    /// Bumped when a toggle is issued for this bed; an acknowledgment only
    /// applies if it carries the current value.
    pub toggle_seq: u64,
}

#[derive(Clone)]
pub struct DashboardEvent {
    pub ts: OffsetDateTime,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventKind {
    Load,
    Toggle,
    Error,
    System,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Load => "load",
            EventKind::Toggle => "toggle",
            EventKind::Error => "error",
            EventKind::System => "system",
        }
    }
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl DashboardState {
    pub fn new() -> Self {
        Self {
            beds: Vec::new(),
            cards: HashMap::new(),
            sensors: EntityCache::new(),
            valves: EntityCache::new(),
            load_gen: 0,
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn bed(&self, bed_id: i64) -> Option<&PlantBed> {
        self.beds.iter().find(|b| b.id == bed_id)
    }

    // ----------------------------
    // Collection loads
    // ----------------------------

    /// Start a new load pass; everything fetched for it must present the
    /// returned generation when applying.
    pub fn begin_load(&mut self) -> u64 {
        self.load_gen += 1;
        self.load_gen
    }

    /// Replace the bed list wholesale. Cards for surviving ids keep their
    /// expansion and toggle sequence; vanished ids are dropped, new ids
    /// start collapsed. Returns false (and changes nothing) if `gen` has
    /// been superseded.
    pub fn apply_beds(&mut self, gen: u64, beds: Vec<PlantBed>) -> bool {
        if gen != self.load_gen {
            return false;
        }

        let mut cards = HashMap::with_capacity(beds.len());
        for bed in &beds {
            let card = self
                .cards
                .remove(&bed.id)
                .unwrap_or(CardState {
                    expanded: false,
                    toggle_seq: 0,
                });
            cards.insert(bed.id, card);
        }

        self.push_event(EventKind::Load, format!("{} bed(s) loaded", beds.len()));
        self.beds = beds;
        self.cards = cards;
        true
    }

    pub fn apply_sensors(&mut self, gen: u64, sensors: Vec<Sensor>) -> bool {
        if gen != self.load_gen {
            return false;
        }
        self.push_event(EventKind::Load, format!("{} sensor(s) cached", sensors.len()));
        self.sensors.ingest(sensors);
        true
    }

    pub fn apply_valves(&mut self, gen: u64, valves: Vec<Valve>) -> bool {
        if gen != self.load_gen {
            return false;
        }
        self.push_event(EventKind::Load, format!("{} valve(s) cached", valves.len()));
        self.valves.ingest(valves);
        true
    }

    // ----------------------------
    // Card expansion
    // ----------------------------

    /// Flip one card's expansion. Purely local; no other card is touched.
    /// Returns the new state, or None for an unknown bed id.
    pub fn toggle_expansion(&mut self, bed_id: i64) -> Option<bool> {
        let card = self.cards.get_mut(&bed_id)?;
        card.expanded = !card.expanded;
        Some(card.expanded)
    }

    // ----------------------------
    // Active toggle
    // ----------------------------

    /// Snapshot a bed for a toggle request and claim a new sequence number
    /// for it. Returns None for an unknown bed id.
    pub fn begin_toggle(&mut self, bed_id: i64) -> Option<(PlantBed, u64)> {
        let bed = self.beds.iter().find(|b| b.id == bed_id)?.clone();
        let card = self.cards.get_mut(&bed_id)?;
        card.toggle_seq += 1;
        Some((bed, card.toggle_seq))
    }

    /// Apply an acknowledged toggle: set the bed's `active` to the value the
    /// backend confirmed. Discarded (returns false) if a newer toggle has
    /// been issued for the bed since, or the bed vanished from the list.
    pub fn confirm_toggle(&mut self, bed_id: i64, seq: u64, active: bool) -> bool {
        let current = self.cards.get(&bed_id).map(|c| c.toggle_seq);
        if current != Some(seq) {
            return false;
        }
        let Some(bed) = self.beds.iter_mut().find(|b| b.id == bed_id) else {
            return false;
        };
        bed.active = active;
        self.push_event(
            EventKind::Toggle,
            format!("bed {bed_id} set {}", if active { "active" } else { "inactive" }),
        );
        true
    }

    // ----------------------------
    // Diagnostics
    // ----------------------------

    pub fn record_error(&mut self, detail: String) {
        self.push_event(EventKind::Error, detail);
    }

    pub fn record_system(&mut self, detail: String) {
        self.push_event(EventKind::System, detail);
    }

    fn push_event(&mut self, kind: EventKind, detail: String) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(DashboardEvent {
            ts: OffsetDateTime::now_utc(),
            kind,
            detail,
        });
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
