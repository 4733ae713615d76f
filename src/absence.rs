use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    /// Absent since the last moment a face was confirmed.
    Absent { since: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct AbsenceTracker {
    state: Presence,
    last_seen: Option<DateTime<Utc>>,
    threshold: Duration,
}

impl AbsenceTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            state: Presence::Present,
            last_seen: None,
            threshold,
        }
    }

    pub fn state(&self) -> Presence {
        self.state
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.state, Presence::Absent { .. })
    }

    pub fn absent_since(&self) -> Option<DateTime<Utc>> {
        match self.state {
            Presence::Absent { since } => Some(since),
            Presence::Present => None,
        }
    }

    pub fn update(&mut self, face_detected: bool, now: DateTime<Utc>) {
        self.state = transition(self.state, face_detected, self.last_seen, now);
        if face_detected {
            self.last_seen = Some(now);
        }
    }

    /// Level query: stays true for every call while the absence lasts.
    pub fn exceeded_limit(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            Presence::Present => false,
            Presence::Absent { since } => match (now - since).to_std() {
                Ok(elapsed) => elapsed >= self.threshold,
                // Clock stepped backwards.
                Err(_) => false,
            },
        }
    }

    pub fn reset(&mut self) {
        self.state = Presence::Present;
        self.last_seen = None;
    }
}

fn transition(
    state: Presence,
    face_detected: bool,
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Presence {
    if face_detected {
        return Presence::Present;
    }

    match state {
        Presence::Present => Presence::Absent {
            since: last_seen.unwrap_or(now),
        },
        absent @ Presence::Absent { .. } => absent,
    }
}
