use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{EventKind, SubjectId};

/// Subject-facing warning raised for an admitted alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub subject: SubjectId,
    pub event: EventKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Warning {
    pub fn new(subject: SubjectId, event: EventKind, at: DateTime<Utc>) -> Self {
        Self {
            subject,
            event,
            message: message_for(event).to_string(),
            at,
        }
    }
}

fn message_for(event: EventKind) -> &'static str {
    match event {
        EventKind::Drowsiness => "You seem drowsy. Consider a short break.",
        EventKind::Blinking => "Frequent blinking detected.",
        EventKind::LookingAway => "Please keep your eyes on the screen.",
        EventKind::HeadDown => "Please keep your head up.",
        EventKind::Talking => "Talking detected.",
        EventKind::CameraOff => "Camera appears to be off.",
        EventKind::UserAbsent => "You have left the screen.",
    }
}

/// Bounded queue of pending warnings, drained by the presentation layer.
#[derive(Debug, Clone)]
pub struct WarningQueue {
    pending: VecDeque<Warning>,
    capacity: usize,
}

impl WarningQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn issue(&mut self, warning: Warning) {
        if self.pending.len() == self.capacity {
            self.pending.pop_front();
        }
        self.pending.push_back(warning);
    }

    pub fn drain(&mut self) -> Vec<Warning> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
