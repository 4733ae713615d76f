use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Width of a subject digest, in bytes.
pub const SUBJECT_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectId {
    /// Alerts raised without a face to attribute them to (camera off, user absent).
    Unknown,
    Face([u8; SUBJECT_ID_LEN]),
}

impl SubjectId {
    pub fn is_unknown(&self) -> bool {
        matches!(self, SubjectId::Unknown)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Unknown => f.write_str("unknown"),
            SubjectId::Face(digest) => f.write_str(&hex::encode(digest)),
        }
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    Drowsiness,
    Blinking,
    LookingAway,
    HeadDown,
    Talking,
    CameraOff,
    UserAbsent,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Drowsiness,
        EventKind::Blinking,
        EventKind::LookingAway,
        EventKind::HeadDown,
        EventKind::Talking,
        EventKind::CameraOff,
        EventKind::UserAbsent,
    ];

    /// Blinks are a continuous signal: logged every time, never throttled.
    pub fn is_alertable(self) -> bool {
        self != EventKind::Blinking
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Drowsiness => "Drowsiness",
            EventKind::Blinking => "Blinking",
            EventKind::LookingAway => "Looking Away",
            EventKind::HeadDown => "Head Down",
            EventKind::Talking => "Talking",
            EventKind::CameraOff => "Camera turned off",
            EventKind::UserAbsent => "User left screen",
        }
    }

    /// Short badge shown in the live status line.
    pub fn badge(self) -> &'static str {
        match self {
            EventKind::Drowsiness => "Drowsy",
            EventKind::Blinking => "Blinking",
            EventKind::LookingAway => "Looking Away",
            EventKind::HeadDown => "Head Down",
            EventKind::Talking => "Talking",
            EventKind::CameraOff => "Camera Off",
            EventKind::UserAbsent => "Away",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub subject: SubjectId,
    pub event: EventKind,
}

impl ThrottleKey {
    pub fn new(subject: SubjectId, event: EventKind) -> Self {
        Self { subject, event }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Suppressed,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub subject: SubjectId,
    pub event: EventKind,
    pub at: DateTime<Utc>,
}

/// 2-D landmark in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct Observation<F> {
    /// `None` when the capture read failed.
    pub frame: Option<F>,
    pub live: bool,
}

impl<F> Observation<F> {
    pub fn camera_ok(&self) -> bool {
        self.frame.is_some() && self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_subject_displays_as_unknown() {
        assert_eq!(SubjectId::Unknown.to_string(), "unknown");
        assert!(SubjectId::Unknown.is_unknown());
    }

    #[test]
    fn face_subject_displays_as_hex() {
        let id = SubjectId::Face([0xab; SUBJECT_ID_LEN]);
        assert_eq!(id.to_string(), "ab".repeat(SUBJECT_ID_LEN));
    }

    #[test]
    fn only_blinking_is_log_only() {
        let log_only: Vec<_> = EventKind::ALL
            .iter()
            .filter(|kind| !kind.is_alertable())
            .collect();
        assert_eq!(log_only, vec![&EventKind::Blinking]);
    }

    #[test]
    fn live_frame_without_image_is_camera_off() {
        let obs: Observation<()> = Observation {
            frame: None,
            live: true,
        };
        assert!(!obs.camera_ok());
    }
}
