//! Scripted capture for demos and tests.
//!
//! A [`ReplayScript`] lists frames up front, each with the faces present and
//! the verdicts the classifiers should return for them. The camera advances a
//! [`ManualClock`] by a fixed interval per frame, so a replay runs on script
//! time rather than wall time.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};

use crate::clock::ManualClock;
use crate::error::ConfigError;
use crate::identity::Landmarks;
use crate::source::{FaceClassifier, FrameSource, LandmarkDetector, StopSignal};
use crate::types::Point;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFace {
    pub landmarks: Vec<Point>,
    #[serde(default)]
    pub drowsy: bool,
    #[serde(default)]
    pub blinking: bool,
    #[serde(default)]
    pub looking_away: bool,
    #[serde(default)]
    pub head_down: bool,
    #[serde(default)]
    pub talking: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptFrame {
    /// Capture read failed.
    CameraOff,
    /// Frame delivered but the liveness probe says the camera is off.
    NotLive,
    Faces { faces: Vec<ScriptFace> },
}

fn default_interval_ms() -> i64 {
    1_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_interval_ms")]
    pub frame_interval_ms: i64,
    pub frames: Vec<ScriptFrame>,
}

impl ReplayScript {
    pub fn new(frames: Vec<ScriptFrame>) -> Self {
        Self {
            frame_interval_ms: default_interval_ms(),
            frames,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Classifier that answers from this script's per-face flags.
    pub fn classifier(&self) -> ReplayClassifier {
        let mut verdicts = HashMap::new();
        for frame in &self.frames {
            if let ScriptFrame::Faces { faces } = frame {
                for face in faces {
                    verdicts.insert(face.landmarks.clone(), face.clone());
                }
            }
        }
        ReplayClassifier { verdicts }
    }

    pub fn camera(&self, clock: Arc<ManualClock>, stop: StopSignal) -> ReplayCamera {
        ReplayCamera {
            frames: self.frames.clone(),
            cursor: 0,
            live: true,
            interval: ChronoDuration::milliseconds(self.frame_interval_ms),
            clock,
            stop,
        }
    }
}

pub type ReplayFrame = Vec<ScriptFace>;

pub struct ReplayCamera {
    frames: Vec<ScriptFrame>,
    cursor: usize,
    live: bool,
    interval: ChronoDuration,
    clock: Arc<ManualClock>,
    stop: StopSignal,
}

impl ReplayCamera {
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

impl FrameSource for ReplayCamera {
    type Frame = ReplayFrame;

    fn next_frame(&mut self) -> Option<ReplayFrame> {
        if self.cursor > 0 {
            self.clock.advance(self.interval);
        }
        let frame = self.frames.get(self.cursor).cloned();
        self.cursor += 1;
        if self.cursor >= self.frames.len() {
            self.stop.stop();
        }

        match frame {
            Some(ScriptFrame::Faces { faces }) => {
                self.live = true;
                Some(faces)
            }
            Some(ScriptFrame::NotLive) => {
                self.live = false;
                Some(Vec::new())
            }
            Some(ScriptFrame::CameraOff) | None => {
                self.live = true;
                None
            }
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn release(&mut self) {
        tracing::debug!(remaining = self.remaining(), "replay camera released");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl LandmarkDetector for ReplayDetector {
    type Frame = ReplayFrame;
    type Gray = ReplayFrame;
    type Region = usize;

    fn grayscale(&self, frame: &ReplayFrame) -> ReplayFrame {
        frame.clone()
    }

    fn detect_faces(&self, gray: &ReplayFrame) -> Vec<usize> {
        (0..gray.len()).collect()
    }

    fn landmarks_for(&self, gray: &ReplayFrame, region: &usize) -> Vec<Point> {
        gray.get(*region)
            .map(|face| face.landmarks.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReplayClassifier {
    verdicts: HashMap<Vec<Point>, ScriptFace>,
}

impl ReplayClassifier {
    fn flag(&self, landmarks: &Landmarks, pick: fn(&ScriptFace) -> bool) -> bool {
        self.verdicts
            .get(landmarks.points())
            .map(pick)
            .unwrap_or(false)
    }
}

impl FaceClassifier for ReplayClassifier {
    fn is_drowsy(&self, landmarks: &Landmarks) -> bool {
        self.flag(landmarks, |f| f.drowsy)
    }

    fn is_blinking(&self, landmarks: &Landmarks) -> bool {
        self.flag(landmarks, |f| f.blinking)
    }

    fn is_looking_away(&self, landmarks: &Landmarks) -> bool {
        self.flag(landmarks, |f| f.looking_away)
    }

    fn is_head_down(&self, landmarks: &Landmarks) -> bool {
        self.flag(landmarks, |f| f.head_down)
    }

    fn is_talking(&self, landmarks: &Landmarks) -> bool {
        self.flag(landmarks, |f| f.talking)
    }
}

/// Landmark set of `count` points, offset so different `seed`s give
/// different subjects.
pub fn synthetic_landmarks(count: usize, seed: i32) -> Vec<Point> {
    (0..count as i32)
        .map(|i| Point::new(200 + seed * 7 + (i % 17) * 3, 150 + seed * 5 + (i / 17) * 11))
        .collect()
}

/// Short built-in session: a drowsy subject, a talker, a camera drop and a walk-away.
pub fn demo_script(landmark_count: usize) -> ReplayScript {
    let a = synthetic_landmarks(landmark_count, 0);
    let b = synthetic_landmarks(landmark_count, 1);
    let drowsy = ScriptFace {
        landmarks: a,
        drowsy: true,
        blinking: true,
        ..Default::default()
    };
    let talking = ScriptFace {
        landmarks: b,
        talking: true,
        looking_away: true,
        ..Default::default()
    };

    let mut frames = vec![
        ScriptFrame::Faces {
            faces: vec![drowsy.clone(), talking.clone()],
        },
        ScriptFrame::Faces {
            faces: vec![drowsy.clone()],
        },
        ScriptFrame::CameraOff,
        ScriptFrame::NotLive,
    ];
    frames.extend(std::iter::repeat(ScriptFrame::Faces { faces: vec![] }).take(7));
    frames.push(ScriptFrame::Faces {
        faces: vec![drowsy, talking],
    });
    ReplayScript::new(frames)
}
