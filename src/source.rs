//! Boundaries to the capture device, face detector, and per-face classifiers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::identity::Landmarks;
use crate::types::{EventKind, Point};

pub trait FrameSource {
    type Frame;

    /// `None` when the read failed.
    fn next_frame(&mut self) -> Option<Self::Frame>;

    /// Independent of read success: a camera can deliver frames while an
    /// external heuristic flags it as not live.
    fn is_live(&self) -> bool;

    fn release(&mut self);
}

/// Owns an opened [`FrameSource`] and releases it when dropped.
pub struct CaptureGuard<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> CaptureGuard<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for CaptureGuard<S> {
    fn drop(&mut self) {
        self.source.release();
        tracing::debug!("capture released");
    }
}

pub trait LandmarkDetector {
    type Frame;
    type Gray;
    type Region;

    fn grayscale(&self, frame: &Self::Frame) -> Self::Gray;
    fn detect_faces(&self, gray: &Self::Gray) -> Vec<Self::Region>;
    fn landmarks_for(&self, gray: &Self::Gray, region: &Self::Region) -> Vec<Point>;
}

/// Stateless per-face predicates.
pub trait FaceClassifier {
    fn is_drowsy(&self, landmarks: &Landmarks) -> bool;
    fn is_blinking(&self, landmarks: &Landmarks) -> bool;
    fn is_looking_away(&self, landmarks: &Landmarks) -> bool;
    fn is_head_down(&self, landmarks: &Landmarks) -> bool;
    fn is_talking(&self, landmarks: &Landmarks) -> bool;
}

pub type Check<C> = fn(&C, &Landmarks) -> bool;

/// Evaluation order of the per-face checks; only affects display order.
pub fn checks<C: FaceClassifier>() -> [(EventKind, Check<C>); 5] {
    [
        (EventKind::Drowsiness, C::is_drowsy),
        (EventKind::Blinking, C::is_blinking),
        (EventKind::LookingAway, C::is_looking_away),
        (EventKind::HeadDown, C::is_head_down),
        (EventKind::Talking, C::is_talking),
    ]
}

/// Cooperative stop flag, checked once per frame boundary.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
