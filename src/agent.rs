use std::sync::Arc;

use tracing::warn;

use crate::session::MonitorSession;
use crate::source::{checks, FaceClassifier, LandmarkDetector};
use crate::types::{EventKind, Observation, SubjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    CameraOff,
    NoFace,
    Monitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertOutcome {
    pub subject: SubjectId,
    pub event: EventKind,
    pub admitted: bool,
}

/// Subject-facing summary of one processed frame. Sink failures are not part
/// of it; they only go to the operator log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub status: FrameStatus,
    pub faces: usize,
    pub skipped_faces: usize,
    pub blinks: usize,
    /// Verdicts raised this frame, admitted or not, in check order.
    pub live_alerts: Vec<EventKind>,
    pub alerts: Vec<AlertOutcome>,
}

impl FrameReport {
    fn new(status: FrameStatus) -> Self {
        Self {
            status,
            faces: 0,
            skipped_faces: 0,
            blinks: 0,
            live_alerts: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn admitted(&self) -> usize {
        self.alerts.iter().filter(|a| a.admitted).count()
    }

    pub fn status_line(&self) -> String {
        if self.live_alerts.is_empty() {
            return "Monitoring".to_string();
        }
        let badges: Vec<_> = self.live_alerts.iter().map(|e| e.badge()).collect();
        format!("Live Alerts: {}", badges.join(", "))
    }
}

pub struct MonitorAgent<D, C> {
    session: Arc<MonitorSession>,
    detector: D,
    classifier: C,
    status: FrameStatus,
    skipped_faces: u64,
}

impl<D, C> MonitorAgent<D, C>
where
    D: LandmarkDetector,
    C: FaceClassifier,
{
    pub fn new(session: Arc<MonitorSession>, detector: D, classifier: C) -> Self {
        Self {
            session,
            detector,
            classifier,
            status: FrameStatus::Monitoring,
            skipped_faces: 0,
        }
    }

    pub fn current_status(&self) -> FrameStatus {
        self.status
    }

    pub fn session(&self) -> &Arc<MonitorSession> {
        &self.session
    }

    pub fn skipped_faces(&self) -> u64 {
        self.skipped_faces
    }

    pub fn step(&mut self, obs: Observation<D::Frame>) -> FrameReport {
        let report = match obs {
            Observation {
                frame: Some(frame),
                live: true,
            } => self.process_frame(&frame),
            _ => self.camera_off(),
        };
        self.status = report.status;
        report
    }

    fn camera_off(&mut self) -> FrameReport {
        if self.status != FrameStatus::CameraOff {
            warn!("camera is off or not live");
        }
        let mut report = FrameReport::new(FrameStatus::CameraOff);
        self.alert(&mut report, SubjectId::Unknown, EventKind::CameraOff);
        report
    }

    fn process_frame(&mut self, frame: &D::Frame) -> FrameReport {
        let gray = self.detector.grayscale(frame);
        let faces = self.detector.detect_faces(&gray);

        if faces.is_empty() {
            let mut report = FrameReport::new(FrameStatus::NoFace);
            if self.session.observe_presence(false) {
                self.alert(&mut report, SubjectId::Unknown, EventKind::UserAbsent);
            }
            return report;
        }
        self.session.observe_presence(true);

        let mut report = FrameReport::new(FrameStatus::Monitoring);
        report.faces = faces.len();

        for region in &faces {
            let points = self.detector.landmarks_for(&gray, region);
            let landmarks = match self.session.resolver().landmarks(points) {
                Ok(landmarks) => landmarks,
                Err(err) => {
                    warn!(error = %err, "skipping face with malformed landmarks");
                    report.skipped_faces += 1;
                    self.skipped_faces += 1;
                    continue;
                }
            };
            let subject = self.session.resolver().resolve(&landmarks);

            for (event, check) in checks::<C>() {
                if !check(&self.classifier, &landmarks) {
                    continue;
                }
                if event.is_alertable() {
                    report.live_alerts.push(event);
                    self.alert(&mut report, subject, event);
                } else {
                    // Sink failure is already logged by the dispatcher.
                    let _ = self.session.record_blink(subject);
                    report.blinks += 1;
                }
            }
        }

        report
    }

    fn alert(&self, report: &mut FrameReport, subject: SubjectId, event: EventKind) {
        let outcome = self.session.dispatch(subject, event);
        report.alerts.push(AlertOutcome {
            subject,
            event,
            admitted: outcome.is_admitted(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MonitorConfig;
    use crate::identity::Landmarks;
    use crate::sink::{TracingEventLog, TracingNotifier};
    use crate::types::Point;

    /// Frame is the list of faces; each face is its landmark list.
    struct ListDetector;

    impl LandmarkDetector for ListDetector {
        type Frame = Vec<Vec<Point>>;
        type Gray = Vec<Vec<Point>>;
        type Region = usize;

        fn grayscale(&self, frame: &Self::Frame) -> Self::Gray {
            frame.clone()
        }

        fn detect_faces(&self, gray: &Self::Gray) -> Vec<usize> {
            (0..gray.len()).collect()
        }

        fn landmarks_for(&self, gray: &Self::Gray, region: &usize) -> Vec<Point> {
            gray[*region].clone()
        }
    }

    /// Flags driven by the first landmark's x coordinate bits.
    struct BitClassifier;

    fn bit(landmarks: &Landmarks, n: u32) -> bool {
        landmarks.points()[0].x & (1 << n) != 0
    }

    impl FaceClassifier for BitClassifier {
        fn is_drowsy(&self, l: &Landmarks) -> bool {
            bit(l, 0)
        }
        fn is_blinking(&self, l: &Landmarks) -> bool {
            bit(l, 1)
        }
        fn is_looking_away(&self, l: &Landmarks) -> bool {
            bit(l, 2)
        }
        fn is_head_down(&self, l: &Landmarks) -> bool {
            bit(l, 3)
        }
        fn is_talking(&self, l: &Landmarks) -> bool {
            bit(l, 4)
        }
    }

    fn agent(clock: Arc<ManualClock>) -> MonitorAgent<ListDetector, BitClassifier> {
        let config = MonitorConfig::default()
            .with_landmark_count(2)
            .with_absence_threshold_secs(2);
        let session = MonitorSession::new(
            config,
            clock,
            Arc::new(TracingEventLog),
            Arc::new(TracingNotifier),
        )
        .unwrap();
        MonitorAgent::new(Arc::new(session), ListDetector, BitClassifier)
    }

    fn face(flags: i32) -> Vec<Point> {
        vec![Point::new(flags, 10), Point::new(20, 30)]
    }

    fn frame(faces: Vec<Vec<Point>>) -> Observation<Vec<Vec<Point>>> {
        Observation {
            frame: Some(faces),
            live: true,
        }
    }

    #[test]
    fn camera_off_raises_unknown_alert_once_per_window() {
        let clock = Arc::new(ManualClock::at_epoch());
        let mut agent = agent(clock.clone());

        let first = agent.step(Observation {
            frame: None,
            live: true,
        });
        assert_eq!(first.status, FrameStatus::CameraOff);
        assert_eq!(first.admitted(), 1);

        clock.advance_secs(1);
        let second = agent.step(Observation {
            frame: Some(vec![face(0)]),
            live: false,
        });
        assert_eq!(second.status, FrameStatus::CameraOff);
        assert_eq!(second.admitted(), 0);
        assert_eq!(agent.current_status(), FrameStatus::CameraOff);
    }

    #[test]
    fn checks_run_in_fixed_order() {
        let clock = Arc::new(ManualClock::at_epoch());
        let mut agent = agent(clock);

        // talking, looking away, drowsy, blinking
        let report = agent.step(frame(vec![face(0b10111)]));
        assert_eq!(
            report.live_alerts,
            vec![EventKind::Drowsiness, EventKind::LookingAway, EventKind::Talking]
        );
        assert_eq!(report.blinks, 1);
        assert_eq!(report.status_line(), "Live Alerts: Drowsy, Looking Away, Talking");
        assert_eq!(agent.session().ledger_len(), 3);
    }

    #[test]
    fn blinks_are_never_throttled() {
        let clock = Arc::new(ManualClock::at_epoch());
        let mut agent = agent(clock);

        let blinks: usize = (0..5)
            .map(|_| agent.step(frame(vec![face(0b00010)])).blinks)
            .sum();
        assert_eq!(blinks, 5);
        assert_eq!(agent.session().ledger_len(), 0);
    }

    #[test]
    fn malformed_face_is_skipped_and_others_processed() {
        let clock = Arc::new(ManualClock::at_epoch());
        let mut agent = agent(clock);

        let report = agent.step(frame(vec![vec![Point::new(1, 1)], face(0b01000)]));
        assert_eq!(report.faces, 2);
        assert_eq!(report.skipped_faces, 1);
        assert_eq!(report.live_alerts, vec![EventKind::HeadDown]);
        assert_eq!(agent.skipped_faces(), 1);
    }

    #[test]
    fn sustained_absence_raises_user_absent() {
        let clock = Arc::new(ManualClock::at_epoch());
        let mut agent = agent(clock.clone());

        agent.step(frame(vec![face(0)]));
        clock.advance_secs(1);
        let early = agent.step(frame(vec![]));
        assert_eq!(early.status, FrameStatus::NoFace);
        assert!(early.alerts.is_empty());

        clock.advance_secs(1);
        let late = agent.step(frame(vec![]));
        assert_eq!(
            late.alerts,
            vec![AlertOutcome {
                subject: SubjectId::Unknown,
                event: EventKind::UserAbsent,
                admitted: true,
            }]
        );
        assert_eq!(late.status_line(), "Monitoring");
    }

    #[test]
    fn quiet_face_reports_monitoring() {
        let clock = Arc::new(ManualClock::at_epoch());
        let mut agent = agent(clock);
        let report = agent.step(frame(vec![face(0)]));
        assert_eq!(report.status, FrameStatus::Monitoring);
        assert_eq!(report.status_line(), "Monitoring");
    }
}
