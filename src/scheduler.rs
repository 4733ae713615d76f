use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::agent::{FrameReport, FrameStatus, MonitorAgent};
use crate::error::MonitorError;
use crate::source::{CaptureGuard, FaceClassifier, FrameSource, LandmarkDetector, StopSignal};
use crate::types::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub frames: u64,
    pub camera_off_frames: u64,
    pub admitted_alerts: u64,
}

pub struct Scheduler<D, C> {
    agent: MonitorAgent<D, C>,
    frame_budget: Duration,
    retry_pause: Duration,
    deadline_misses: u64,
    worst_case: Duration,
    total_frames: u64,
}

impl<D, C> Scheduler<D, C>
where
    D: LandmarkDetector,
    C: FaceClassifier,
{
    pub fn new(agent: MonitorAgent<D, C>) -> Self {
        let config = agent.session().config();
        let frame_budget = config.frame_budget();
        let retry_pause = config.camera_retry_pause();

        Self {
            agent,
            frame_budget,
            retry_pause,
            deadline_misses: 0,
            worst_case: Duration::ZERO,
            total_frames: 0,
        }
    }

    pub fn agent(&self) -> &MonitorAgent<D, C> {
        &self.agent
    }

    pub fn deadline_misses(&self) -> u64 {
        self.deadline_misses
    }

    pub fn worst_case(&self) -> Duration {
        self.worst_case
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn tick(&mut self, observation: Observation<D::Frame>) -> FrameReport {
        let start = Instant::now();

        let report = self.agent.step(observation);

        let elapsed = start.elapsed();

        if elapsed > self.frame_budget {
            self.deadline_misses += 1;
        }

        if elapsed > self.worst_case {
            self.worst_case = elapsed;
        }

        self.total_frames += 1;
        report
    }

    /// Open the capture, then process frames until `stop` is raised or the
    /// source runs dry. The capture is released on every exit path.
    pub fn run<S, O>(&mut self, open: O, stop: &StopSignal) -> Result<RunSummary, MonitorError>
    where
        S: FrameSource<Frame = D::Frame>,
        O: FnOnce() -> Result<S, MonitorError>,
    {
        let mut capture = CaptureGuard::new(open()?);
        let mut summary = RunSummary::default();
        info!("monitoring started");

        while !stop.is_stopped() {
            let cycle_start = Instant::now();

            let source = capture.source();
            let frame = source.next_frame();
            let live = source.is_live();
            let report = self.tick(Observation { frame, live });

            summary.frames += 1;
            summary.admitted_alerts += report.admitted() as u64;
            debug!(status = %report.status_line(), "frame processed");

            let pause = if report.status == FrameStatus::CameraOff {
                summary.camera_off_frames += 1;
                self.retry_pause
            } else {
                self.frame_budget.saturating_sub(cycle_start.elapsed())
            };

            if !pause.is_zero() && !stop.is_stopped() {
                std::thread::sleep(pause);
            }
        }

        info!(
            frames = summary.frames,
            admitted = summary.admitted_alerts,
            deadline_misses = self.deadline_misses,
            "monitoring stopped"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MonitorConfig;
    use crate::identity::Landmarks;
    use crate::session::MonitorSession;
    use crate::sink::{TracingEventLog, TracingNotifier};
    use crate::types::Point;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct NoFaces;

    impl LandmarkDetector for NoFaces {
        type Frame = ();
        type Gray = ();
        type Region = ();

        fn grayscale(&self, _: &()) {}

        fn detect_faces(&self, _: &()) -> Vec<()> {
            Vec::new()
        }

        fn landmarks_for(&self, _: &(), _: &()) -> Vec<Point> {
            Vec::new()
        }
    }

    struct Never;

    impl FaceClassifier for Never {
        fn is_drowsy(&self, _: &Landmarks) -> bool {
            false
        }
        fn is_blinking(&self, _: &Landmarks) -> bool {
            false
        }
        fn is_looking_away(&self, _: &Landmarks) -> bool {
            false
        }
        fn is_head_down(&self, _: &Landmarks) -> bool {
            false
        }
        fn is_talking(&self, _: &Landmarks) -> bool {
            false
        }
    }

    /// Delivers `frames` reads, then raises the stop signal.
    struct Finite {
        frames: u32,
        ok: bool,
        stop: StopSignal,
        released: Arc<AtomicU32>,
    }

    impl FrameSource for Finite {
        type Frame = ();

        fn next_frame(&mut self) -> Option<()> {
            self.frames = self.frames.saturating_sub(1);
            if self.frames == 0 {
                self.stop.stop();
            }
            self.ok.then_some(())
        }

        fn is_live(&self) -> bool {
            true
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scheduler() -> Scheduler<NoFaces, Never> {
        let config = MonitorConfig::default().with_camera_retry_pause_ms(1);
        let session = MonitorSession::new(
            config,
            Arc::new(ManualClock::at_epoch()),
            Arc::new(TracingEventLog),
            Arc::new(TracingNotifier),
        )
        .unwrap();
        Scheduler::new(MonitorAgent::new(Arc::new(session), NoFaces, Never))
    }

    #[test]
    fn tick_updates_metrics() {
        let mut scheduler = scheduler();

        scheduler.tick(Observation {
            frame: Some(()),
            live: true,
        });

        assert_eq!(scheduler.total_frames(), 1);
        assert_eq!(scheduler.deadline_misses(), 0);
    }

    #[test]
    fn run_stops_at_frame_boundary_and_releases_capture() {
        let mut scheduler = scheduler();
        let stop = StopSignal::new();
        let released = Arc::new(AtomicU32::new(0));

        let source = Finite {
            frames: 3,
            ok: true,
            stop: stop.clone(),
            released: released.clone(),
        };
        let summary = scheduler.run(|| Ok(source), &stop).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.camera_off_frames, 0);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn camera_off_frames_are_throttled() {
        let mut scheduler = scheduler();
        let stop = StopSignal::new();
        let released = Arc::new(AtomicU32::new(0));

        let source = Finite {
            frames: 4,
            ok: false,
            stop: stop.clone(),
            released: released.clone(),
        };
        let summary = scheduler.run(|| Ok(source), &stop).unwrap();

        assert_eq!(summary.camera_off_frames, 4);
        // Clock never moves, so only the first camera-off alert is admitted.
        assert_eq!(summary.admitted_alerts, 1);
        assert_eq!(scheduler.agent().session().ledger_len(), 1);
    }

    #[test]
    fn open_failure_never_starts_the_loop() {
        let mut scheduler = scheduler();
        let stop = StopSignal::new();

        let result = scheduler.run::<Finite, _>(
            || Err(MonitorError::CameraUnavailable("device 0 busy".into())),
            &stop,
        );

        assert!(matches!(result, Err(MonitorError::CameraUnavailable(_))));
        assert_eq!(scheduler.total_frames(), 0);
    }

    #[test]
    fn preset_stop_skips_all_frames_but_still_releases() {
        let mut scheduler = scheduler();
        let stop = StopSignal::new();
        stop.stop();
        let released = Arc::new(AtomicU32::new(0));

        let source = Finite {
            frames: 10,
            ok: true,
            stop: stop.clone(),
            released: released.clone(),
        };
        let summary = scheduler.run(|| Ok(source), &stop).unwrap();

        assert_eq!(summary.frames, 0);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
