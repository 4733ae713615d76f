use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::absence::AbsenceTracker;
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::{MonitorError, SinkError};
use crate::identity::IdentityResolver;
use crate::ledger::SessionLedger;
use crate::sink::{EventLog, Notifier};
use crate::throttle::AlertThrottle;
use crate::types::{Admission, EventKind, LedgerEntry, SubjectId, ThrottleKey};
use crate::warning::{Warning, WarningQueue};

#[derive(Debug)]
struct SessionState {
    throttle: AlertThrottle,
    absence: AbsenceTracker,
    ledger: SessionLedger,
    warnings: WarningQueue,
}

impl SessionState {
    fn new(config: &MonitorConfig) -> Self {
        Self {
            throttle: AlertThrottle::new(config.cooldown()),
            absence: AbsenceTracker::new(config.absence_threshold()),
            ledger: match config.ledger_capacity {
                Some(capacity) => SessionLedger::bounded(capacity),
                None => SessionLedger::new(),
            },
            warnings: WarningQueue::new(config.warning_capacity),
        }
    }
}

/// Shared by every frame worker through an `Arc`. All state mutation goes
/// through one lock; sink calls happen after it is released.
pub struct MonitorSession {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    resolver: IdentityResolver,
    dispatcher: Dispatcher,
    state: Mutex<SessionState>,
}

impl MonitorSession {
    pub fn new(
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
        log: Arc<dyn EventLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let dispatcher = Dispatcher::new(log, notifier, config.sink_timeout())?;
        Ok(Self {
            resolver: IdentityResolver::new(config.landmark_count, config.coordinate_width),
            state: Mutex::new(SessionState::new(&config)),
            config,
            clock,
            dispatcher,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Throttle decision alone, without side effects.
    pub fn try_admit(&self, subject: SubjectId, event: EventKind) -> Admission {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.throttle.try_admit(ThrottleKey::new(subject, event), now)
    }

    /// Route one verdict through the throttle and, if admitted, record it and
    /// fan out to the sinks. Blinks skip the throttle and are only logged.
    pub fn dispatch(&self, subject: SubjectId, event: EventKind) -> Dispatch {
        if !event.is_alertable() {
            return Dispatch::Logged(self.record_blink(subject));
        }

        let entry = {
            let mut state = self.state.lock();
            // Read under the lock so ledger order matches timestamp order.
            let now = self.clock.now();
            let key = ThrottleKey::new(subject, event);
            if state.throttle.try_admit(key, now) == Admission::Suppressed {
                debug!(subject = %subject, event = %event, "alert suppressed by cooldown");
                return Dispatch::Suppressed;
            }
            let entry = LedgerEntry {
                subject,
                event,
                at: now,
            };
            state.ledger.append(entry.clone());
            state.warnings.issue(Warning::new(subject, event, now));
            entry
        };

        info!(subject = %subject, event = %event, "alert admitted");
        Dispatch::Admitted(self.dispatcher.deliver(entry))
    }

    /// Log a blink unconditionally. No throttle, no ledger entry.
    pub fn record_blink(&self, subject: SubjectId) -> Result<(), SinkError> {
        self.dispatcher.log_event(subject, EventKind::Blinking)
    }

    /// Feed this frame's presence and report whether the absence limit is exceeded.
    pub fn observe_presence(&self, face_detected: bool) -> bool {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.absence.update(face_detected, now);
        state.absence.exceeded_limit(now)
    }

    pub fn is_absent(&self) -> bool {
        self.state.lock().absence.is_absent()
    }

    pub fn ledger_snapshot(&self) -> Vec<LedgerEntry> {
        self.state.lock().ledger.snapshot()
    }

    pub fn ledger_len(&self) -> usize {
        self.state.lock().ledger.len()
    }

    pub fn drain_warnings(&self) -> Vec<Warning> {
        self.state.lock().warnings.drain()
    }

    /// Start a fresh session: forget cooldowns, absence, ledger, and warnings.
    pub fn restart(&self) {
        let mut state = self.state.lock();
        *state = SessionState::new(&self.config);
        info!("monitoring session restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sink::{TracingEventLog, TracingNotifier};

    fn session(clock: Arc<ManualClock>) -> MonitorSession {
        MonitorSession::new(
            MonitorConfig::default().with_absence_threshold_secs(2),
            clock,
            Arc::new(TracingEventLog),
            Arc::new(TracingNotifier),
        )
        .unwrap()
    }

    #[test]
    fn admitted_alert_lands_in_ledger_and_warnings() {
        let clock = Arc::new(ManualClock::at_epoch());
        let session = session(clock.clone());

        let outcome = session.dispatch(SubjectId::Unknown, EventKind::CameraOff);
        assert!(outcome.is_admitted());
        assert_eq!(session.ledger_len(), 1);

        let warnings = session.drain_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].event, EventKind::CameraOff);
    }

    #[test]
    fn blink_bypasses_the_ledger() {
        let clock = Arc::new(ManualClock::at_epoch());
        let session = session(clock);
        let subject = SubjectId::Face([9; 16]);

        let outcome = session.dispatch(subject, EventKind::Blinking);
        assert!(matches!(outcome, Dispatch::Logged(Ok(()))));
        assert!(!outcome.is_admitted());
        assert!(session.record_blink(subject).is_ok());
        assert_eq!(session.ledger_len(), 0);
        assert_eq!(session.try_admit(subject, EventKind::Blinking), Admission::Admitted);
    }

    #[test]
    fn restart_forgets_cooldowns_and_ledger() {
        let clock = Arc::new(ManualClock::at_epoch());
        let session = session(clock);

        assert!(session.dispatch(SubjectId::Unknown, EventKind::UserAbsent).is_admitted());
        assert!(!session.dispatch(SubjectId::Unknown, EventKind::UserAbsent).is_admitted());

        session.restart();
        assert_eq!(session.ledger_len(), 0);
        assert!(session.dispatch(SubjectId::Unknown, EventKind::UserAbsent).is_admitted());
    }

    #[test]
    fn presence_feeds_the_absence_tracker() {
        let clock = Arc::new(ManualClock::at_epoch());
        let session = session(clock.clone());

        assert!(!session.observe_presence(true));
        clock.advance_secs(1);
        assert!(!session.observe_presence(false));
        assert!(session.is_absent());
        clock.advance_secs(1);
        assert!(session.observe_presence(false));
        clock.advance_secs(1);
        assert!(!session.observe_presence(true));
        assert!(!session.is_absent());
    }

    #[test]
    fn invalid_config_fails_construction() {
        let result = MonitorSession::new(
            MonitorConfig::default().with_cooldown_secs(0),
            Arc::new(ManualClock::at_epoch()),
            Arc::new(TracingEventLog),
            Arc::new(TracingNotifier),
        );
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }
}
