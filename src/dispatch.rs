use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::SinkError;
use crate::sink::{EventLog, Notifier, SinkRunner};
use crate::types::{EventKind, LedgerEntry, SubjectId};

const SINK_QUEUE_DEPTH: usize = 16;

/// Outcome of routing one verdict through the throttle.
#[derive(Debug)]
pub enum Dispatch {
    Suppressed,
    Admitted(DispatchReport),
    /// Non-alertable verdict: written to the event log, never throttled.
    Logged(Result<(), SinkError>),
}

impl Dispatch {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Dispatch::Admitted(_))
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            Dispatch::Admitted(report) => Some(report),
            Dispatch::Suppressed | Dispatch::Logged(_) => None,
        }
    }
}

/// What happened to each sink for an admitted alert. The ledger entry is
/// recorded regardless of these results.
#[derive(Debug)]
pub struct DispatchReport {
    pub entry: LedgerEntry,
    pub logged: Result<(), SinkError>,
    pub notified: Result<(), SinkError>,
}

pub struct Dispatcher {
    log: Arc<dyn EventLog>,
    notifier: Arc<dyn Notifier>,
    log_runner: SinkRunner,
    notify_runner: SinkRunner,
}

impl Dispatcher {
    pub fn new(
        log: Arc<dyn EventLog>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            log_runner: SinkRunner::spawn(log.name(), timeout, SINK_QUEUE_DEPTH)?,
            notify_runner: SinkRunner::spawn(notifier.name(), timeout, SINK_QUEUE_DEPTH)?,
            log,
            notifier,
        })
    }

    /// Log, then notify. A notify failure never undoes the log write.
    pub fn deliver(&self, entry: LedgerEntry) -> DispatchReport {
        let logged = self.log_event(entry.subject, entry.event);

        let notifier = Arc::clone(&self.notifier);
        let subject = entry.subject;
        let notified = self.notify_runner.run(move || notifier.notify(&subject));
        if let Err(err) = &notified {
            warn!(
                subject = %subject,
                event = %entry.event,
                sink = self.notify_runner.name(),
                error = %err,
                "notification dropped"
            );
        }

        DispatchReport {
            entry,
            logged,
            notified,
        }
    }

    pub fn log_event(&self, subject: SubjectId, event: EventKind) -> Result<(), SinkError> {
        let log = Arc::clone(&self.log);
        let result = self.log_runner.run(move || log.log_event(&subject, event));
        match &result {
            Ok(()) => debug!(subject = %subject, event = %event, "event logged"),
            Err(err) => warn!(
                subject = %subject,
                event = %event,
                sink = self.log_runner.name(),
                error = %err,
                "event log write failed"
            ),
        }
        result
    }
}
