//! Logging and notification sinks, and the bounded-time runner that calls them.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::SinkError;
use crate::types::{EventKind, SubjectId};

/// Durable record of detected events.
pub trait EventLog: Send + Sync {
    fn name(&self) -> &str;
    fn log_event(&self, subject: &SubjectId, event: EventKind) -> Result<(), SinkError>;
}

/// Best-effort notification of a supervisor.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    fn notify(&self, subject: &SubjectId) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn name(&self) -> &str {
        "tracing-log"
    }

    fn log_event(&self, subject: &SubjectId, event: EventKind) -> Result<(), SinkError> {
        tracing::info!(subject = %subject, event = %event, "activity");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn name(&self) -> &str {
        "tracing-notify"
    }

    fn notify(&self, subject: &SubjectId) -> Result<(), SinkError> {
        tracing::warn!(subject = %subject, "supervisor notified");
        Ok(())
    }
}

#[derive(Serialize)]
struct ActivityRecord<'a> {
    subject: &'a SubjectId,
    event: EventKind,
    at: DateTime<Utc>,
}

/// Appends one JSON object per event to a file.
pub struct JsonlEventLog {
    writer: Mutex<BufWriter<File>>,
    clock: Arc<dyn Clock>,
}

impl JsonlEventLog {
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            clock,
        })
    }
}

impl EventLog for JsonlEventLog {
    fn name(&self) -> &str {
        "jsonl-log"
    }

    fn log_event(&self, subject: &SubjectId, event: EventKind) -> Result<(), SinkError> {
        let record = ActivityRecord {
            subject,
            event,
            at: self.clock.now(),
        };
        let line = serde_json::to_string(&record)?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

type Job = Box<dyn FnOnce() -> Result<(), SinkError> + Send>;

struct Request {
    job: Job,
    reply: Sender<Result<(), SinkError>>,
}

/// Runs sink calls on a dedicated worker thread and waits at most `timeout`
/// for each one.
///
/// A call that overruns is abandoned: the caller gets
/// [`SinkError::TimedOut`] and the worker's eventual result is dropped.
/// Calls are never retried.
pub struct SinkRunner {
    name: String,
    jobs: Sender<Request>,
    timeout: Duration,
}

impl SinkRunner {
    pub fn spawn(name: &str, timeout: Duration, queue_depth: usize) -> Result<Self, SinkError> {
        let (jobs, rx) = bounded::<Request>(queue_depth.max(1));
        thread::Builder::new()
            .name(format!("sink-{name}"))
            .spawn(move || {
                for request in rx.iter() {
                    let result = (request.job)();
                    // The caller may have given up waiting.
                    let _ = request.reply.send(result);
                }
            })?;

        Ok(Self {
            name: name.to_string(),
            jobs,
            timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn run<F>(&self, job: F) -> Result<(), SinkError>
    where
        F: FnOnce() -> Result<(), SinkError> + Send + 'static,
    {
        let (reply, result) = bounded(1);
        self.jobs
            .try_send(Request {
                job: Box::new(job),
                reply,
            })
            .map_err(|err| match err {
                TrySendError::Full(_) => SinkError::Busy,
                TrySendError::Disconnected(_) => SinkError::Disconnected,
            })?;

        match result.recv_timeout(self.timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(SinkError::TimedOut(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(SinkError::Disconnected),
        }
    }
}
