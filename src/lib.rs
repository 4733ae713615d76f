//! Attention monitoring agent.
//!
//! Turns noisy per-frame face verdicts into throttled, subject-scoped alerts:
//! - [`identity`] derives a subject id from a landmark set
//! - [`absence`] tracks how long no face has been seen
//! - [`throttle`] admits at most one alert per subject and event per cooldown
//! - [`session`] serializes those decisions and fans admitted alerts out to
//!   the log and notification sinks and the session ledger
//! - [`agent`] and [`scheduler`] drive it all from a frame source

pub mod absence;
pub mod agent;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod replay;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod source;
pub mod throttle;
pub mod types;
pub mod warning;

pub use agent::{FrameReport, FrameStatus, MonitorAgent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CoordinateWidth, MonitorConfig};
pub use dispatch::{Dispatch, DispatchReport};
pub use error::{ConfigError, LandmarkError, MonitorError, SinkError};
pub use ledger::{LedgerReport, SessionLedger};
pub use scheduler::{RunSummary, Scheduler};
pub use session::MonitorSession;
pub use source::{FaceClassifier, FrameSource, LandmarkDetector, StopSignal};
pub use types::{Admission, EventKind, LedgerEntry, Point, SubjectId, ThrottleKey};
