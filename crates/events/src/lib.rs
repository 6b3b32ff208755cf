#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Engine Events
//!
//! The execution event broker and its standard subscribers (spec §4.4-§4.5).
//!
//! [`ExecutionBroker`] delivers [`ExecutionEvent`]s synchronously, in
//! registration order, to a fixed set of [`Observer`]s. Three subscribers
//! ship with the engine: [`HistoryRecorder`], [`UsageCollector`] and
//! [`EventBroadcaster`]. A separate, best-effort [`EventStream`] carries the
//! same events to UI-facing consumers without the ordered-delivery
//! guarantee.

mod broadcaster;
mod event;
mod history;
mod stream;
mod usage;

pub use broadcaster::EventBroadcaster;
pub use event::{ExecutionBroker, ExecutionEvent, Observer};
pub use history::{HistoryEntry, HistoryRecorder};
pub use stream::EventStream;
pub use usage::{NodeExecutionRecord, PayloadUsage, UsageCollector};
