//! Toast notifications for went-live transitions and check failures.

pub mod queue;
pub mod sink;
pub mod types;

pub use queue::NotificationQueue;
pub use sink::{ConsoleSink, NotificationSink};
pub use types::{Toast, ToastKind, WatchEvent};
