pub mod grading_flow;
pub mod observer;

pub use grading_flow::{AttemptFailure, GradingFlow, RetryPolicy, DEFAULT_RETRY_PAUSE, NO_RECORD_REASON};
pub use observer::{GradingObserver, TracingObserver};
