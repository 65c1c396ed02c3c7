//! Progress reporting for transfer operations.
//!
//! Callers inject a sink; operations emit `(percent, message, detail)`
//! events synchronously. Percent never decreases within one operation,
//! and the final event of a top-level operation lands at 100.

/// One progress update from a long-running operation.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Completion percentage, 0-100, non-decreasing within an operation.
    pub percent: u8,
    /// Human-readable status line.
    pub message: String,
    /// Optional structured payload, e.g. `{"transferred": 4, "total": 25}`.
    pub detail: Option<serde_json::Value>,
}

impl ProgressEvent {
    /// Create an event without detail.
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
            detail: None,
        }
    }

    /// Attach a structured detail payload.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Callback for progress updates during transfer operations.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

/// Tracks the high-water percent of one operation.
///
/// Sub-steps report their own local estimates; the tracker clamps any
/// regression so the stream stays monotonic even when a phase re-runs
/// (e.g. a chunk strategy escalation starting over).
pub struct ProgressTracker<'a> {
    callback: Option<&'a ProgressCallback>,
    last_percent: u8,
}

impl<'a> ProgressTracker<'a> {
    /// Create a tracker over an optional callback.
    pub fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            last_percent: 0,
        }
    }

    /// Report progress, clamping percent to the high-water mark.
    pub fn report(&mut self, percent: u8, message: impl Into<String>) {
        self.report_event(ProgressEvent::new(percent, message));
    }

    /// Report progress with a structured detail payload.
    pub fn report_detail(
        &mut self,
        percent: u8,
        message: impl Into<String>,
        detail: serde_json::Value,
    ) {
        self.report_event(ProgressEvent::new(percent, message).with_detail(detail));
    }

    fn report_event(&mut self, mut event: ProgressEvent) {
        event.percent = event.percent.max(self.last_percent).min(100);
        self.last_percent = event.percent;
        emit(self.callback, event);
    }

    /// The last percent reported.
    pub fn percent(&self) -> u8 {
        self.last_percent
    }
}
