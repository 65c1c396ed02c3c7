//! Progress rendering for transfer operations.
//!
//! Interactive terminals get a single indicatif bar driven by the
//! engine's percent stream; non-TTY runs get structured log lines
//! instead.

use std::sync::Mutex;

use console::Term;
use gitferry::transfer::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    bar: ProgressBar,
    /// Last rendered percent, to avoid redundant redraws.
    last: Mutex<u8>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:32.cyan/dim} {pos:>3}% {wide_msg}")
                .expect("static template is valid")
                .progress_chars("━╸─"),
        );
        Self {
            bar,
            last: Mutex::new(0),
        }
    }

    pub fn handle(&self, event: ProgressEvent) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if event.percent > *last {
            *last = event.percent;
            self.bar.set_position(event.percent as u64);
        }
        self.bar.set_message(event.message.clone());

        if event.percent >= 100 {
            self.bar.finish_with_message(event.message);
        }
    }
}

/// Build a progress callback appropriate for the current terminal.
pub fn make_callback() -> ProgressCallback {
    if Term::stdout().is_term() {
        let reporter = InteractiveReporter::new();
        Box::new(move |event| reporter.handle(event))
    } else {
        Box::new(|event| {
            match &event.detail {
                Some(detail) => {
                    tracing::info!(percent = event.percent, detail = %detail, "{}", event.message);
                }
                None => tracing::info!(percent = event.percent, "{}", event.message),
            };
        })
    }
}
