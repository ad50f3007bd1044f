//! Turns [`UploadEvent`]s into a displayable progress state.

use tokio::sync::mpsc;

use crate::types::{UploadEvent, UploadOutcome};

/// Pipeline stage shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Hashing,
    Checking,
    Uploading,
    Merging,
    Done,
    Failed,
}

/// What a UI shows for the current upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub phase: Phase,
    /// 0-100; never decreases within a phase.
    pub percent: u8,
    pub finished: bool,
    pub outcome: Option<UploadOutcome>,
    pub error: Option<String>,
    /// Latest informational note (server message, retry notice).
    pub message: Option<String>,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            percent: 0,
            finished: false,
            outcome: None,
            error: None,
            message: None,
        }
    }
}

/// Callback invoked whenever the view changes.
pub type ChangeCallback = Box<dyn Fn(&ProgressView) + Send + Sync>;

/// Relays upload events into a [`ProgressView`].
#[derive(Default)]
pub struct ProgressReporter {
    view: ProgressView,
    callbacks: Vec<ChangeCallback>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a change callback.
    pub fn on_change(&mut self, callback: ChangeCallback) {
        self.callbacks.push(callback);
    }

    pub fn view(&self) -> &ProgressView {
        &self.view
    }

    /// Applies one event. Returns `true` if the view changed.
    ///
    /// Events after a terminal event are ignored.
    pub fn apply(&mut self, event: &UploadEvent) -> bool {
        if self.view.finished {
            return false;
        }

        let before = self.view.clone();
        match event {
            UploadEvent::Hashing(p) => self.advance(Phase::Hashing, p.percent),
            UploadEvent::Hashed { .. } => self.advance(Phase::Hashing, 100),
            UploadEvent::Checking => self.advance(Phase::Checking, 0),
            UploadEvent::InstantUpload { message } => {
                self.view.message.clone_from(message);
            }
            UploadEvent::ChunkUploaded { percent, .. } => self.advance(Phase::Uploading, *percent),
            UploadEvent::ChunkRetry {
                index,
                attempt,
                error,
            } => {
                self.view.message = Some(format!("chunk {index} retry {attempt}: {error}"));
            }
            UploadEvent::Merging => self.advance(Phase::Merging, 0),
            UploadEvent::Completed(outcome) => {
                self.view.phase = Phase::Done;
                self.view.percent = 100;
                self.view.finished = true;
                self.view.outcome = Some(outcome.clone());
            }
            UploadEvent::Failed { error, .. } => {
                self.view.phase = Phase::Failed;
                self.view.finished = true;
                self.view.error = Some(error.clone());
            }
        }

        let changed = self.view != before;
        if changed {
            for cb in &self.callbacks {
                cb(&self.view);
            }
        }
        changed
    }

    /// Drains `rx` until it closes or a terminal event arrives.
    pub async fn run(&mut self, rx: &mut mpsc::UnboundedReceiver<UploadEvent>) -> ProgressView {
        while let Some(event) = rx.recv().await {
            self.apply(&event);
            if event.is_terminal() {
                break;
            }
        }
        self.view.clone()
    }

    fn advance(&mut self, phase: Phase, percent: u8) {
        if self.view.phase != phase {
            self.view.phase = phase;
            self.view.percent = percent;
        } else {
            self.view.percent = self.view.percent.max(percent);
        }
    }
}
