//! Recording state machine and snippet buffer
//!
//! The `Recorder` is the single owner of session state: a two-valued
//! recording mode, the ordered snippet buffer, and the running count.
//! Buffer and count only change together, and only while recording,
//! except for the unconditional reset.

use tracing::debug;

/// Separator placed between joined snippets. The exact byte sequence is
/// part of the output format and must not change.
pub const SNIPPET_SEPARATOR: &str = "\n-----\n";

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

impl RecordingState {
    /// Wire tag for this state
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
        }
    }

    pub fn is_recording(&self) -> bool {
        *self == RecordingState::Recording
    }
}

/// Owns the recording mode and everything captured during a session
#[derive(Debug, Default)]
pub struct Recorder {
    state: RecordingState,
    snippets: Vec<String>,
    count: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session: any previously buffered snippets are discarded,
    /// even when a session was already running
    pub fn start(&mut self) {
        self.state = RecordingState::Recording;
        self.snippets.clear();
        self.count = 0;
    }

    /// End the session, keeping the buffer retrievable
    pub fn stop(&mut self) {
        self.state = RecordingState::Idle;
    }

    /// Append one snippet while recording; discarded otherwise
    pub fn record_one(&mut self, snippet: String) {
        if !self.state.is_recording() {
            debug!("Not recording, snippet discarded");
            return;
        }
        self.snippets.push(snippet);
        self.count += 1;
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Number of snippets captured since the session started
    pub fn count(&self) -> usize {
        self.count
    }

    /// All buffered snippets joined with [`SNIPPET_SEPARATOR`]
    pub fn data(&self) -> String {
        self.snippets.join(SNIPPET_SEPARATOR)
    }

    /// Drop everything captured so far without changing the recording mode
    pub fn reset(&mut self) {
        self.snippets.clear();
        self.count = 0;
    }
}
