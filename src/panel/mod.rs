//! Control panel
//!
//! Drives the coordinator on the user's behalf and mirrors the session in
//! a small idle/recording view. Stopping a session can hand the buffered
//! data to the clipboard; the view reverts to idle whether or not that
//! copy succeeds.

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::coordinator::{CoordinatorHandle, RecordingState, Reply};

/// Destination for exported session data
pub trait Clipboard: Send {
    fn write(&mut self, text: &str) -> Result<()>;
}

/// Clipboard backed by the platform clipboard service
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new().context("Failed to open system clipboard")?;
        Ok(SystemClipboard { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .context("Failed to write to system clipboard")
    }
}

/// What the panel is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelView {
    #[default]
    Idle,
    Recording,
}

pub struct ControlPanel {
    coordinator: CoordinatorHandle,
    clipboard: Option<Box<dyn Clipboard>>,
    copy_on_stop: bool,
    view: PanelView,
    last_count: usize,
}

impl ControlPanel {
    pub fn new(
        coordinator: CoordinatorHandle,
        clipboard: Option<Box<dyn Clipboard>>,
        copy_on_stop: bool,
    ) -> Self {
        ControlPanel {
            coordinator,
            clipboard,
            copy_on_stop,
            view: PanelView::default(),
            last_count: 0,
        }
    }

    /// Aligns the view with the coordinator's actual state, for sessions
    /// that were already running when the panel came up
    pub async fn sync_view(&mut self) {
        self.view = match self.coordinator.status().await {
            RecordingState::Recording => PanelView::Recording,
            RecordingState::Idle => PanelView::Idle,
        };
        if self.view == PanelView::Recording {
            self.refresh_count().await;
        }
    }

    pub async fn start(&mut self) -> Option<Reply> {
        let ack = self.coordinator.start().await;
        if ack.is_some() {
            self.view = PanelView::Recording;
            self.last_count = 0;
        }
        ack
    }

    /// Stops the session, copying the buffered data out first when
    /// configured to. The view goes idle regardless of the copy outcome.
    pub async fn stop(&mut self) -> Option<Reply> {
        let ack = self.coordinator.stop().await;
        if self.copy_on_stop {
            self.copy_buffer().await;
        }
        self.view = PanelView::Idle;
        ack
    }

    /// Copies the current buffer to the clipboard without touching the
    /// recording state
    pub async fn copy_buffer(&mut self) {
        match self.coordinator.data().await {
            Some(data) => self.copy_to_clipboard(&data),
            None => warn!("Session data unavailable, nothing copied"),
        }
    }

    pub async fn reset(&mut self) -> Option<Reply> {
        let ack = self.coordinator.reset().await;
        if ack.is_some() {
            self.last_count = 0;
        }
        ack
    }

    /// Latest snippet count from the coordinator
    pub async fn refresh_count(&mut self) -> usize {
        self.last_count = self.coordinator.count().await;
        self.last_count
    }

    pub fn view(&self) -> PanelView {
        self.view
    }

    fn copy_to_clipboard(&mut self, data: &str) {
        match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.write(data) {
                Ok(()) => info!("Copied {} bytes of session data to the clipboard", data.len()),
                Err(e) => error!("Clipboard write failed: {}", e),
            },
            None => debug!("No clipboard available, copy skipped"),
        }
    }
}
