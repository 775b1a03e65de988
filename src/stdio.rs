//! Line-oriented stdio front end
//!
//! Reads one JSON document per line from stdin: session commands tagged
//! with `action` and simulated page activity tagged with `event`. Replies
//! and count updates go to stdout, one document per line. Logging stays
//! on stderr so stdout carries nothing but protocol output.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::coordinator::{Command, ControlSignal, CoordinatorHandle, Reply};
use crate::page::{ElementSnapshot, ElementSpec, Page};
use crate::panel::{ControlPanel, PanelView};

/// Simulated page activity, tagged by `event` on the wire
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum PageEvent {
    Click { element: ElementSpec },
    PushState { url: String },
    ReplaceState { url: String },
    Back,
    Forward,
    HashChange { fragment: String },
}

/// Panel actions that have no coordinator command of their own
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum PanelAction {
    CopyData,
}

/// Any single input line. Commands are tried first, so page events can
/// never shadow the session contract.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Action(Command),
    Panel(PanelAction),
    Page(PageEvent),
}

/// Parses one input line, dropping blanks and anything unrecognized
fn parse_line(line: &str) -> Option<Inbound> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(inbound) => Some(inbound),
        Err(e) => {
            debug!("Ignoring unrecognized input line: {}", e);
            None
        }
    }
}

/// Wire form of an acknowledged reply, nothing when the coordinator is gone
fn reply_json(reply: Option<Reply>) -> Vec<Value> {
    match reply {
        Some(reply) => vec![reply.to_json()],
        None => Vec::new(),
    }
}

/// Prints one protocol document on its own stdout line
fn emit_line(value: &Value) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", value).context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")
}

/// Wires stdin to the coordinator, panel, and page
pub struct StdioBridge {
    coordinator: CoordinatorHandle,
    panel: ControlPanel,
    page: Arc<Page>,
    poll_interval: Duration,
    last_printed_count: Option<usize>,
}

impl StdioBridge {
    pub fn new(
        coordinator: CoordinatorHandle,
        panel: ControlPanel,
        page: Arc<Page>,
        poll_interval: Duration,
    ) -> Self {
        StdioBridge {
            coordinator,
            panel,
            page,
            poll_interval,
            last_printed_count: None,
        }
    }

    /// Processes stdin lines until the stream closes or the coordinator
    /// shuts down. Counts are polled on a fixed interval while the
    /// recording view is up and printed whenever they change.
    pub async fn run(mut self) -> Result<()> {
        let mut signals = self.coordinator.subscribe();
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = LinesStream::new(stdin.lines());
        let mut poll_timer = tokio::time::interval(self.poll_interval);

        info!("Listening for commands and page events on stdin");
        loop {
            tokio::select! {
                line = lines.next() => match line {
                    Some(Ok(line)) => {
                        for value in self.handle_line(&line).await {
                            emit_line(&value)?;
                        }
                    }
                    Some(Err(e)) => warn!("Failed to read from stdin: {}", e),
                    None => {
                        info!("Input stream closed");
                        break;
                    }
                },
                signal = signals.recv() => match signal {
                    Ok(ControlSignal::Shutdown) => {
                        info!("Shutting down stdio bridge");
                        break;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Missed {} control signals", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = poll_timer.tick() => {
                    if let Some(value) = self.poll_tick().await {
                        emit_line(&value)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Handles one input line, returning the documents to print
    async fn handle_line(&mut self, line: &str) -> Vec<Value> {
        match parse_line(line) {
            Some(Inbound::Action(command)) => self.handle_action(command).await,
            Some(Inbound::Panel(action)) => self.handle_panel_action(action).await,
            Some(Inbound::Page(event)) => {
                self.apply_page_event(event);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn handle_action(&mut self, command: Command) -> Vec<Value> {
        match command {
            Command::StartRecording => {
                let reply = self.panel.start().await;
                self.last_printed_count = None;
                reply_json(reply)
            }
            Command::StopRecording => reply_json(self.panel.stop().await),
            Command::Reset => {
                let mut out = reply_json(self.panel.reset().await);
                if self.panel.view() == PanelView::Recording
                    && self.last_printed_count != Some(0)
                {
                    self.last_printed_count = Some(0);
                    out.push(json!({ "count": 0 }));
                }
                out
            }
            Command::RecordEvent { data } => {
                self.coordinator.record_event(data);
                Vec::new()
            }
            Command::GetStatus => {
                vec![json!({ "status": self.coordinator.status().await.as_str() })]
            }
            Command::GetCount => {
                vec![json!({ "count": self.coordinator.count().await })]
            }
            Command::GetData => {
                vec![json!({ "data": self.coordinator.data().await.unwrap_or_default() })]
            }
        }
    }

    async fn handle_panel_action(&mut self, action: PanelAction) -> Vec<Value> {
        match action {
            PanelAction::CopyData => {
                self.panel.copy_buffer().await;
                Vec::new()
            }
        }
    }

    fn apply_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Click { element } => match ElementSnapshot::from_spec(&element) {
                Ok(snapshot) => self.page.dispatch_click(&snapshot),
                Err(e) => warn!("Discarding click event: {}", e),
            },
            PageEvent::PushState { url } => self.page.push_url(url),
            PageEvent::ReplaceState { url } => self.page.replace_url(url),
            PageEvent::Back => {
                if !self.page.back() {
                    debug!("History is already at its oldest entry");
                }
            }
            PageEvent::Forward => {
                if !self.page.forward() {
                    debug!("History is already at its newest entry");
                }
            }
            PageEvent::HashChange { fragment } => self.page.set_fragment(&fragment),
        }
    }

    /// One badge poll, printing the count only when it changed
    async fn poll_tick(&mut self) -> Option<Value> {
        if self.panel.view() != PanelView::Recording {
            return None;
        }
        let count = self.panel.refresh_count().await;
        if self.last_printed_count == Some(count) {
            return None;
        }
        self.last_printed_count = Some(count);
        Some(json!({ "count": count }))
    }
}
