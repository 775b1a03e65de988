use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use super::recorder::{Recorder, RecordingState};
use super::{Command, ControlSignal, Reply};

/// Capacity for the control signal broadcast channel
const CONTROL_CHANNEL_CAPACITY: usize = 16;

/// Everything the coordinator receives flows through one channel so that
/// reads observe every snippet sent before them.
#[derive(Debug)]
enum CoordinatorMessage {
    Command {
        command: Command,
        reply_tx: Option<oneshot::Sender<Reply>>,
    },
    Shutdown,
}

/// Owns the recorder and processes messages until shutdown
pub struct Coordinator {
    recorder: Recorder,
    session_id: Option<Uuid>,
    msg_rx: mpsc::UnboundedReceiver<CoordinatorMessage>,
    control_tx: broadcast::Sender<ControlSignal>,
}

/// Cloneable handle for talking to a running coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    msg_tx: mpsc::UnboundedSender<CoordinatorMessage>,
    control_tx: broadcast::Sender<ControlSignal>,
}

/// Creates a coordinator and a handle connected to it
pub fn create_coordinator() -> (Coordinator, CoordinatorHandle) {
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (control_tx, _) = broadcast::channel(CONTROL_CHANNEL_CAPACITY);

    let coordinator = Coordinator {
        recorder: Recorder::new(),
        session_id: None,
        msg_rx,
        control_tx: control_tx.clone(),
    };
    let handle = CoordinatorHandle { msg_tx, control_tx };

    (coordinator, handle)
}

impl Coordinator {
    /// Processes messages until the channel closes or shutdown is requested
    pub async fn run(mut self) {
        info!("Coordinator started");

        while let Some(msg) = self.msg_rx.recv().await {
            match msg {
                CoordinatorMessage::Command { command, reply_tx } => {
                    let reply = self.handle_command(command);
                    if let (Some(tx), Some(reply)) = (reply_tx, reply) {
                        let _ = tx.send(reply);
                    }
                }
                CoordinatorMessage::Shutdown => {
                    info!("Coordinator shutting down");
                    break;
                }
            }
        }

        let _ = self.control_tx.send(ControlSignal::Shutdown);
        info!("Coordinator stopped");
    }

    fn handle_command(&mut self, command: Command) -> Option<Reply> {
        match command {
            Command::StartRecording => {
                let session_id = Uuid::new_v4();
                info!("Recording session {} started", session_id);
                self.session_id = Some(session_id);
                self.recorder.start();
                let _ = self.control_tx.send(ControlSignal::StartCapture);
                Some(Reply::Started)
            }
            Command::StopRecording => {
                self.recorder.stop();
                match self.session_id.take() {
                    Some(session_id) => info!(
                        "Recording session {} stopped ({} snippets buffered)",
                        session_id,
                        self.recorder.count()
                    ),
                    None => debug!("Stop received with no active session"),
                }
                let _ = self.control_tx.send(ControlSignal::StopCapture);
                Some(Reply::Stopped)
            }
            Command::RecordEvent { data } => {
                self.recorder.record_one(data);
                None
            }
            Command::GetStatus => Some(Reply::Status(self.recorder.state())),
            Command::GetCount => Some(Reply::Count(self.recorder.count())),
            Command::GetData => Some(Reply::Data(self.recorder.data())),
            Command::Reset => {
                info!("Recording buffer reset");
                self.recorder.reset();
                Some(Reply::Reset)
            }
        }
    }
}

impl CoordinatorHandle {
    /// Subscribes to capture control signals
    pub fn subscribe(&self) -> broadcast::Receiver<ControlSignal> {
        self.control_tx.subscribe()
    }

    /// Starts a recording session
    pub async fn start(&self) -> Option<Reply> {
        self.request(Command::StartRecording).await
    }

    /// Stops the current recording session
    pub async fn stop(&self) -> Option<Reply> {
        self.request(Command::StopRecording).await
    }

    /// Clears the snippet buffer without changing the recording state
    pub async fn reset(&self) -> Option<Reply> {
        self.request(Command::Reset).await
    }

    /// Sends a captured snippet without waiting for an answer
    pub fn record_event(&self, data: String) {
        let msg = CoordinatorMessage::Command {
            command: Command::RecordEvent { data },
            reply_tx: None,
        };
        if let Err(e) = self.msg_tx.send(msg) {
            debug!("Failed to send captured snippet: {}", e);
        }
    }

    /// Current recording state, idle if the coordinator is gone
    pub async fn status(&self) -> RecordingState {
        match self.request(Command::GetStatus).await {
            Some(Reply::Status(state)) => state,
            _ => RecordingState::default(),
        }
    }

    /// Buffered snippet count, zero if the coordinator is gone
    pub async fn count(&self) -> usize {
        match self.request(Command::GetCount).await {
            Some(Reply::Count(count)) => count,
            _ => 0,
        }
    }

    /// Joined session data, or nothing if the coordinator is gone
    pub async fn data(&self) -> Option<String> {
        match self.request(Command::GetData).await {
            Some(Reply::Data(data)) => Some(data),
            _ => None,
        }
    }

    /// Asks the coordinator to exit its loop
    pub fn shutdown(&self) {
        let _ = self.msg_tx.send(CoordinatorMessage::Shutdown);
    }

    async fn request(&self, command: Command) -> Option<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let msg = CoordinatorMessage::Command {
            command,
            reply_tx: Some(reply_tx),
        };
        if let Err(e) = self.msg_tx.send(msg) {
            debug!("Failed to send command: {}", e);
            return None;
        }
        reply_rx.await.ok()
    }
}
