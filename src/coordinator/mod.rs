//! Recording coordinator
//!
//! Owns the recorder state machine and services commands over a message
//! channel. Observers learn about session starts and stops through a
//! broadcast signal rather than by reading coordinator state.

mod recorder;
mod service;

pub use recorder::{Recorder, RecordingState, SNIPPET_SEPARATOR};
pub use service::{create_coordinator, Coordinator, CoordinatorHandle};

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Commands accepted by the coordinator, tagged by `action` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    StartRecording,
    StopRecording,
    /// Fire-and-forget snippet append; never answered
    RecordEvent { data: String },
    GetStatus,
    GetCount,
    GetData,
    Reset,
}

/// Replies for the commands that answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Started,
    Stopped,
    Reset,
    Status(RecordingState),
    Count(usize),
    Data(String),
}

impl Reply {
    /// Wire form of the reply
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Reply::Started => json!({ "status": "started" }),
            Reply::Stopped => json!({ "status": "stopped" }),
            Reply::Reset => json!({ "status": "reset" }),
            Reply::Status(state) => json!({ "status": state.as_str() }),
            Reply::Count(count) => json!({ "count": count }),
            Reply::Data(data) => json!({ "data": data }),
        }
    }
}

/// Capture on/off signals broadcast to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    StartCapture,
    StopCapture,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse_from_wire_tags() {
        let cases = [
            (r#"{"action":"startRecording"}"#, Command::StartRecording),
            (r#"{"action":"stopRecording"}"#, Command::StopRecording),
            (r#"{"action":"getStatus"}"#, Command::GetStatus),
            (r#"{"action":"getCount"}"#, Command::GetCount),
            (r#"{"action":"getData"}"#, Command::GetData),
            (r#"{"action":"reset"}"#, Command::Reset),
        ];
        for (line, expected) in cases {
            let command: Command = serde_json::from_str(line).unwrap();
            assert_eq!(command, expected);
        }
    }

    #[test]
    fn test_record_event_carries_data() {
        let command: Command =
            serde_json::from_str(r#"{"action":"recordEvent","data":"snippet text"}"#).unwrap();
        assert_eq!(
            command,
            Command::RecordEvent {
                data: "snippet text".to_string()
            }
        );
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        let command: Command =
            serde_json::from_str(r#"{"action":"getCount","tab":7,"origin":"popup"}"#).unwrap();
        assert_eq!(command, Command::GetCount);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"action":"selfDestruct"}"#).is_err());
    }

    #[test]
    fn test_non_string_data_is_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"action":"recordEvent","data":42}"#).is_err());
        assert!(
            serde_json::from_str::<Command>(r#"{"action":"recordEvent","data":null}"#).is_err()
        );
        assert!(serde_json::from_str::<Command>(r#"{"action":"recordEvent"}"#).is_err());
    }

    #[test]
    fn test_commands_serialize_with_action_tag() {
        assert_eq!(
            serde_json::to_value(Command::StartRecording).unwrap(),
            json!({ "action": "startRecording" })
        );
        assert_eq!(
            serde_json::to_value(Command::RecordEvent {
                data: "x".to_string()
            })
            .unwrap(),
            json!({ "action": "recordEvent", "data": "x" })
        );
    }

    #[test]
    fn test_reply_wire_forms() {
        assert_eq!(Reply::Started.to_json(), json!({ "status": "started" }));
        assert_eq!(Reply::Stopped.to_json(), json!({ "status": "stopped" }));
        assert_eq!(Reply::Reset.to_json(), json!({ "status": "reset" }));
        assert_eq!(
            Reply::Status(RecordingState::Recording).to_json(),
            json!({ "status": "recording" })
        );
        assert_eq!(
            Reply::Status(RecordingState::Idle).to_json(),
            json!({ "status": "idle" })
        );
        assert_eq!(Reply::Count(3).to_json(), json!({ "count": 3 }));
        assert_eq!(
            Reply::Data("a\n-----\nb".to_string()).to_json(),
            json!({ "data": "a\n-----\nb" })
        );
    }
}
