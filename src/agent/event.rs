//! Typed events carried by the agent log stream.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogPayload {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DonePayload {
    pub reply: String,
    #[serde(default)]
    pub tool_summary: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// One decoded frame, keyed by its `event:` type.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Progress line for the build log.
    Log(LogPayload),
    /// Final reply. Ends the stream.
    Done(DonePayload),
    /// Failure reported by the agent. Does not end the stream.
    Error(ErrorPayload),
    /// Well-formed frame of a type this client does not know.
    Unknown { event_type: String, data: Value },
}

impl AgentEvent {
    /// Decode a frame's data according to its event type.
    pub fn decode(event_type: &str, data: &str) -> Result<Self, serde_json::Error> {
        let event = match event_type {
            "log" => AgentEvent::Log(serde_json::from_str(data)?),
            "done" => AgentEvent::Done(serde_json::from_str(data)?),
            "error" => AgentEvent::Error(serde_json::from_str(data)?),
            other => AgentEvent::Unknown {
                event_type: other.to_string(),
                data: serde_json::from_str(data)?,
            },
        };
        Ok(event)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, AgentEvent::Done(_))
    }

    pub fn event_type(&self) -> &str {
        match self {
            AgentEvent::Log(_) => "log",
            AgentEvent::Done(_) => "done",
            AgentEvent::Error(_) => "error",
            AgentEvent::Unknown { event_type, .. } => event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_log_with_and_without_level() {
        let event = AgentEvent::decode("log", r#"{"type":"log","message":"building","level":"info"}"#)
            .unwrap();
        assert_eq!(
            event,
            AgentEvent::Log(LogPayload {
                message: "building".to_string(),
                level: Some("info".to_string()),
            })
        );

        let event = AgentEvent::decode("log", r#"{"message":"bare"}"#).unwrap();
        assert!(matches!(event, AgentEvent::Log(LogPayload { level: None, .. })));
    }

    #[test]
    fn decodes_done_with_tool_summary() {
        let event = AgentEvent::decode(
            "done",
            r#"{"type":"done","reply":"ok","tool_summary":["write_file(a) -> ok"]}"#,
        )
        .unwrap();
        assert!(event.is_done());
        match event {
            AgentEvent::Done(done) => {
                assert_eq!(done.reply, "ok");
                assert_eq!(done.tool_summary, Some(vec!["write_file(a) -> ok".to_string()]));
            }
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[test]
    fn decodes_error() {
        let event = AgentEvent::decode("error", r#"{"error":"rate limited"}"#).unwrap();
        assert_eq!(
            event,
            AgentEvent::Error(ErrorPayload {
                error: "rate limited".to_string()
            })
        );
    }

    #[test]
    fn unknown_type_is_its_own_variant() {
        let event = AgentEvent::decode("progress", r#"{"pct":40}"#).unwrap();
        assert_eq!(event.event_type(), "progress");
        assert!(matches!(event, AgentEvent::Unknown { .. }));
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(AgentEvent::decode("done", r#"{"message":"no reply"}"#).is_err());
        assert!(AgentEvent::decode("log", "not json").is_err());
        assert!(AgentEvent::decode("mystery", "not json").is_err());
    }
}
