use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Audit record for one step of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolEvent {
    GenerationStarted {
        model: String,
        save_to_file: bool,
    },
    GenerationCompleted {
        model: String,
        image_found: bool,
        saved_to: Option<String>,
        tokens: Option<u64>,
    },
    GenerationFailed {
        kind: String,
        error: String,
    },
    ImageSaved {
        index: usize,
        path: String,
        bytes: usize,
    },
    ImageSaveFailed {
        index: usize,
        kind: String,
        error: String,
    },
}

/// Append-only JSONL log of tool events.
///
/// Each line carries `type`, `session_id` and `ts` plus the event
/// fields. A log built with [`EventLog::disabled`] accepts events and drops them.
#[derive(Debug, Clone)]
pub struct EventLog {
    inner: Option<Arc<EventLogInner>>,
}

#[derive(Debug)]
struct EventLogInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_session(path, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_session(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Some(Arc::new(EventLogInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            })),
        }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn record(&self, event: &ToolEvent) -> anyhow::Result<Option<Value>> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(None);
        };

        let mut line = Map::new();
        let fields = match serde_json::to_value(event)? {
            Value::Object(fields) => fields,
            other => anyhow::bail!("tool event serialized to non-object: {other}"),
        };
        if let Some(event_type) = fields.get("type") {
            line.insert("type".to_string(), event_type.clone());
        }
        line.insert(
            "session_id".to_string(),
            Value::String(inner.session_id.clone()),
        );
        line.insert("ts".to_string(), Value::String(now_utc_iso()));
        for (key, value) in fields {
            if key != "type" {
                line.insert(key, value);
            }
        }

        if let Some(parent) = inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string(&line)?;
        let _guard = inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&inner.path)?;
        file.write_all(encoded.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Some(Value::Object(line)))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
