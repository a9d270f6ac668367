//! Analytics sink abstraction and the emitter that feeds it.
//!
//! The sink is an external collaborator that may be missing entirely. The
//! [`Emitter`] feature-detects it before every emission: with no sink the
//! event is dropped silently, and a failing sink is logged and never retried.

use crate::core::event::{Params, TrackedEvent};
use crate::transparency::SharedTransparencyLog;
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

/// The event type literal passed to every sink call.
pub const EVENT_TYPE: &str = "event";

/// Variant label used when none has been set.
pub const UNKNOWN_VARIANT: &str = "unknown";

/// Errors reported by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sink rejected event: {0}")]
    Rejected(String),
}

/// Receiver of analytics emissions.
pub trait AnalyticsSink: Send {
    fn send(&self, event_type: &str, event_name: &str, params: &Params) -> Result<(), SinkError>;
}

/// Page variant label shared between the host and the emitter.
///
/// Read at emission time, so the host may change it mid-session.
#[derive(Debug, Clone, Default)]
pub struct SharedVariant(Arc<RwLock<Option<String>>>);

impl SharedVariant {
    pub fn new(variant: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(variant)))
    }

    pub fn set(&self, variant: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(variant.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current label, `"unknown"` when unset.
    pub fn current(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| UNKNOWN_VARIANT.to_string())
    }
}

/// Forwards tracked events to an optional sink.
pub struct Emitter {
    sink: Option<Box<dyn AnalyticsSink>>,
    variant: SharedVariant,
    log: Option<SharedTransparencyLog>,
}

impl Emitter {
    pub fn new(sink: Option<Box<dyn AnalyticsSink>>, variant: SharedVariant) -> Self {
        Self {
            sink,
            variant,
            log: None,
        }
    }

    /// An emitter with no sink: every emission is skipped.
    pub fn disabled(variant: SharedVariant) -> Self {
        Self::new(None, variant)
    }

    /// Count emissions in a transparency log.
    pub fn with_transparency_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn variant(&self) -> &SharedVariant {
        &self.variant
    }

    pub fn transparency_log(&self) -> Option<&SharedTransparencyLog> {
        self.log.as_ref()
    }

    /// Emit an event. Returns whether the sink accepted it.
    pub fn emit(&self, event: TrackedEvent) -> bool {
        let Some(sink) = self.sink.as_ref() else {
            tracing::trace!(event = %event.name, "no analytics sink, skipping");
            if let Some(log) = &self.log {
                log.record_suppressed();
            }
            return false;
        };

        let TrackedEvent {
            name,
            mut parameters,
        } = event;
        parameters.insert("page_variant".to_string(), self.variant.current().into());

        match sink.send(EVENT_TYPE, &name, &parameters) {
            Ok(()) => {
                tracing::debug!(event = %name, params = parameters.len(), "tracked");
                if let Some(log) = &self.log {
                    log.record_emitted();
                }
                true
            }
            Err(e) => {
                tracing::warn!(event = %name, error = %e, "analytics sink failed, dropping event");
                if let Some(log) = &self.log {
                    log.record_sink_failure();
                }
                false
            }
        }
    }
}

/// Sink that keeps every event in memory.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the emitter.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<TrackedEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Events with the given name, in emission order.
    pub fn named(&self, name: &str) -> Vec<TrackedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AnalyticsSink for RecordingSink {
    fn send(&self, _event_type: &str, event_name: &str, params: &Params) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TrackedEvent {
                name: event_name.to_string(),
                parameters: params.clone(),
            });
        Ok(())
    }
}

/// One line written by [`JsonLinesSink`].
#[derive(Serialize)]
struct SinkRecord<'a> {
    event_type: &'a str,
    name: &'a str,
    parameters: &'a Params,
}

/// Sink writing one JSON object per event to a writer.
///
/// The output can be read back by the insights pass.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> AnalyticsSink for JsonLinesSink<W> {
    fn send(&self, event_type: &str, event_name: &str, params: &Params) -> Result<(), SinkError> {
        let record = SinkRecord {
            event_type,
            name: event_name,
            parameters: params,
        };
        let line = serde_json::to_string(&record)?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
