use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::{Handle, Runtime};
use uuid::Uuid;

/// Builder configuring telemetry for the command interpreter.
pub struct InterpreterTelemetryBuilder {
    component: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl InterpreterTelemetryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            log_path: None,
            event_publisher: None,
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Assigns the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<InterpreterTelemetry> {
        InterpreterTelemetry::new(self.component, self.log_path, self.event_publisher)
    }
}

/// Telemetry handle for command interpretation.
///
/// Both sinks are optional; an unconfigured handle is a no-op, so the
/// interpret path never depends on observability plumbing.
#[derive(Clone)]
pub struct InterpreterTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for InterpreterTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterTelemetry")
            .field("component", &self.inner.component)
            .finish()
    }
}

struct TelemetryInner {
    component: String,
    logger: Option<JsonLogger>,
    event: Option<EventHandle>,
}

struct EventHandle {
    // Only owned when built outside a runtime; inside one we spawn instead,
    // and dropping an owned runtime there would panic.
    runtime: Option<Runtime>,
    publisher: Arc<dyn EventPublisher>,
}

impl EventHandle {
    fn new(publisher: Arc<dyn EventPublisher>) -> Result<Self> {
        let runtime = if Handle::try_current().is_ok() {
            None
        } else {
            Some(Runtime::new()?)
        };
        Ok(Self { runtime, publisher })
    }

    fn publish(&self, record: EventRecord) -> Result<()> {
        if let Ok(handle) = Handle::try_current() {
            let publisher = Arc::clone(&self.publisher);
            handle.spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("telemetry event publish failed: {err:?}");
                }
            });
            return Ok(());
        }
        self.runtime.as_ref().map_or_else(
            || anyhow::bail!("no runtime available to publish telemetry event"),
            |runtime| runtime.block_on(self.publisher.publish(record)),
        )
    }
}

impl InterpreterTelemetry {
    fn new(
        component: impl Into<String>,
        log_path: Option<PathBuf>,
        event_publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Result<Self> {
        let logger = if let Some(path) = log_path {
            Some(JsonLogger::new(path)?)
        } else {
            None
        };
        let event = if let Some(publisher) = event_publisher {
            Some(EventHandle::new(publisher)?)
        } else {
            None
        };
        Ok(Self {
            inner: Arc::new(TelemetryInner {
                component: component.into(),
                logger,
                event,
            }),
        })
    }

    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(component: impl Into<String>) -> InterpreterTelemetryBuilder {
        InterpreterTelemetryBuilder::new(component)
    }

    /// Logs a structured record, scoped to a user when one is known.
    pub fn log(
        &self,
        level: LogLevel,
        message: &str,
        user_id: Option<&str>,
        fields: Value,
    ) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let mut record = LogRecord::new(&self.inner.component, level, message);
            if let Some(user_id) = user_id {
                record = record.for_user(user_id);
            }
            if let Some(obj) = fields.as_object() {
                record.fields = obj.clone();
            }
            logger.append(&record)?;
        }
        Ok(())
    }

    /// Emits an event entry via the configured bus.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(handle) = &self.inner.event {
            let record = EventRecord {
                id: format!("evt-{}", Uuid::new_v4()),
                source: self.inner.component.clone(),
                event_type: event_type.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                payload,
            };
            handle.publish(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_event_bus::MemoryEventBus;
    use tempfile::tempdir;

    #[test]
    fn telemetry_logs_and_emits() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("interpreter.log");
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = InterpreterTelemetry::builder("interpreter")
            .log_path(&log_path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(
                LogLevel::Info,
                "interpreter.intent.classified",
                Some("user-1"),
                json!({ "intent": "make_call" }),
            )
            .unwrap();
        telemetry
            .event("interpreter.intent.classified", json!({ "intent": "make_call" }))
            .unwrap();
        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("interpreter.intent.classified"));
        assert_eq!(bus.snapshot().len(), 1);
    }

    #[test]
    fn unconfigured_telemetry_is_noop() {
        let telemetry = InterpreterTelemetry::builder("interpreter").build().unwrap();
        telemetry
            .log(LogLevel::Debug, "noop", None, json!({}))
            .unwrap();
        telemetry.event("noop", json!({})).unwrap();
    }
}
