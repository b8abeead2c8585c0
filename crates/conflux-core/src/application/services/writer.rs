//! Sink writer registry and dispatch.
//!
//! The registry is built once at startup and handed to the factory. Dispatch
//! runs every payload through its writer sequentially and collects all
//! failures; a panicking writer is contained and reported as an error.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::application::error::{ApplicationError, WriterError};
use crate::application::ports::{IntegrationReader, SinkWriter};
use crate::domain::ExpandedWriterData;

/// The sink writers known to a factory, keyed by kind.
#[derive(Default, Clone)]
pub struct WriterRegistry {
    writers: BTreeMap<&'static str, Arc<dyn SinkWriter>>,
}

impl WriterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a writer. A second writer for the same kind is refused.
    pub fn register(&mut self, writer: Arc<dyn SinkWriter>) -> Result<(), ApplicationError> {
        let kind = writer.kind();
        if self.writers.contains_key(kind) {
            return Err(ApplicationError::DuplicateWriter { kind: kind.into() });
        }
        debug!(kind, "Registered sink writer");
        self.writers.insert(kind, writer);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, writer: Arc<dyn SinkWriter>) -> Result<Self, ApplicationError> {
        self.register(writer)?;
        Ok(self)
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn SinkWriter>> {
        self.writers.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.writers.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.writers.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Deliver every payload, in order, collecting all failures.
    pub async fn dispatch(
        &self,
        payloads: &[ExpandedWriterData],
        reader: &dyn IntegrationReader,
    ) -> Vec<ApplicationError> {
        let mut errors = Vec::new();
        for payload in payloads {
            let kind = payload.config.sink.as_str();
            let Some(writer) = self.writers.get(kind) else {
                warn!(sink = kind, "No writer registered for sink");
                errors.push(ApplicationError::UnknownSink { kind: kind.into() });
                continue;
            };

            match guarded_write(writer.as_ref(), payload, reader).await {
                Ok(()) => info!(
                    sink = kind,
                    endpoint = %payload.config.endpoint,
                    "Delivered payload to sink"
                ),
                Err(source) => {
                    warn!(sink = kind, error = %source, "Sink write failed");
                    errors.push(ApplicationError::Sink {
                        sink: kind.into(),
                        source,
                    });
                }
            }
        }
        errors
    }
}

impl std::fmt::Debug for WriterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.writers.keys()).finish()
    }
}

/// Run one write, turning a panic into [`WriterError::Panicked`].
pub async fn guarded_write(
    writer: &dyn SinkWriter,
    payload: &ExpandedWriterData,
    reader: &dyn IntegrationReader,
) -> Result<(), WriterError> {
    match AssertUnwindSafe(writer.write(payload, reader))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => Err(WriterError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
