//! Hazard notifications emitted before a dangerous overfill is rejected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::container::{SerialNumber, TypeCode};

/// Record of a rejected, potentially dangerous load attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    /// Container the load was attempted on.
    pub serial: SerialNumber,
    /// Variant of that container.
    pub kind: TypeCode,
    /// Mass the caller tried to load.
    pub attempted_kg: u64,
    /// Highest mass the container accepts.
    pub allowed_kg: u64,
    /// When the attempt happened.
    pub raised_at: DateTime<Utc>,
    /// Operator-facing description.
    pub message: String,
}

impl HazardEvent {
    pub(crate) fn overfill(serial: SerialNumber, attempted_kg: u64, allowed_kg: u64) -> Self {
        let message = format!(
            "Dangerous operation on {serial}: attempted to load {attempted_kg}kg, allowed limit is {allowed_kg}kg"
        );
        Self {
            serial,
            kind: serial.code(),
            attempted_kg,
            allowed_kg,
            raised_at: Utc::now(),
            message,
        }
    }
}

/// Observer receiving hazard events from hazard-capable containers.
pub trait HazardNotifier: Send + Sync {
    /// Called once per rejected dangerous load, before the error is returned.
    fn notify(&self, event: &HazardEvent);
}

/// Notifier that writes every event to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl HazardNotifier for TracingNotifier {
    fn notify(&self, event: &HazardEvent) {
        warn!(
            container = %event.serial,
            attempted_kg = event.attempted_kg,
            allowed_kg = event.allowed_kg,
            "{}",
            event.message
        );
    }
}

/// Notifier that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl HazardNotifier for SilentNotifier {
    fn notify(&self, _event: &HazardEvent) {}
}

/// Shared, cloneable recorder of hazard events.
///
/// Clones observe the same buffer, so a frontend can keep one handle while the
/// registry owns another.
#[derive(Debug, Default, Clone)]
pub struct HazardLog {
    events: Arc<Mutex<Vec<HazardEvent>>>,
}

impl HazardLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded and not yet drained.
    pub fn events(&self) -> Vec<HazardEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all pending events.
    pub fn drain(&self) -> Vec<HazardEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl HazardNotifier for HazardLog {
    fn notify(&self, event: &HazardEvent) {
        TracingNotifier.notify(event);
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_buffer() {
        let log = HazardLog::new();
        let handle = log.clone();
        let serial = SerialNumber::new(TypeCode::Gas, 4);
        log.notify(&HazardEvent::overfill(serial, 1500, 1000));

        assert_eq!(handle.len(), 1);
        let events = handle.drain();
        assert_eq!(events[0].serial, serial);
        assert_eq!(events[0].kind, TypeCode::Gas);
        assert!(events[0].message.contains("1500kg"));
        assert!(events[0].message.contains("1000kg"));
        assert!(log.is_empty());
    }
}
