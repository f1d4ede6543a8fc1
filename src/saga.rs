//! Ordered workflow steps with compensating actions
//!
//! Each step that has an external effect registers the action that undoes it.
//! When a later step fails, every registered compensation runs in reverse
//! order. A failing compensation never hides the error that caused the abort.
use crate::error::{EngineError, StorageError};

type Compensation<'a> = Box<dyn FnOnce() -> Result<(), StorageError> + 'a>;

pub struct Saga<'a> {
    name: &'static str,
    compensations: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            compensations: Vec::new(),
        }
    }

    /// Run a step with no external effect to undo.
    pub fn step<T>(
        &mut self,
        label: &'static str,
        action: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        tracing::debug!(saga = self.name, step = label, "running step");
        action()
    }

    /// Run a step; once it succeeds, `compensation` is registered to undo it.
    pub fn step_with<T>(
        &mut self,
        label: &'static str,
        action: impl FnOnce() -> Result<T, EngineError>,
        compensation: impl FnOnce() -> Result<(), StorageError> + 'a,
    ) -> Result<T, EngineError> {
        let value = self.step(label, action)?;
        self.compensations.push((label, Box::new(compensation)));
        Ok(value)
    }

    /// Number of compensations that would run on abort.
    pub fn pending_compensations(&self) -> usize {
        self.compensations.len()
    }

    /// Run `body`; on error, compensate everything registered so far.
    pub fn run<T>(
        mut self,
        body: impl FnOnce(&mut Saga<'a>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        match body(&mut self) {
            Ok(value) => Ok(value),
            Err(cause) => {
                tracing::warn!(saga = self.name, error = %cause, "aborting, running compensations");
                let failures = self.compensate();
                if failures.is_empty() {
                    Err(cause)
                } else {
                    Err(EngineError::CompensationFailed {
                        cause: Box::new(cause),
                        failures,
                    })
                }
            }
        }
    }

    fn compensate(self) -> Vec<String> {
        let name = self.name;
        let mut failures = Vec::new();

        for (label, compensation) in self.compensations.into_iter().rev() {
            if let Err(err) = compensation() {
                tracing::error!(saga = name, step = label, error = %err, "compensation failed");
                failures.push(format!("{label}: {err}"));
            }
        }
        failures
    }
}
