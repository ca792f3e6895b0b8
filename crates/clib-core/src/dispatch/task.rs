//! Background task handles.
//!
//! A [`TaskHandle`] owns the worker thread running one action. Its result is
//! published once, when the worker returns, and read once, by the poll that
//! reports it. Readiness checks never block.

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{ActionError, DispatchError};
use crate::extension::SharedAction;
use crate::request::TaskId;

/// Lifecycle of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The worker is still running.
    Running,
    /// The action returned a result.
    Completed,
    /// The action failed or panicked.
    Failed,
}

type Outcome = Result<String, ActionError>;

/// Handle to one in-flight background task.
#[derive(Debug)]
pub struct TaskHandle {
    worker: Option<JoinHandle<Outcome>>,
    outcome: Option<Outcome>,
    status: TaskStatus,
}

impl TaskHandle {
    /// Starts `action` on `data` in a dedicated worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Spawn`] if the OS cannot start the thread.
    pub fn spawn(task_id: TaskId, action: SharedAction, data: String) -> Result<Self, DispatchError> {
        let worker = thread::Builder::new()
            .name(format!("clib-task-{task_id}"))
            .spawn(move || action.call(&data))
            .map_err(|source| DispatchError::Spawn {
                task_id,
                source: Arc::new(source),
            })?;
        Ok(Self {
            worker: Some(worker),
            outcome: None,
            status: TaskStatus::Running,
        })
    }

    /// Last observed status; see [`TaskHandle::refresh`].
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Collects the worker's result if it has finished, without blocking.
    pub fn refresh(&mut self) -> TaskStatus {
        if self.status != TaskStatus::Running
            || !self.worker.as_ref().is_some_and(JoinHandle::is_finished)
        {
            return self.status;
        }
        if let Some(worker) = self.worker.take() {
            let outcome = worker.join().unwrap_or_else(|payload| {
                Err(ActionError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });
            self.status = if outcome.is_ok() {
                TaskStatus::Completed
            } else {
                TaskStatus::Failed
            };
            self.outcome = Some(outcome);
        }
        self.status
    }

    /// Returns `false` when the handle can no longer produce a result: a
    /// running task without a worker, or a finished task whose result was
    /// already taken.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        match self.status {
            TaskStatus::Running => self.worker.is_some(),
            TaskStatus::Completed | TaskStatus::Failed => self.outcome.is_some(),
        }
    }

    /// Takes the published result. Yields `None` on every call but the first
    /// after the task finished.
    pub fn take_outcome(&mut self) -> Option<Outcome> {
        self.outcome.take()
    }
}

/// Renders a panic payload as text.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
