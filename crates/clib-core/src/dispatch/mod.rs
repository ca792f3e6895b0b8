//! Task dispatch: synchronous calls, background tasks, and polling.
//!
//! A request carrying [`TaskId::SYNC`] runs on the calling thread and its
//! result is returned as `STX result EOT`. Any other task id starts a worker
//! thread and is answered with `ACK`; the result is collected later by
//! [`TaskDispatcher::poll`], which frames every finished task as
//! `SOH id STX result` and closes the batch with `EOT`.

mod task;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::control::{ACK, EOT, SOH, STX};
use crate::error::{ActionError, DispatchError};
use crate::extension::{ExtensionCatalog, SharedAction};
use crate::request::{Request, TaskId};

pub use self::task::{TaskHandle, TaskStatus, panic_message};

/// Tracing target for dispatch operations.
const DISPATCH_TARGET: &str = "clib_core::dispatch";

/// Resolves requests against a catalog and owns every in-flight task.
///
/// # Example
///
/// ```
/// use clib_core::{ExtensionRegistry, FnLibrary, Request, TaskDispatcher, TaskId};
///
/// let mut registry = ExtensionRegistry::new();
/// registry
///     .register(FnLibrary::new("MyExt").with_action("MyAction", |data| Ok(data.to_uppercase())))
///     .expect("registration succeeds");
///
/// let mut dispatcher = TaskDispatcher::new(registry);
/// let reply = dispatcher
///     .dispatch(Request::new(TaskId::SYNC, "MyExt", "MyAction", "hello"))
///     .expect("dispatch succeeds");
/// assert_eq!(reply, "\u{2}HELLO\u{4}");
/// ```
#[derive(Debug)]
pub struct TaskDispatcher<C> {
    catalog: C,
    tasks: BTreeMap<TaskId, TaskHandle>,
    report_task_errors: bool,
}

impl<C> TaskDispatcher<C> {
    /// Creates a dispatcher over `catalog` with no pending tasks.
    #[must_use]
    pub const fn new(catalog: C) -> Self {
        Self {
            catalog,
            tasks: BTreeMap::new(),
            report_task_errors: false,
        }
    }

    /// Controls whether a failed task's frame carries its error text.
    #[must_use]
    pub const fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_task_errors = enabled;
        self
    }

    /// Catalog the dispatcher resolves extensions from.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Number of tasks that have not been reported yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` while `task_id` is waiting to be reported.
    #[must_use]
    pub fn is_pending(&self, task_id: TaskId) -> bool {
        self.tasks.contains_key(&task_id)
    }

    /// Last observed status of a pending task.
    #[must_use]
    pub fn status(&self, task_id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&task_id).map(TaskHandle::status)
    }
}

impl<C: ExtensionCatalog> TaskDispatcher<C> {
    /// Executes a request.
    ///
    /// Synchronous requests return `STX result EOT`. Background requests
    /// return `ACK` as soon as the worker has started. Starting a task under
    /// an id that is still pending replaces the older entry.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownExtension`] or
    /// [`DispatchError::UnknownAction`] when resolution fails,
    /// [`DispatchError::TaskExecutionFailure`] when a synchronous action
    /// fails, and [`DispatchError::Spawn`] when no worker can be started.
    pub fn dispatch(&mut self, request: Request) -> Result<String, DispatchError> {
        let action = self.resolve(&request)?;
        let task_id = request.task_id();
        debug!(
            target: DISPATCH_TARGET,
            task_id = task_id.get(),
            extension = request.extension(),
            action = request.action(),
            "dispatching request"
        );

        if task_id.is_sync() {
            let result = run_inline(&action, request.data())
                .map_err(|source| DispatchError::TaskExecutionFailure { task_id, source })?;
            return Ok(format!("{STX}{result}{EOT}"));
        }

        let handle = TaskHandle::spawn(task_id, action, request.data().to_owned())?;
        if self.tasks.insert(task_id, handle).is_some() {
            warn!(
                target: DISPATCH_TARGET,
                task_id = task_id.get(),
                "task id reused while pending; earlier result discarded"
            );
        }
        Ok(ACK.to_string())
    }

    /// Drains every finished task.
    ///
    /// Returns `None` when nothing is pending. Otherwise the reply holds one
    /// `SOH id STX result` frame per finished task, in ascending id order,
    /// followed by `EOT`. A failed task keeps its frame with an empty body
    /// (or its error text when error reporting is enabled) and does not stop
    /// the others from being reported.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PollProtocolFailure`] when a pending handle
    /// can no longer yield a result. That handle is dropped; every other
    /// task stays pending for the next poll.
    pub fn poll(&mut self) -> Result<Option<String>, DispatchError> {
        if self.tasks.is_empty() {
            return Ok(None);
        }

        for handle in self.tasks.values_mut() {
            handle.refresh();
        }

        if let Some(task_id) = self
            .tasks
            .iter()
            .find(|(_, handle)| !handle.is_consistent())
            .map(|(task_id, _)| *task_id)
        {
            self.tasks.remove(&task_id);
            return Err(DispatchError::PollProtocolFailure {
                task_id,
                message: "result handle holds no result".to_owned(),
            });
        }

        let finished: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, handle)| handle.status() != TaskStatus::Running)
            .map(|(task_id, _)| *task_id)
            .collect();

        let mut reply = String::new();
        for task_id in finished {
            let Some(mut handle) = self.tasks.remove(&task_id) else {
                continue;
            };
            reply.push(SOH);
            reply.push_str(&task_id.to_string());
            reply.push(STX);
            match handle.take_outcome() {
                Some(Ok(result)) => {
                    debug!(target: DISPATCH_TARGET, task_id = task_id.get(), "task completed");
                    reply.push_str(&result);
                }
                Some(Err(source)) => {
                    let failure = DispatchError::TaskExecutionFailure { task_id, source };
                    error!(target: DISPATCH_TARGET, error = %failure, "task failed");
                    if self.report_task_errors {
                        reply.push_str(&failure.to_string());
                    }
                }
                None => {
                    error!(target: DISPATCH_TARGET, task_id = task_id.get(), "task result vanished");
                }
            }
        }
        reply.push(EOT);
        Ok(Some(reply))
    }

    fn resolve(&self, request: &Request) -> Result<SharedAction, DispatchError> {
        let library =
            self.catalog
                .library(request.extension())
                .ok_or_else(|| DispatchError::UnknownExtension {
                    name: request.extension().to_owned(),
                })?;
        library
            .action(request.action())
            .ok_or_else(|| DispatchError::UnknownAction {
                extension: request.extension().to_owned(),
                action: request.action().to_owned(),
            })
    }
}

/// Runs an action on the calling thread, turning a panic into an error.
fn run_inline(action: &SharedAction, data: &str) -> Result<String, ActionError> {
    panic::catch_unwind(AssertUnwindSafe(|| action.call(data))).unwrap_or_else(|payload| {
        Err(ActionError::Panicked {
            message: task::panic_message(payload.as_ref()),
        })
    })
}
