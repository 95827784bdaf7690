//! # Task System Core Traits
//!
//! A `Task` is a unit of deferred work run on the main thread by the
//! [`TaskManager`](super::TaskManager). Each task receives mutable access to
//! the manager's context (for chunk generation, the map of live chunks) and
//! may hand back follow-up tasks to be queued behind everything already
//! waiting.

/// A unit of work executed later against a context of type `C`.
///
/// # Implementation Guidelines
/// - Own the data you need; the context is only borrowed while running
/// - Look up the target in the context by key rather than holding a reference,
///   since the target may be gone by the time the task runs
pub trait Task<C> {
    /// Runs the task.
    ///
    /// # Arguments
    /// * `context` - The state the task operates on
    ///
    /// # Returns
    /// Follow-up tasks to queue, usually none.
    fn process(self: Box<Self>, context: &mut C) -> Vec<Box<dyn Task<C>>>;

    /// Short label used in debug logs.
    fn describe(&self) -> String {
        String::from("task")
    }
}
