use std::sync::Arc;

/// The error type a [`Work`] invocation's function may return, boxed
/// since the pool doesn't know or care what kind of work it's running.
pub type WorkError = Box<dyn std::error::Error + Send + Sync>;

/// A callable a [`Work`] wraps, invoked once per entry in `args_list`.
pub type WorkFn<A, R> = Arc<dyn Fn(A) -> std::result::Result<R, WorkError> + Send + Sync>;

/// Represents multiple concurrent calls to the same callable.
///
/// `func` is invoked once per entry of `args_list`, concurrently; the
/// length of `args_list` is this `Work`'s cardinality. If `workunit_name`
/// is set, each invocation runs inside its own scoped work unit of that
/// name, parented at the pool's fixed parent unit.
#[derive(Clone)]
pub struct Work<A, R> {
    pub func: WorkFn<A, R>,
    pub args_list: Vec<A>,
    pub workunit_name: Option<String>,
}

impl<A, R> Work<A, R> {
    #[must_use]
    pub fn new(func: WorkFn<A, R>, args_list: Vec<A>) -> Self {
        Self { func, args_list, workunit_name: None }
    }

    #[must_use]
    pub fn with_workunit_name(mut self, name: impl Into<String>) -> Self {
        self.workunit_name = Some(name.into());
        self
    }
}

/// An ordered sequence of [`Work`] steps submitted to
/// [`crate::WorkerPool::submit_chain`]: each step's completion triggers
/// submission of the next. Steps may have different cardinality, but
/// there is no output-input chaining — each step's `args_list` must
/// already be self-contained.
pub struct WorkChain<A, R> {
    pub(crate) steps: std::collections::VecDeque<Work<A, R>>,
}

impl<A, R> WorkChain<A, R> {
    #[must_use]
    pub fn new(steps: Vec<Work<A, R>>) -> Self {
        Self { steps: steps.into() }
    }
}
