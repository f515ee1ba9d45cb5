use crate::work::{Work, WorkChain};
use crate::{Error, Result};
use kiln_workunit::WorkUnitId;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;

/// A fixed-size pool of async workers.
///
/// Concurrency is capped at `num_workers` via a semaphore rather than by
/// literally owning `num_workers` OS threads — tokio's own worker
/// threads run this pool's tasks, so "fixed-size pool of worker threads"
/// becomes "fixed concurrency budget over the runtime's thread pool",
/// the natural async-Rust reading of the same contract.
///
/// Background work created through this pool attaches new work units
/// under `parent_unit`, not the submitting caller's current unit:
/// instead of a per-OS-thread initializer, every invocation explicitly
/// scopes its optional work unit under the pool's fixed parent.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    parent_unit: WorkUnitId,
    pending_chains: AtomicUsize,
    pending_chains_notify: Notify,
    shutdown_hooks: tokio::sync::Mutex<Vec<Box<dyn FnOnce() + Send>>>,
    in_flight: tokio::sync::Mutex<JoinSet<()>>,
}

impl WorkerPool {
    #[must_use]
    pub fn new(num_workers: usize, parent_unit: WorkUnitId) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(num_workers.max(1))),
            parent_unit,
            pending_chains: AtomicUsize::new(0),
            pending_chains_notify: Notify::new(),
            shutdown_hooks: tokio::sync::Mutex::new(Vec::new()),
            in_flight: tokio::sync::Mutex::new(JoinSet::new()),
        })
    }

    /// Register a hook to run, in insertion order, during [`Self::shutdown`].
    pub async fn add_shutdown_hook(&self, hook: impl FnOnce() + Send + 'static) {
        self.shutdown_hooks.lock().await.push(Box::new(hook));
    }

    /// Run every invocation in `work`, honoring `num_workers` concurrency.
    ///
    /// Returns results in submission order. `Err` means at least one
    /// invocation failed; each failure was already logged by this
    /// method, so callers that only care about "did it all succeed" can
    /// discard the error.
    async fn run_work<A, R>(&self, work: Work<A, R>) -> Result<Vec<R>>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        let total = work.args_list.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut join_set = JoinSet::new();
        for (index, args) in work.args_list.into_iter().enumerate() {
            let permit = Arc::clone(&self.semaphore).acquire_owned().await.expect("semaphore never closed");
            let func = Arc::clone(&work.func);
            let workunit_name = work.workunit_name.clone();
            let parent = self.parent_unit;
            join_set.spawn(async move {
                let _permit = permit;
                let result = if let Some(name) = workunit_name {
                    let (_unit, result) = kiln_workunit::scoped(Some(parent), name, "work", None, |_u| func(args));
                    result
                } else {
                    func(args)
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut failed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(value))) => slots[index] = Some(value),
                Ok((_index, Err(e))) => {
                    tracing::error!(error = %e, "worker pool invocation failed");
                    failed += 1;
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "worker pool invocation panicked");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(Error::WorkFailed { failed, total });
        }

        Ok(slots.into_iter().map(|s| s.expect("every slot filled on success path")).collect())
    }

    /// Submit `work` for background execution.
    ///
    /// If `work.args_list` is empty, `on_success` (if any) is invoked
    /// synchronously with an empty vec. Otherwise every invocation runs
    /// concurrently (bounded by this pool's worker count); `on_success`
    /// fires exactly once, with results in submission order, only if
    /// every invocation succeeded. A failing invocation is logged and
    /// `on_success` is not called.
    ///
    /// Per spec, `on_success` must not do heavy work — only enqueue
    /// further work — since it runs inline on the task that drove this
    /// submission to completion.
    pub async fn submit_async<A, R, F>(&self, work: Work<A, R>, on_success: Option<F>)
    where
        A: Send + 'static,
        R: Send + 'static,
        F: FnOnce(Vec<R>) + Send + 'static,
    {
        if let Ok(results) = self.run_work(work).await {
            if let Some(cb) = on_success {
                cb(results);
            }
        }
    }

    /// Like [`Self::submit_async`], but blocks until the work list
    /// completes and propagates failure to the caller instead of just
    /// logging it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkFailed`] if any invocation failed.
    pub async fn submit_sync<A, R>(&self, work: Work<A, R>) -> Result<Vec<R>>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        self.run_work(work).await
    }

    /// Submit a [`WorkChain`]: steps run sequentially, each one's
    /// completion submitting the next. Registers one pending chain,
    /// decremented when the chain finishes or a step fails — a pending
    /// [`Self::shutdown`] waits for this to reach zero before it will
    /// stop accepting further drain.
    pub fn submit_chain<A, R>(self: &Arc<Self>, chain: WorkChain<A, R>)
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        self.pending_chains.fetch_add(1, Ordering::SeqCst);
        let pool = Arc::clone(self);
        let handle = tokio::spawn(async move {
            pool.run_chain_step(chain.steps).await;
        });

        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut in_flight = pool.in_flight.lock().await;
            in_flight.spawn(async move {
                let _ = handle.await;
            });
        });
    }

    fn run_chain_step<A, R>(self: Arc<Self>, mut steps: VecDeque<Work<A, R>>) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        Box::pin(async move {
            let Some(work) = steps.pop_front() else {
                self.finish_chain();
                return;
            };

            match self.run_work(work).await {
                Ok(_results) => {
                    if steps.is_empty() {
                        self.finish_chain();
                    } else {
                        self.run_chain_step(steps).await;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "work chain step failed, aborting remaining chain");
                    self.finish_chain();
                }
            }
        })
    }

    fn finish_chain(&self) {
        self.pending_chains.fetch_sub(1, Ordering::SeqCst);
        self.pending_chains_notify.notify_waiters();
    }

    /// Wait for every pending chain to finish, drain in-flight jobs, then
    /// run registered shutdown hooks in insertion order.
    pub async fn shutdown(&self) {
        loop {
            // `notified()` must be created before the counter check: it
            // captures the current notify generation at creation time, so a
            // `finish_chain` racing between our load and the await below
            // still wakes this waiter instead of being missed.
            let notified = self.pending_chains_notify.notified();
            if self.pending_chains.load(Ordering::SeqCst) == 0 {
                break;
            }
            notified.await;
        }

        {
            let mut in_flight = self.in_flight.lock().await;
            while in_flight.join_next().await.is_some() {}
        }

        let hooks = std::mem::take(&mut *self.shutdown_hooks.lock().await);
        for hook in hooks {
            hook();
        }
    }
}
