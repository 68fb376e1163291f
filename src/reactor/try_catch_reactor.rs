use std::fmt;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use parking_lot::RwLock;
use tokio::runtime::Builder;
use tokio::runtime::Runtime;
use tracing::debug;
use tracing::error;
use tracing::warn;

use super::Reactor;
use super::Task;
use crate::metrics::REACTOR_TASK_FAILURES;
use crate::ReactorConfig;
use crate::ReactorError;
use crate::Result;

/// Reactor that catches, logs and discards any panic raised by its work
/// items, so one faulty reaction never takes a worker thread down.
pub struct TryCatchReactor {
    identifier: Arc<str>,
    runtime: RwLock<Option<Runtime>>,
}

impl fmt::Debug for TryCatchReactor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TryCatchReactor")
            .field("identifier", &self.identifier)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl TryCatchReactor {
    /// Starts `threads` workers named `{identifier}-1`, `{identifier}-2`, ...
    pub fn new(
        identifier: &str,
        threads: usize,
    ) -> Result<Self> {
        let counter = Arc::new(AtomicUsize::new(0));
        let prefix = identifier.to_string();
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name_fn(move || {
                let thread_id = counter.fetch_add(1, Ordering::SeqCst) + 1;
                format!("{}-{}", prefix, thread_id)
            })
            .enable_time()
            .build()
            .map_err(ReactorError::Build)?;

        debug!(identifier, threads, "Reactor started");
        Ok(Self {
            identifier: Arc::from(identifier),
            runtime: RwLock::new(Some(runtime)),
        })
    }

    pub fn from_config(config: &ReactorConfig) -> Result<Self> {
        Self::new(&config.identifier, config.threads)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn refuse(
        &self,
        what: &str,
    ) -> Result<()> {
        warn!(
            "Could not {} task for execution: reactor {} has been stopped.",
            what, self.identifier
        );
        Err(ReactorError::ShutDown(self.identifier.to_string()).into())
    }
}

/// Runs a task, logging and discarding any panic.
fn run_guarded(
    identifier: &str,
    task: Task,
) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        REACTOR_TASK_FAILURES.with_label_values(&[identifier]).inc();
        error!("Reactor {} encountered a panicking task", identifier);
    }
}

impl Reactor for TryCatchReactor {
    fn submit(
        &self,
        task: Task,
    ) -> Result<()> {
        let runtime = self.runtime.read();
        let Some(runtime) = runtime.as_ref() else {
            return self.refuse("submit");
        };
        let identifier = self.identifier.clone();
        runtime.spawn(async move { run_guarded(&identifier, task) });
        Ok(())
    }

    fn schedule(
        &self,
        task: Task,
        delay: Duration,
    ) -> Result<()> {
        let runtime = self.runtime.read();
        let Some(runtime) = runtime.as_ref() else {
            return self.refuse("schedule");
        };
        let identifier = self.identifier.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            run_guarded(&identifier, task)
        });
        Ok(())
    }

    fn current_time_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    fn shut_down_now(&self) {
        if let Some(runtime) = self.runtime.write().take() {
            // Never blocks, so it is safe from inside another runtime
            runtime.shutdown_background();
            debug!(identifier = %self.identifier, "Reactor shut down");
        }
    }

    fn is_shut_down(&self) -> bool {
        self.runtime.read().is_none()
    }
}

impl Drop for TryCatchReactor {
    fn drop(&mut self) {
        self.shut_down_now();
    }
}
