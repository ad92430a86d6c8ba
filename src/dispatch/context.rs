//! Execution contexts: a background worker pool and a caller-driven result queue.

// std
use std::num::NonZeroUsize;
// crates.io
use tokio::{
	runtime::{self, Handle, Runtime},
	sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DispatchError},
};

/// Unit of work accepted by an [`ExecutionContext`].
pub type Job = Box<dyn FnOnce() + Send>;

/// Somewhere jobs run.
pub trait ExecutionContext
where
	Self: 'static + Send + Sync,
{
	/// Schedules `job`. Returns an error when the context no longer accepts work.
	fn execute(&self, job: Job) -> Result<(), DispatchError>;

	/// Stops accepting work. Jobs already running are not interrupted.
	fn shutdown(&self) {}
}
impl ExecutionContext for Handle {
	fn execute(&self, job: Job) -> Result<(), DispatchError> {
		self.spawn_blocking(job);

		Ok(())
	}
}

/// Background context running blocking network work on a dedicated tokio runtime.
///
/// Jobs go through `spawn_blocking`, so the number of concurrently executing requests is
/// bounded by `max_blocking_threads`. Shutdown never blocks and is safe from any thread,
/// including from inside another runtime.
pub struct WorkerPool {
	runtime: Mutex<Option<Runtime>>,
}
impl WorkerPool {
	/// Default upper bound on concurrently executing jobs.
	pub const DEFAULT_THREADS: usize = 4;

	/// Starts a pool with [`Self::DEFAULT_THREADS`] workers.
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_threads(NonZeroUsize::new(Self::DEFAULT_THREADS).unwrap_or(NonZeroUsize::MIN))
	}

	/// Starts a pool bounded to `threads` concurrently executing jobs.
	pub fn with_threads(threads: NonZeroUsize) -> Result<Self, ConfigError> {
		let runtime = runtime::Builder::new_multi_thread()
			.worker_threads(1)
			.max_blocking_threads(threads.get())
			.thread_name("oidc-request-worker")
			.build()
			.map_err(|source| ConfigError::WorkerPoolBuild { source })?;

		Ok(Self { runtime: Mutex::new(Some(runtime)) })
	}

	/// Returns `true` once [`shutdown`](ExecutionContext::shutdown) ran.
	pub fn is_shutdown(&self) -> bool {
		self.runtime.lock().is_none()
	}
}
impl ExecutionContext for WorkerPool {
	fn execute(&self, job: Job) -> Result<(), DispatchError> {
		let runtime = self.runtime.lock();
		let Some(runtime) = runtime.as_ref() else {
			return Err(DispatchError::ContextClosed { context: "worker_pool" });
		};

		runtime.spawn_blocking(job);

		Ok(())
	}

	fn shutdown(&self) {
		if let Some(runtime) = self.runtime.lock().take() {
			runtime.shutdown_background();
		}
	}
}
impl Debug for WorkerPool {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WorkerPool").field("shutdown", &self.is_shutdown()).finish()
	}
}
impl Drop for WorkerPool {
	fn drop(&mut self) {
		self.shutdown();
	}
}

/// Sending half of the result-delivery context.
///
/// Jobs are queued in submission order and run only when the owner of the paired
/// [`ResultLoop`] drives it, so callbacks always execute on the caller's chosen thread.
#[derive(Debug)]
pub struct ResultQueue {
	sender: Mutex<Option<UnboundedSender<Job>>>,
}
impl ResultQueue {
	/// Creates a queue and the loop that drains it.
	pub fn new() -> (Self, ResultLoop) {
		let (sender, receiver) = mpsc::unbounded_channel();

		(Self { sender: Mutex::new(Some(sender)) }, ResultLoop { receiver })
	}
}
impl ExecutionContext for ResultQueue {
	fn execute(&self, job: Job) -> Result<(), DispatchError> {
		let sender = self.sender.lock();
		let closed = DispatchError::ContextClosed { context: "result_queue" };
		let Some(sender) = sender.as_ref() else {
			return Err(closed);
		};

		sender.send(job).map_err(|_| closed)
	}

	fn shutdown(&self) {
		self.sender.lock().take();
	}
}

/// Receiving half of the result-delivery context; drive it from the thread that should run
/// callbacks.
pub struct ResultLoop {
	receiver: UnboundedReceiver<Job>,
}
impl ResultLoop {
	/// Runs every job that is already queued without waiting. Returns how many ran.
	pub fn run_pending(&mut self) -> usize {
		let mut ran = 0;

		loop {
			match self.receiver.try_recv() {
				Ok(job) => {
					job();

					ran += 1;
				},
				Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
			}
		}
	}

	/// Blocks the current thread until one job runs.
	///
	/// Returns `false` once the queue is shut down and drained. Must not be called from inside
	/// an async runtime; use [`run_next`](Self::run_next) there.
	pub fn run_next_blocking(&mut self) -> bool {
		match self.receiver.blocking_recv() {
			Some(job) => {
				job();

				true
			},
			None => false,
		}
	}

	/// Waits for one job and runs it. Returns `false` once the queue is shut down and drained.
	pub async fn run_next(&mut self) -> bool {
		match self.receiver.recv().await {
			Some(job) => {
				job();

				true
			},
			None => false,
		}
	}
}
impl Debug for ResultLoop {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResultLoop").field("queued", &self.receiver.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::mpsc as std_mpsc;
	// self
	use super::*;

	#[test]
	fn result_queue_runs_jobs_in_order_on_the_driving_thread() {
		let (queue, mut results) = ResultQueue::new();
		let order = Arc::new(Mutex::new(Vec::new()));

		for i in 0..3 {
			let order = order.clone();

			queue
				.execute(Box::new(move || order.lock().push((i, std::thread::current().id()))))
				.expect("Queue should accept jobs.");
		}

		assert!(order.lock().is_empty());
		assert_eq!(results.run_pending(), 3);

		let order = order.lock();

		assert_eq!(order.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
		assert!(order.iter().all(|(_, thread)| *thread == std::thread::current().id()));
	}

	#[test]
	fn shut_down_queue_rejects_and_drains() {
		let (queue, mut results) = ResultQueue::new();

		queue.execute(Box::new(|| {})).expect("Queue should accept jobs.");
		queue.shutdown();

		assert_eq!(
			queue.execute(Box::new(|| {})),
			Err(DispatchError::ContextClosed { context: "result_queue" })
		);
		assert!(results.run_next_blocking());
		assert!(!results.run_next_blocking());
	}

	#[test]
	fn worker_pool_runs_off_the_calling_thread() {
		let pool = WorkerPool::new().expect("Worker pool should start.");
		let (tx, rx) = std_mpsc::channel();
		let caller = std::thread::current().id();

		pool.execute(Box::new(move || {
			tx.send(std::thread::current().id()).expect("Receiver should be alive.");
		}))
		.expect("Pool should accept jobs.");

		let worker = rx
			.recv_timeout(std::time::Duration::from_secs(5))
			.expect("Job should run within the timeout.");

		assert_ne!(worker, caller);

		pool.shutdown();

		assert!(pool.is_shutdown());
		assert_eq!(
			pool.execute(Box::new(|| {})),
			Err(DispatchError::ContextClosed { context: "worker_pool" })
		);
	}
}
