//! Background execution with result delivery on a caller-chosen context.
//!
//! [`RequestDispatcher`] owns two [`ExecutionContext`]s. Blocking network work runs on the
//! background context; the background unit then hands its outcome to the result-delivery
//! context, where the [`RequestCallback`] runs. A callback is consumed by value, so it fires at
//! most once and with exactly one of success or error.
//!
//! Once [`RequestDispatcher::shutdown`] runs, new submissions fail with
//! [`DispatchError::Shutdown`] and results of work that was already in flight are dropped
//! (logged at `debug`) instead of being delivered. In-flight connections are not aborted.

pub mod context;

pub use context::*;

// std
use std::{
	panic::{self, AssertUnwindSafe},
	sync::atomic::{AtomicBool, Ordering},
};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	error::{AuthorizationError, ConfigError, DispatchError, ErrorKind, ExecutionPanic},
	obs,
};

/// Receives the outcome of one dispatched request.
pub trait RequestCallback<T>
where
	Self: 'static + Send,
{
	/// Called with the parsed result.
	fn on_success(self, value: T);

	/// Called with the typed failure and its kind.
	fn on_error(self, kind: ErrorKind, error: AuthorizationError);
}
impl<T> RequestCallback<T> for oneshot::Sender<Result<T, AuthorizationError>>
where
	T: 'static + Send,
{
	fn on_success(self, value: T) {
		if self.send(Ok(value)).is_err() {
			obs::debug_event("callback", "Result receiver was dropped before delivery.");
		}
	}

	fn on_error(self, _: ErrorKind, error: AuthorizationError) {
		if self.send(Err(error)).is_err() {
			obs::debug_event("callback", "Result receiver was dropped before delivery.");
		}
	}
}

/// Closure pair implementing [`RequestCallback`]; see [`callback_fn`].
pub struct FnCallback<S, E> {
	on_success: S,
	on_error: E,
}
impl<S, E> Debug for FnCallback<S, E> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnCallback(..)")
	}
}
impl<T, S, E> RequestCallback<T> for FnCallback<S, E>
where
	S: 'static + Send + FnOnce(T),
	E: 'static + Send + FnOnce(ErrorKind, AuthorizationError),
{
	fn on_success(self, value: T) {
		(self.on_success)(value)
	}

	fn on_error(self, kind: ErrorKind, error: AuthorizationError) {
		(self.on_error)(kind, error)
	}
}

/// Builds a [`RequestCallback`] from two closures.
pub fn callback_fn<T, S, E>(on_success: S, on_error: E) -> FnCallback<S, E>
where
	S: 'static + Send + FnOnce(T),
	E: 'static + Send + FnOnce(ErrorKind, AuthorizationError),
{
	FnCallback { on_success, on_error }
}

/// Runs work on a background context and delivers outcomes on a result-delivery context.
///
/// Cloning is cheap; clones share contexts and shutdown state.
#[derive(Clone)]
pub struct RequestDispatcher {
	background: Arc<dyn ExecutionContext>,
	results: Arc<dyn ExecutionContext>,
	shutdown: Arc<AtomicBool>,
}
impl RequestDispatcher {
	/// Creates a dispatcher over the given contexts.
	pub fn new(background: impl ExecutionContext, results: impl ExecutionContext) -> Self {
		Self {
			background: Arc::new(background),
			results: Arc::new(results),
			shutdown: Default::default(),
		}
	}

	/// Creates a dispatcher over a fresh [`WorkerPool`] and [`ResultQueue`], returning the
	/// [`ResultLoop`] the caller drives to receive callbacks.
	pub fn with_worker_pool() -> Result<(Self, ResultLoop), ConfigError> {
		let (queue, results) = ResultQueue::new();

		Ok((Self::new(WorkerPool::new()?, queue), results))
	}

	/// Schedules `work` on the background context.
	pub fn submit<F>(&self, work: F) -> Result<(), DispatchError>
	where
		F: 'static + Send + FnOnce(),
	{
		if self.is_shutdown() {
			return Err(DispatchError::Shutdown);
		}

		self.background.execute(Box::new(work))
	}

	/// Schedules `delivery` on the result-delivery context.
	pub fn submit_results<F>(&self, delivery: F) -> Result<(), DispatchError>
	where
		F: 'static + Send + FnOnce(),
	{
		if self.is_shutdown() {
			return Err(DispatchError::Shutdown);
		}

		self.results.execute(Box::new(delivery))
	}

	/// Runs `work` in the background and hands its outcome to `callback` on the
	/// result-delivery context.
	///
	/// A panic inside `work` is delivered as an [`ErrorKind::Network`] failure.
	pub fn dispatch<T, W, C>(&self, work: W, callback: C) -> Result<(), DispatchError>
	where
		T: 'static + Send,
		W: 'static + Send + FnOnce() -> Result<T, AuthorizationError>,
		C: RequestCallback<T>,
	{
		let dispatcher = self.clone();

		self.submit(move || {
			let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
				Ok(outcome) => outcome,
				Err(payload) => Err(AuthorizationError::from_template(
					ErrorKind::Network,
					ExecutionPanic::from_payload(payload),
				)),
			};

			dispatcher.deliver(outcome, callback);
		})
	}

	/// Stops accepting work and suppresses results still in flight.
	pub fn shutdown(&self) {
		if self.shutdown.swap(true, Ordering::SeqCst) {
			return;
		}

		self.background.shutdown();
		self.results.shutdown();
	}

	/// Returns `true` once [`shutdown`](Self::shutdown) ran.
	pub fn is_shutdown(&self) -> bool {
		self.shutdown.load(Ordering::SeqCst)
	}

	fn deliver<T, C>(&self, outcome: Result<T, AuthorizationError>, callback: C)
	where
		T: 'static + Send,
		C: RequestCallback<T>,
	{
		let shutdown = self.shutdown.clone();
		let delivery = move || {
			if shutdown.load(Ordering::SeqCst) {
				obs::debug_event("deliver", "Dropped a late result after dispatcher shutdown.");

				return;
			}

			match outcome {
				Ok(value) => callback.on_success(value),
				Err(error) => callback.on_error(error.kind(), error),
			}
		};

		match self.submit_results(delivery) {
			Ok(()) => {},
			Err(DispatchError::Shutdown) =>
				obs::debug_event("deliver", "Dropped a late result after dispatcher shutdown."),
			Err(e) => obs::warn_event("deliver", &format!("Failed to deliver a request result: {e}")),
		}
	}
}
impl Debug for RequestDispatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDispatcher").field("shutdown", &self.is_shutdown()).finish()
	}
}
