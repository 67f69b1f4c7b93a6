//! Single-flight refresh coordination.
//!
//! [`RefreshCoordinator`] owns the "refresh in progress" flag and the FIFO queue of requests
//! waiting on it. The first caller that observes an expired session receives a
//! [`RefreshLease`] and performs the refresh; everyone arriving while the lease is alive
//! receives a [`RefreshWaiter`] and suspends until the lease settles. The flag check-and-set
//! and the queue push share one critical section, and the lock is never held across an
//! `.await`.
//!
//! Settling drains the queue and clears the flag under the same lock, so the invariant "queue
//! is empty whenever no refresh is in progress" always holds. A lease dropped without being
//! settled (for example, when the leader's future is cancelled) settles every waiter with
//! [`RefreshFailure::Abandoned`].

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use futures::channel::oneshot::{self, Receiver, Sender};
// self
use crate::{_prelude::*, auth::TokenSecret, error::RefreshFailure};

/// Result delivered to every request that depended on a refresh.
pub type RefreshOutcome = std::result::Result<TokenSecret, RefreshFailure>;

#[derive(Debug)]
struct PendingRequest(Sender<RefreshOutcome>);

#[derive(Debug, Default)]
struct RefreshState {
	in_progress: bool,
	queue: VecDeque<PendingRequest>,
}

/// Shared coordinator guaranteeing at most one refresh call at a time.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<RefreshState>,
	metrics: RefreshMetrics,
}
impl RefreshCoordinator {
	/// Either claims the refresh lease or enqueues the caller behind the in-flight refresh.
	pub fn begin(&self) -> RefreshTicket<'_> {
		let mut state = self.state.lock();

		if state.in_progress {
			let (sender, receiver) = oneshot::channel();

			state.queue.push_back(PendingRequest(sender));
			self.metrics.record_queued();

			RefreshTicket::Wait(RefreshWaiter { receiver })
		} else {
			state.in_progress = true;

			RefreshTicket::Lead(RefreshLease { coordinator: self, settled: false })
		}
	}

	/// Returns `true` while a lease is outstanding.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().in_progress
	}

	/// Returns the number of requests currently waiting on the in-flight refresh.
	pub fn queued(&self) -> usize {
		self.state.lock().queue.len()
	}

	/// Returns the coordinator's counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	fn settle(&self, outcome: RefreshOutcome) -> usize {
		let waiters = {
			let mut state = self.state.lock();

			state.in_progress = false;

			mem::take(&mut state.queue)
		};
		let released = waiters.len();

		for PendingRequest(sender) in waiters {
			// A waiter whose caller went away has nothing left to resume.
			let _ = sender.send(outcome.clone());
		}

		released
	}
}

/// Result of [`RefreshCoordinator::begin`].
#[derive(Debug)]
pub enum RefreshTicket<'a> {
	/// The caller must perform the refresh and settle the lease.
	Lead(RefreshLease<'a>),
	/// A refresh is already running; the caller must wait for it.
	Wait(RefreshWaiter),
}

/// Exclusive right to perform the current refresh.
#[derive(Debug)]
pub struct RefreshLease<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl RefreshLease<'_> {
	/// Delivers `outcome` to every queued waiter in arrival order and clears the in-progress
	/// flag, returning how many waiters were released.
	pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		self.coordinator.settle(outcome)
	}
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		if !self.settled {
			let released = self.coordinator.settle(Err(RefreshFailure::Abandoned));

			tracing::warn!(released, "Refresh lease dropped before settling.");
		}
	}
}

/// Handle held by a request suspended behind an in-flight refresh.
#[derive(Debug)]
pub struct RefreshWaiter {
	receiver: Receiver<RefreshOutcome>,
}
impl RefreshWaiter {
	/// Waits for the in-flight refresh to settle.
	pub async fn wait(self) -> RefreshOutcome {
		self.receiver.await.unwrap_or(Err(RefreshFailure::Abandoned))
	}
}
