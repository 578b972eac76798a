//! Connection lifecycle management for one host-application session.
//!
//! [`LifecycleManager`] owns the session state machine: it opens a client for
//! the endpoint, subscribes to connect/disconnect notifications, requests the
//! connection, and acquires the command surface after each acknowledgment.
//! Callers read status snapshots; commands are only honored while a live
//! session holds an acquired surface.
//!
//! Surface acquisition is the single asynchronous step after acknowledgment
//! and runs on a spawned task so the `Connected` transition is visible
//! immediately. Every connect, disconnect, and teardown bumps an epoch
//! counter; an acquisition result that lands under a stale epoch belongs to a
//! superseded session window and is discarded rather than applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Result, SimlinkError};
use crate::handlers::Subscription;
use crate::host::{CommandSurface, HostCapability, HostClient};
use crate::session::{Endpoint, SessionStatus, StatusSnapshot};

/// Tuning knobs for [`LifecycleManager`].
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
	/// Upper bound on command-surface acquisition after a connect
	/// acknowledgment. `None` waits indefinitely, matching hosts that give
	/// no liveness guarantee. Expiry surfaces as an acquisition failure and
	/// the next connect acknowledgment retries.
	pub acquire_timeout: Option<Duration>,
}

/// Owns one session's state machine and mediates all host interaction.
///
/// Dropping the manager tears the session down: disconnect is requested once
/// and every event subscription is released.
pub struct LifecycleManager {
	inner: Arc<Inner>,
}

struct Inner {
	endpoint: Endpoint,
	config: ManagerConfig,
	client: Option<Arc<dyn HostClient>>,
	state: Mutex<SessionState>,
	status_tx: watch::Sender<StatusSnapshot>,
	/// Bumped on every connect acknowledgment, disconnect, and teardown.
	/// In-flight acquisitions carry the epoch they started under.
	epoch: AtomicU64,
	torn_down: AtomicBool,
	subscriptions: Mutex<Vec<Subscription>>,
}

struct SessionState {
	status: SessionStatus,
	surface: Option<Arc<dyn CommandSurface>>,
	last_error: Option<String>,
}

impl LifecycleManager {
	/// Mounts a session against `endpoint` with default configuration.
	///
	/// A missing capability short-circuits to [`SessionStatus::Unavailable`]
	/// without attempting connection; otherwise the manager subscribes to
	/// connection events and requests the connect immediately.
	pub fn mount(capability: Option<&dyn HostCapability>, endpoint: Endpoint) -> Self {
		Self::with_config(capability, endpoint, ManagerConfig::default())
	}

	/// Mounts a session with explicit [`ManagerConfig`].
	pub fn with_config(capability: Option<&dyn HostCapability>, endpoint: Endpoint, config: ManagerConfig) -> Self {
		let (status_tx, _) = watch::channel(StatusSnapshot::default());

		let Some(capability) = capability else {
			warn!(target: "simlink.session", %endpoint, "host capability not loaded");
			let inner = Arc::new(Inner {
				endpoint,
				config,
				client: None,
				state: Mutex::new(SessionState {
					status: SessionStatus::Unavailable,
					surface: None,
					last_error: Some(SimlinkError::CapabilityMissing.to_string()),
				}),
				status_tx,
				epoch: AtomicU64::new(0),
				torn_down: AtomicBool::new(false),
				subscriptions: Mutex::new(Vec::new()),
			});
			inner.publish();
			return Self { inner };
		};

		let client = capability.open(&endpoint);
		let inner = Arc::new(Inner {
			endpoint,
			config,
			client: Some(Arc::clone(&client)),
			state: Mutex::new(SessionState {
				status: SessionStatus::Uninitialized,
				surface: None,
				last_error: None,
			}),
			status_tx,
			epoch: AtomicU64::new(0),
			torn_down: AtomicBool::new(false),
			subscriptions: Mutex::new(Vec::new()),
		});

		let connect_sub = {
			let weak = Arc::downgrade(&inner);
			client.on_connect(Arc::new(move || {
				if let Some(inner) = weak.upgrade() {
					Inner::handle_connect(&inner);
				}
			}))
		};
		let disconnect_sub = {
			let weak = Arc::downgrade(&inner);
			client.on_disconnect(Arc::new(move || {
				if let Some(inner) = weak.upgrade() {
					inner.handle_disconnect();
				}
			}))
		};
		inner.subscriptions.lock().extend([connect_sub, disconnect_sub]);

		inner.update(|state| {
			state.status = SessionStatus::Connecting;
		});
		debug!(target: "simlink.session", endpoint = %inner.endpoint, "requesting connect");
		client.connect();

		Self { inner }
	}

	/// Returns the current status. Side-effect free, callable at any time.
	pub fn status(&self) -> SessionStatus {
		self.inner.state.lock().status
	}

	/// Returns the most recent diagnostic, if any.
	pub fn last_error(&self) -> Option<String> {
		self.inner.state.lock().last_error.clone()
	}

	/// Returns the endpoint this session was mounted against.
	pub fn endpoint(&self) -> &Endpoint {
		&self.inner.endpoint
	}

	/// Returns the owned command surface while the session is connected and
	/// acquisition has succeeded; [`SimlinkError::NotConnected`] otherwise.
	pub fn command_surface(&self) -> Result<Arc<dyn CommandSurface>> {
		let state = self.inner.state.lock();
		if state.status == SessionStatus::Connected {
			if let Some(surface) = &state.surface {
				return Ok(Arc::clone(surface));
			}
		}
		Err(SimlinkError::NotConnected)
	}

	/// Returns the current `{surface, connected, error}` tuple.
	pub fn snapshot(&self) -> StatusSnapshot {
		self.inner.status_tx.borrow().clone()
	}

	/// Subscribes to status changes. Each transition publishes a fresh
	/// [`StatusSnapshot`] for the presentation layer to re-render.
	pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
		self.inner.status_tx.subscribe()
	}

	/// Tears the session down: requests disconnect from the host and
	/// releases all event subscriptions.
	///
	/// Idempotent: the second and later calls have no effect, and the host
	/// sees at most one disconnect request. Safe to call concurrently with
	/// an in-flight acquisition; its result will be discarded.
	///
	/// The published status drops to [`SessionStatus::Disconnected`] here:
	/// with the subscriptions gone no host event could correct a
	/// live-looking snapshot afterwards.
	pub fn teardown(&self) {
		if self.inner.torn_down.swap(true, Ordering::SeqCst) {
			return;
		}
		self.inner.epoch.fetch_add(1, Ordering::SeqCst);
		self.inner.subscriptions.lock().clear();
		self.inner.update(|state| {
			if state.status != SessionStatus::Unavailable {
				state.status = SessionStatus::Disconnected;
			}
			state.surface = None;
		});
		if let Some(client) = &self.inner.client {
			client.disconnect();
		}
		debug!(target: "simlink.session", endpoint = %self.inner.endpoint, "session torn down");
	}
}

impl Drop for LifecycleManager {
	fn drop(&mut self) {
		self.teardown();
	}
}

impl std::fmt::Debug for LifecycleManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LifecycleManager")
			.field("endpoint", &self.inner.endpoint)
			.field("status", &self.inner.state.lock().status)
			.finish()
	}
}

impl Inner {
	/// Applies a state mutation and publishes the resulting snapshot.
	fn update(&self, mutate: impl FnOnce(&mut SessionState)) {
		let snapshot = {
			let mut state = self.state.lock();
			mutate(&mut state);
			StatusSnapshot {
				surface: state.surface.clone(),
				connected: state.status == SessionStatus::Connected,
				surface_ready: state.surface.is_some(),
				error: state.last_error.clone(),
			}
		};
		self.status_tx.send_replace(snapshot);
	}

	fn publish(&self) {
		self.update(|_| {});
	}

	/// Connect acknowledged by the host. Flips to `Connected` and spawns
	/// surface acquisition; reconnects after a disconnect re-run it without
	/// caller intervention.
	fn handle_connect(inner: &Arc<Inner>) {
		if inner.torn_down.load(Ordering::SeqCst) {
			return;
		}
		let Some(client) = inner.client.clone() else {
			return;
		};

		let epoch = inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
		inner.update(|state| {
			state.status = SessionStatus::Connected;
			state.surface = None;
		});
		debug!(target: "simlink.session", endpoint = %inner.endpoint, epoch, "connect acknowledged");

		let task_inner = Arc::clone(inner);
		tokio::spawn(async move {
			let acquired = match task_inner.config.acquire_timeout {
				Some(limit) => match tokio::time::timeout(limit, client.acquire_command_surface()).await {
					Ok(result) => result,
					Err(_) => Err(SimlinkError::AcquisitionFailed(format!("timed out after {}ms", limit.as_millis()))),
				},
				None => client.acquire_command_surface().await,
			};
			task_inner.finish_acquisition(epoch, acquired);
		});
	}

	/// Applies an acquisition result, unless the session window it started
	/// under has been superseded or torn down.
	fn finish_acquisition(&self, epoch: u64, acquired: Result<Arc<dyn CommandSurface>>) {
		if self.torn_down.load(Ordering::SeqCst) || self.epoch.load(Ordering::SeqCst) != epoch {
			debug!(target: "simlink.session", epoch, "discarding stale acquisition result");
			return;
		}
		match acquired {
			Ok(surface) => {
				self.update(|state| {
					state.surface = Some(surface);
					state.last_error = None;
				});
				debug!(target: "simlink.session", endpoint = %self.endpoint, "command surface acquired");
			}
			Err(err) => {
				// Transport stays nominally connected; commands keep
				// failing as not-connected until a re-acquisition succeeds.
				warn!(target: "simlink.session", endpoint = %self.endpoint, error = %err, "command surface acquisition failed");
				self.update(|state| {
					state.last_error = Some(err.to_string());
				});
			}
		}
	}

	/// Host reported disconnection. Clears the surface; a later connect
	/// acknowledgment re-enters `Connected`.
	fn handle_disconnect(&self) {
		if self.torn_down.load(Ordering::SeqCst) {
			return;
		}
		self.epoch.fetch_add(1, Ordering::SeqCst);
		self.update(|state| {
			if state.status == SessionStatus::Connecting {
				// Never acknowledged: the connection attempt itself failed.
				state.last_error = Some(SimlinkError::ConnectFailed("session closed before acknowledgment".into()).to_string());
			}
			state.status = SessionStatus::Disconnected;
			state.surface = None;
		});
		debug!(target: "simlink.session", endpoint = %self.endpoint, "disconnected from host");
	}
}
