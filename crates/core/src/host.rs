//! Contract for the injected host capability.
//!
//! The host application's client library is an opaque external dependency.
//! This module pins down the slice of it the core consumes: construction for
//! an endpoint, connect/disconnect, connection-event subscription, and the
//! asynchronous acquisition of the command surface. The capability is passed
//! into [`LifecycleManager::mount`] explicitly rather than read from ambient
//! global state, so the manager is testable against a substitute host.
//!
//! [`LifecycleManager::mount`]: crate::manager::LifecycleManager::mount

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::handlers::{EventHandler, Subscription};
use crate::session::Endpoint;

/// Entry point into the host integration. Absence at mount means the
/// execution environment never loaded it.
pub trait HostCapability: Send + Sync {
	/// Constructs a client bound to `endpoint`. The endpoint is fixed for
	/// the client's lifetime.
	fn open(&self, endpoint: &Endpoint) -> Arc<dyn HostClient>;
}

/// One host-application session peer.
///
/// Connection events must be delivered from within the async runtime: the
/// lifecycle manager's handlers spawn the surface-acquisition task directly
/// from the callback.
#[async_trait]
pub trait HostClient: Send + Sync {
	/// Requests a connection. Acknowledgment arrives asynchronously through
	/// the `on_connect` subscription, never as a return value.
	fn connect(&self);

	/// Requests disconnection. Must be safe to call when never connected.
	fn disconnect(&self);

	/// Registers a connect-acknowledgment handler. Dropping the returned
	/// subscription unregisters it.
	fn on_connect(&self, handler: EventHandler) -> Subscription;

	/// Registers a disconnect handler. Dropping the returned subscription
	/// unregisters it.
	fn on_disconnect(&self, handler: EventHandler) -> Subscription;

	/// Acquires the command surface. Only meaningful after a connect
	/// acknowledgment; may fail or never resolve on a broken host.
	async fn acquire_command_surface(&self) -> Result<Arc<dyn CommandSurface>>;
}

/// Host operations available once a session is fully established.
#[async_trait]
pub trait CommandSurface: Send + Sync {
	/// Applies `timestamp` as the simulation's current time.
	///
	/// `timestamp` is an ISO-8601-like local date-time (`YYYY-MM-DDTHH:MM:SS`,
	/// no offset). Fails with host-side detail on invalid input or rejection.
	async fn set_time(&self, timestamp: &str) -> Result<()>;
}
