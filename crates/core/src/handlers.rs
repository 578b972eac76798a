//! Connection-event handler registry and RAII subscriptions.
//!
//! Host clients notify connect/disconnect through registered callbacks. The
//! [`Subscription`] returned at registration unregisters its handler on drop,
//! so the lifecycle manager can deterministically release every callback at
//! teardown instead of leaving them to fire against a destroyed session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Unique identifier for event handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Notification callback for connection events. Carries no payload; handlers
/// read whatever state they need through the manager.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Handler storage shared between a host client and its subscriptions.
pub type HandlerRegistry = Arc<Mutex<Vec<(HandlerId, EventHandler)>>>;

/// Creates an empty handler registry.
pub fn handler_registry() -> HandlerRegistry {
	Arc::new(Mutex::new(Vec::new()))
}

/// Invokes every handler currently registered, in registration order.
///
/// Handlers are cloned out before invocation so a handler may register or
/// unregister without deadlocking on the registry lock.
pub fn notify_all(registry: &HandlerRegistry) {
	let handlers: Vec<EventHandler> = registry.lock().iter().map(|(_, handler)| Arc::clone(handler)).collect();
	for handler in handlers {
		handler();
	}
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the registry, so dropping after the owning host
/// client is gone is safe (becomes a no-op).
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	/// Creates a subscription from a registry using a weak reference.
	pub fn from_registry(id: HandlerId, registry: &HandlerRegistry) -> Self {
		let weak: Weak<Mutex<Vec<(HandlerId, EventHandler)>>> = Arc::downgrade(registry);
		let dropper = Arc::new(move |id: HandlerId| {
			if let Some(registry) = weak.upgrade() {
				registry.lock().retain(|(entry_id, _)| *entry_id != id);
			}
		});
		Self::new(id, dropper)
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}
