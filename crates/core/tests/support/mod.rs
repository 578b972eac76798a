#![allow(dead_code)]

//! Scripted in-process host used by the integration tests.
//!
//! `FakeHost` plays the host application's client library: it records
//! connect/disconnect requests, lets tests fire acknowledgment events, and
//! answers surface acquisition according to a script.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use simlink::handlers::{HandlerRegistry, handler_registry, next_handler_id, notify_all};
use simlink::{
	CommandSurface, Endpoint, EventHandler, HostCapability, HostClient, LifecycleManager, Result, SimlinkError,
	Subscription,
};

/// How the fake host answers `acquire_command_surface`.
#[derive(Clone)]
pub enum AcquisitionScript {
	/// Hand out the shared fake surface.
	Succeed,
	/// Fail with the given detail.
	Fail(String),
	/// Never resolve.
	Hang,
	/// Resolve successfully once the gate is notified.
	Gated(Arc<Notify>),
}

pub struct FakeHost {
	connect_calls: AtomicUsize,
	disconnect_calls: AtomicUsize,
	connect_handlers: HandlerRegistry,
	disconnect_handlers: HandlerRegistry,
	acquisition: Mutex<AcquisitionScript>,
	surface: Arc<FakeSurface>,
}

static TRACING: Once = Once::new();

/// Installs a fmt subscriber once per test binary so failures carry the
/// `simlink.session` / `simlink.invoke` logs.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	});
}

impl FakeHost {
	pub fn new() -> Arc<Self> {
		init_tracing();
		Arc::new(Self {
			connect_calls: AtomicUsize::new(0),
			disconnect_calls: AtomicUsize::new(0),
			connect_handlers: handler_registry(),
			disconnect_handlers: handler_registry(),
			acquisition: Mutex::new(AcquisitionScript::Succeed),
			surface: Arc::new(FakeSurface::default()),
		})
	}

	/// Replaces the acquisition script for subsequent connect events.
	pub fn script(&self, script: AcquisitionScript) {
		*self.acquisition.lock() = script;
	}

	/// Fires a connect acknowledgment, as the host would after `connect()`.
	pub fn fire_connect(&self) {
		notify_all(&self.connect_handlers);
	}

	/// Fires a disconnect notification.
	pub fn fire_disconnect(&self) {
		notify_all(&self.disconnect_handlers);
	}

	pub fn connect_calls(&self) -> usize {
		self.connect_calls.load(Ordering::SeqCst)
	}

	pub fn disconnect_calls(&self) -> usize {
		self.disconnect_calls.load(Ordering::SeqCst)
	}

	/// Number of handlers still registered across both events.
	pub fn registered_handlers(&self) -> usize {
		self.connect_handlers.lock().len() + self.disconnect_handlers.lock().len()
	}

	pub fn surface(&self) -> Arc<FakeSurface> {
		Arc::clone(&self.surface)
	}
}

#[async_trait]
impl HostClient for FakeHost {
	fn connect(&self) {
		// Acknowledgment is manual: tests call `fire_connect` when the
		// scripted host is ready.
		self.connect_calls.fetch_add(1, Ordering::SeqCst);
	}

	fn disconnect(&self) {
		self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
	}

	fn on_connect(&self, handler: EventHandler) -> Subscription {
		let id = next_handler_id();
		self.connect_handlers.lock().push((id, handler));
		Subscription::from_registry(id, &self.connect_handlers)
	}

	fn on_disconnect(&self, handler: EventHandler) -> Subscription {
		let id = next_handler_id();
		self.disconnect_handlers.lock().push((id, handler));
		Subscription::from_registry(id, &self.disconnect_handlers)
	}

	async fn acquire_command_surface(&self) -> Result<Arc<dyn CommandSurface>> {
		let script = self.acquisition.lock().clone();
		match script {
			AcquisitionScript::Succeed => Ok(self.surface() as Arc<dyn CommandSurface>),
			AcquisitionScript::Fail(detail) => Err(SimlinkError::AcquisitionFailed(detail)),
			AcquisitionScript::Hang => std::future::pending().await,
			AcquisitionScript::Gated(gate) => {
				gate.notified().await;
				Ok(self.surface() as Arc<dyn CommandSurface>)
			}
		}
	}
}

/// Records every time-set call; optionally rejects them.
#[derive(Default)]
pub struct FakeSurface {
	calls: Mutex<Vec<String>>,
	reject_with: Mutex<Option<String>>,
}

impl FakeSurface {
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	/// Makes subsequent `set_time` calls fail with `detail`; `None` restores
	/// acceptance.
	pub fn reject_with(&self, detail: Option<&str>) {
		*self.reject_with.lock() = detail.map(str::to_string);
	}
}

#[async_trait]
impl CommandSurface for FakeSurface {
	async fn set_time(&self, timestamp: &str) -> Result<()> {
		// The call reached the host either way; record it before rejecting.
		self.calls.lock().push(timestamp.to_string());
		if let Some(detail) = self.reject_with.lock().clone() {
			return Err(SimlinkError::HostRejected(detail));
		}
		Ok(())
	}
}

/// Capability wrapper handing out one shared fake host.
pub struct FakeCapability {
	host: Arc<FakeHost>,
	opened: Mutex<Vec<Endpoint>>,
}

impl FakeCapability {
	pub fn new(host: Arc<FakeHost>) -> Self {
		Self {
			host,
			opened: Mutex::new(Vec::new()),
		}
	}

	/// Endpoints this capability was asked to open clients for.
	pub fn opened(&self) -> Vec<Endpoint> {
		self.opened.lock().clone()
	}
}

impl HostCapability for FakeCapability {
	fn open(&self, endpoint: &Endpoint) -> Arc<dyn HostClient> {
		self.opened.lock().push(endpoint.clone());
		Arc::clone(&self.host) as Arc<dyn HostClient>
	}
}

/// Polls `cond` across scheduler yields until it holds, panicking after a
/// bounded number of attempts. Drives spawned acquisition tasks on the
/// current-thread test runtime.
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
	for _ in 0..500 {
		if cond() {
			return;
		}
		tokio::task::yield_now().await;
	}
	panic!("timed out waiting for {what}");
}

/// Fires a connect acknowledgment and waits for surface acquisition.
pub async fn connect_ready(host: &FakeHost, manager: &LifecycleManager) {
	host.fire_connect();
	wait_until("command surface acquisition", || manager.command_surface().is_ok()).await;
}
