//! The [`HostConfig`] that targets an external widget runtime.

use crate::{
	channel::CommandChannel,
	config::Config,
	handle::{Handle, IdentityAllocator},
	host_config::HostConfig,
	node::{HostNode, RootContainer},
	props::Props,
};
use tracing::{debug, instrument, trace};

/// Translates reconciliation callbacks into [`CommandChannel`] operations.
///
/// The channel is optional. Without one, every command is dropped while the shadow [`HostNode`]s
/// are maintained exactly as if it had been delivered, so the tree still reconciles headlessly.
///
/// Every mutation is sent immediately. Nothing is batched and nothing is read back from the runtime.
#[derive(Debug)]
pub struct HostAdapter<C> {
	channel: Option<C>,
	identities: IdentityAllocator,
	config: Config,
}
impl<C: CommandChannel> HostAdapter<C> {
	#[must_use]
	pub fn new(channel: Option<C>) -> Self {
		Self::with_config(channel, Config::default())
	}

	#[must_use]
	pub fn with_config(channel: Option<C>, config: Config) -> Self {
		Self {
			channel,
			identities: IdentityAllocator::new(),
			config,
		}
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	#[must_use]
	pub fn channel(&self) -> Option<&C> {
		self.channel.as_ref()
	}

	pub fn channel_mut(&mut self) -> Option<&mut C> {
		self.channel.as_mut()
	}

	/// Attaches a (new) channel, returning the previous one.
	///
	/// Widgets created before this call are unknown to the new channel's runtime.
	pub fn attach_channel(&mut self, channel: C) -> Option<C> {
		self.channel.replace(channel)
	}

	pub fn detach_channel(&mut self) -> Option<C> {
		self.channel.take()
	}

	/// The handle the next created widget will receive.
	#[must_use]
	pub fn next_handle(&self) -> Handle {
		self.identities.peek()
	}

	fn send(&mut self, operation: &'static str, command: impl FnOnce(&mut C)) {
		match self.channel.as_mut() {
			Some(channel) => command(channel),
			None => trace!("No channel attached. Dropping `{}`.", operation),
		}
	}

	fn bind(&mut self, parent: Handle, child: &HostNode) {
		if child.is_text_sentinel() {
			return debug!(%parent, "Text instances are never bound. Set text through a property instead.");
		}
		let child = child.handle();
		self.send("bind_hierarchy", |channel| channel.bind_hierarchy(parent, child))
	}

	fn remove(&mut self, parent: Handle, child: &HostNode) {
		if child.is_text_sentinel() {
			return debug!(%parent, "Text instances are never bound or instantiated. Nothing to remove.");
		}
		let child = child.handle();
		self.send("unbind_hierarchy", |channel| channel.unbind_hierarchy(parent, child));
		self.send("terminate", |channel| channel.terminate(child))
	}
}

/// Scheduling is disabled: Timeouts are never scheduled.
pub const NO_TIMEOUT: i32 = -1;

impl<C: CommandChannel> HostConfig for HostAdapter<C> {
	type Instance = HostNode;
	type Container = RootContainer;
	type HostContext = ();
	type UpdatePayload = ();
	type PublicInstance = HostNode;
	type TimeoutHandle = i32;

	const SUPPORTS_MUTATION: bool = true;
	const SUPPORTS_PERSISTENCE: bool = false;
	const SUPPORTS_HYDRATION: bool = false;
	const IS_PRIMARY_RENDERER: bool = true;

	#[cfg(target_arch = "wasm32")]
	fn now(&self) -> f64 {
		js_sys::Date::now()
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn now(&self) -> f64 {
		use std::time::{SystemTime, UNIX_EPOCH};
		SystemTime::now().duration_since(UNIX_EPOCH).map_or(0.0, |elapsed| elapsed.as_secs_f64() * 1000.0)
	}

	/// Drops `callback` without scheduling it.
	fn schedule_timeout(&mut self, callback: Box<dyn FnOnce()>, delay_ms: f64) -> Self::TimeoutHandle {
		trace!(delay_ms, "Timeouts are disabled. Dropping callback.");
		drop(callback);
		NO_TIMEOUT
	}

	/// No-op.
	fn cancel_timeout(&mut self, _: Self::TimeoutHandle) {}

	fn no_timeout(&self) -> Self::TimeoutHandle {
		NO_TIMEOUT
	}

	/// No contextual specialization.
	fn get_root_host_context(&self, _: &Self::Container) -> Self::HostContext {}

	/// No contextual specialization.
	fn get_child_host_context(&self, _: &Self::HostContext, _: &str) -> Self::HostContext {}

	/// Always `false`: Widgets take their text from explicit properties.
	fn should_set_text_content(&self, _: &str, _: &Props) -> bool {
		false
	}

	#[instrument(skip(self, props, _container, _context))]
	fn create_instance(&mut self, type_tag: &str, props: &Props, _container: &Self::Container, _context: &Self::HostContext) -> Self::Instance {
		let type_tag = self.config.resolve_type(type_tag).to_owned();
		let handle = self.identities.allocate();
		if cfg!(feature = "dangerous-logging") {
			trace!(%handle, %type_tag, ?props, "Instantiating widget.");
		} else {
			trace!(%handle, %type_tag, "Instantiating widget.");
		}
		self.send("instantiate", |channel| channel.instantiate(handle, &type_tag, props));
		HostNode::new(handle, type_tag, props.clone())
	}

	/// Returns the text sentinel, which the runtime never learns about.
	fn create_text_instance(&mut self, text: &str, _: &Self::Container, _: &Self::HostContext) -> Self::Instance {
		if cfg!(feature = "dangerous-logging") {
			debug!(text, "Ignoring text content.");
		} else {
			debug!("Ignoring text content.");
		}
		HostNode::text_sentinel()
	}

	#[instrument(skip(self))]
	fn append_initial_child(&mut self, parent: &Self::Instance, child: &Self::Instance) {
		self.bind(parent.handle(), child)
	}

	/// Always `false`: There's nothing to do on mount.
	fn finalize_initial_children(&mut self, _: &Self::Instance, _: &str, _: &Props, _: &Self::HostContext) -> bool {
		false
	}

	/// No-op. Never scheduled, since [`finalize_initial_children`](`HostConfig::finalize_initial_children`) returns `false`.
	fn commit_mount(&mut self, _: &Self::Instance, _: &str, _: &Props) {}

	fn get_public_instance(&self, instance: &Self::Instance) -> Self::PublicInstance {
		instance.clone()
	}

	/// Always requests an update. Props were already compared upstream.
	fn prepare_update(&self, _: &Self::Instance, _: &str, _: &Props, _: &Props, _: &Self::HostContext) -> Option<Self::UpdatePayload> {
		Some(())
	}

	/// Replaces the instance's properties wholesale with `new_props` and forwards them.
	#[instrument(skip(self, _payload, _old_props, new_props))]
	fn commit_update(&mut self, instance: &mut Self::Instance, _payload: Self::UpdatePayload, _type_tag: &str, _old_props: &Props, new_props: &Props) {
		if cfg!(feature = "dangerous-logging") {
			trace!(?new_props, "Replacing properties.");
		}
		instance.replace_properties(new_props.clone());
		let handle = instance.handle();
		self.send("apply_property_update", |channel| channel.apply_property_update(handle, new_props))
	}

	/// No-op: Text instances are never bound.
	fn commit_text_update(&mut self, _: &mut Self::Instance, _: &str, _: &str) {}

	/// No-op: Text content is never set.
	fn reset_text_content(&mut self, _: &Self::Instance) {}

	#[instrument(skip(self))]
	fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance) {
		self.bind(parent.handle(), child)
	}

	#[instrument(skip(self))]
	fn append_child_to_container(&mut self, container: &Self::Container, child: &Self::Instance) {
		self.bind(container.handle(), child)
	}

	/// Appends. The runtime can't position a child relative to a sibling.
	#[instrument(skip(self))]
	fn insert_before(&mut self, parent: &Self::Instance, child: &Self::Instance, _before: &Self::Instance) {
		self.bind(parent.handle(), child)
	}

	/// Appends. The runtime can't position a child relative to a sibling.
	#[instrument(skip(self))]
	fn insert_in_container_before(&mut self, container: &Self::Container, child: &Self::Instance, _before: &Self::Instance) {
		self.bind(container.handle(), child)
	}

	/// Unbinds, then terminates `child`. Its handle is dead afterwards.
	#[instrument(skip(self))]
	fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance) {
		self.remove(parent.handle(), child)
	}

	/// Unbinds, then terminates `child`. Its handle is dead afterwards.
	#[instrument(skip(self))]
	fn remove_child_from_container(&mut self, container: &Self::Container, child: &Self::Instance) {
		self.remove(container.handle(), child)
	}

	/// No-op: The display surface is never cleared.
	fn clear_container(&mut self, _: &Self::Container) {}

	/// No-op: Terminating the top of a subtree releases it in the runtime.
	fn detach_deleted_instance(&mut self, _: &Self::Instance) {}

	/// No-op: Nothing is batched.
	fn prepare_for_commit(&mut self, _: &Self::Container) {}

	/// No-op: Nothing is batched.
	fn reset_after_commit(&mut self, _: &Self::Container) {}
}
