//! The callback set a [`Root`](`crate::Root`) drives.
//!
//! Every method is required, including the ones a given host has no use for:
//! Implementations spell out their no-ops rather than inheriting them silently.
//!
//! Text instances share the [`HostConfig::Instance`] type, so the child callbacks accept either.

use crate::props::Props;

/// A target renderer, as seen by the reconciliation engine.
pub trait HostConfig {
	/// A created host node.
	type Instance;
	/// Whatever the engine renders into.
	type Container;
	/// Information passed down the tree during creation.
	type HostContext;
	/// Returned by [`prepare_update`](`HostConfig::prepare_update`), consumed by [`commit_update`](`HostConfig::commit_update`).
	type UpdatePayload;
	/// What the engine exposes to consumers in place of an [`Instance`](`HostConfig::Instance`).
	type PublicInstance;
	/// Returned by [`schedule_timeout`](`HostConfig::schedule_timeout`).
	type TimeoutHandle;

	const SUPPORTS_MUTATION: bool;
	const SUPPORTS_PERSISTENCE: bool;
	const SUPPORTS_HYDRATION: bool;
	const IS_PRIMARY_RENDERER: bool;

	// Scheduling

	/// Milliseconds since an arbitrary, fixed epoch.
	fn now(&self) -> f64;
	fn schedule_timeout(&mut self, callback: Box<dyn FnOnce()>, delay_ms: f64) -> Self::TimeoutHandle;
	fn cancel_timeout(&mut self, timeout: Self::TimeoutHandle);
	/// A [`TimeoutHandle`](`HostConfig::TimeoutHandle`) that never refers to a scheduled timeout.
	fn no_timeout(&self) -> Self::TimeoutHandle;

	// Context

	fn get_root_host_context(&self, container: &Self::Container) -> Self::HostContext;
	fn get_child_host_context(&self, parent_context: &Self::HostContext, type_tag: &str) -> Self::HostContext;
	/// Whether the element's text children become part of its own content rather than separate instances.
	fn should_set_text_content(&self, type_tag: &str, props: &Props) -> bool;

	// Creation

	fn create_instance(&mut self, type_tag: &str, props: &Props, container: &Self::Container, context: &Self::HostContext) -> Self::Instance;
	fn create_text_instance(&mut self, text: &str, container: &Self::Container, context: &Self::HostContext) -> Self::Instance;
	/// Attaches `child` to a `parent` that hasn't been placed yet.
	fn append_initial_child(&mut self, parent: &Self::Instance, child: &Self::Instance);
	/// Called after all initial children are appended. Returning `true` schedules [`commit_mount`](`HostConfig::commit_mount`).
	fn finalize_initial_children(&mut self, instance: &Self::Instance, type_tag: &str, props: &Props, context: &Self::HostContext) -> bool;
	fn commit_mount(&mut self, instance: &Self::Instance, type_tag: &str, props: &Props);
	fn get_public_instance(&self, instance: &Self::Instance) -> Self::PublicInstance;

	// Updates

	/// Returns [`None`] to skip [`commit_update`](`HostConfig::commit_update`).
	fn prepare_update(&self, instance: &Self::Instance, type_tag: &str, old_props: &Props, new_props: &Props, context: &Self::HostContext) -> Option<Self::UpdatePayload>;
	fn commit_update(&mut self, instance: &mut Self::Instance, payload: Self::UpdatePayload, type_tag: &str, old_props: &Props, new_props: &Props);
	fn commit_text_update(&mut self, instance: &mut Self::Instance, old_text: &str, new_text: &str);
	/// Clears content set because [`should_set_text_content`](`HostConfig::should_set_text_content`) returned `true` earlier.
	fn reset_text_content(&mut self, instance: &Self::Instance);

	// Composition

	fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance);
	fn append_child_to_container(&mut self, container: &Self::Container, child: &Self::Instance);
	fn insert_before(&mut self, parent: &Self::Instance, child: &Self::Instance, before: &Self::Instance);
	fn insert_in_container_before(&mut self, container: &Self::Container, child: &Self::Instance, before: &Self::Instance);
	fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance);
	fn remove_child_from_container(&mut self, container: &Self::Container, child: &Self::Instance);
	/// Called before the first commit into `container`.
	fn clear_container(&mut self, container: &Self::Container);
	/// Called for every instance of a deleted subtree, after its top was removed.
	fn detach_deleted_instance(&mut self, instance: &Self::Instance);

	// Commit

	fn prepare_for_commit(&mut self, container: &Self::Container);
	fn reset_after_commit(&mut self, container: &Self::Container);
}
