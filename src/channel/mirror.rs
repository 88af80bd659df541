use crate::{channel::CommandChannel, handle::Handle, props::Props, widget_spec::WidgetSpec};
use hashbrown::{HashMap, HashSet};
use thiserror::Error;
use tracing::{error, instrument, trace};

/// A command the external runtime would have rejected or silently misapplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
	#[error("{operation} addressed reserved handle {handle}")]
	Reserved { operation: &'static str, handle: Handle },
	#[error("instantiate reused handle {0}")]
	DuplicateHandle(Handle),
	#[error("{operation} addressed unknown handle {handle}")]
	Unknown { operation: &'static str, handle: Handle },
	#[error("{operation} addressed terminated handle {handle}")]
	Terminated { operation: &'static str, handle: Handle },
	#[error("bind_hierarchy({parent}, {child}): child is already bound to {current}")]
	AlreadyBound { parent: Handle, child: Handle, current: Handle },
	#[error("unbind_hierarchy({parent}, {child}): child is not bound there")]
	NotAChild { parent: Handle, child: Handle },
	#[error("terminate({handle}) while still bound to {parent}")]
	TerminatedWhileBound { handle: Handle, parent: Handle },
}

#[derive(Debug)]
struct Widget {
	type_tag: String,
	props: Props,
	parent: Option<Handle>,
	children: Vec<Handle>,
}

/// A headless widget runtime that applies commands to an in-memory widget tree.
///
/// Commands that a real runtime would reject are logged as [`Violation`]s and otherwise applied as far as sensible.
/// Terminating a widget releases its entire subtree.
#[derive(Debug, Default)]
pub struct Mirror {
	widgets: HashMap<Handle, Widget>,
	root_children: Vec<Handle>,
	terminated: HashSet<Handle>,
	violations: Vec<Violation>,
}
impl Mirror {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn violations(&self) -> &[Violation] {
		&self.violations
	}

	/// Number of live widgets, bound or not.
	#[must_use]
	pub fn len(&self) -> usize {
		self.widgets.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.widgets.is_empty()
	}

	#[must_use]
	pub fn is_alive(&self, handle: Handle) -> bool {
		self.widgets.contains_key(&handle)
	}

	#[must_use]
	pub fn is_terminated(&self, handle: Handle) -> bool {
		self.terminated.contains(&handle)
	}

	#[must_use]
	pub fn type_tag(&self, handle: Handle) -> Option<&str> {
		self.widgets.get(&handle).map(|widget| widget.type_tag.as_str())
	}

	#[must_use]
	pub fn props(&self, handle: Handle) -> Option<&Props> {
		self.widgets.get(&handle).map(|widget| &widget.props)
	}

	#[must_use]
	pub fn parent(&self, handle: Handle) -> Option<Handle> {
		self.widgets.get(&handle)?.parent
	}

	/// Children of `parent` in bind order. [`Handle::ROOT`] lists the display surface's children.
	#[must_use]
	pub fn children(&self, parent: Handle) -> &[Handle] {
		if parent.is_root() {
			&self.root_children
		} else {
			self.widgets.get(&parent).map_or(&[][..], |widget| widget.children.as_slice())
		}
	}

	/// Exports everything bound to the display surface.
	#[must_use]
	pub fn snapshot(&self) -> Vec<WidgetSpec> {
		self.root_children.iter().filter_map(|&handle| self.export(handle)).collect()
	}

	fn export(&self, handle: Handle) -> Option<WidgetSpec> {
		let widget = self.widgets.get(&handle)?;
		Some(
			WidgetSpec::new(widget.type_tag.clone())
				.with_props(widget.props.to_json())
				.with_children(widget.children.iter().filter_map(|&child| self.export(child)).collect()),
		)
	}

	fn violation(&mut self, violation: Violation) {
		error!("Protocol violation: {}", violation);
		self.violations.push(violation)
	}

	/// Checks that `handle` names a live widget.
	fn check(&mut self, operation: &'static str, handle: Handle) -> bool {
		if handle.is_sentinel() {
			self.violation(Violation::Reserved { operation, handle });
			false
		} else if self.terminated.contains(&handle) {
			self.violation(Violation::Terminated { operation, handle });
			false
		} else if !self.widgets.contains_key(&handle) {
			self.violation(Violation::Unknown { operation, handle });
			false
		} else {
			true
		}
	}

	fn check_parent(&mut self, operation: &'static str, parent: Handle) -> bool {
		parent.is_root() || self.check(operation, parent)
	}

	fn child_list(&mut self, parent: Handle) -> Option<&mut Vec<Handle>> {
		if parent.is_root() {
			Some(&mut self.root_children)
		} else {
			self.widgets.get_mut(&parent).map(|widget| &mut widget.children)
		}
	}

	fn detach(&mut self, parent: Handle, child: Handle) {
		if let Some(children) = self.child_list(parent) {
			children.retain(|&c| c != child)
		}
		if let Some(widget) = self.widgets.get_mut(&child) {
			widget.parent = None
		}
	}

	fn release(&mut self, handle: Handle) {
		if let Some(widget) = self.widgets.remove(&handle) {
			trace!(%handle, type_tag = %widget.type_tag, "Released widget.");
			self.terminated.insert(handle);
			for child in widget.children {
				self.release(child)
			}
		}
	}
}
impl CommandChannel for Mirror {
	#[instrument(skip(self, props))]
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props) {
		if handle.is_sentinel() {
			return self.violation(Violation::Reserved { operation: "instantiate", handle });
		}
		if self.widgets.contains_key(&handle) || self.terminated.contains(&handle) {
			return self.violation(Violation::DuplicateHandle(handle));
		}
		self.widgets.insert(
			handle,
			Widget {
				type_tag: type_tag.to_owned(),
				props: props.clone(),
				parent: None,
				children: vec![],
			},
		);
	}

	#[instrument(skip(self))]
	fn bind_hierarchy(&mut self, parent: Handle, child: Handle) {
		if !self.check_parent("bind_hierarchy", parent) || !self.check("bind_hierarchy", child) {
			return;
		}
		if let Some(current) = self.parent(child) {
			return self.violation(Violation::AlreadyBound { parent, child, current });
		}
		if let Some(children) = self.child_list(parent) {
			children.push(child)
		}
		if let Some(widget) = self.widgets.get_mut(&child) {
			widget.parent = Some(parent)
		}
	}

	#[instrument(skip(self))]
	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle) {
		if !self.check_parent("unbind_hierarchy", parent) || !self.check("unbind_hierarchy", child) {
			return;
		}
		if self.parent(child) != Some(parent) {
			return self.violation(Violation::NotAChild { parent, child });
		}
		self.detach(parent, child)
	}

	#[instrument(skip(self, props))]
	fn apply_property_update(&mut self, handle: Handle, props: &Props) {
		if !self.check("apply_property_update", handle) {
			return;
		}
		if let Some(widget) = self.widgets.get_mut(&handle) {
			widget.props = props.clone()
		}
	}

	#[instrument(skip(self))]
	fn terminate(&mut self, handle: Handle) {
		if !self.check("terminate", handle) {
			return;
		}
		if let Some(parent) = self.parent(handle) {
			self.violation(Violation::TerminatedWhileBound { handle, parent });
			self.detach(parent, handle)
		}
		self.release(handle)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handle::IdentityAllocator;
	use serde_json::json;

	fn label(mirror: &mut Mirror, identities: &mut IdentityAllocator, text: &str) -> Handle {
		let handle = identities.allocate();
		mirror.instantiate(handle, "Label", &Props::new().with("text", text));
		handle
	}

	#[test]
	fn builds_and_snapshots_tree() {
		let mut identities = IdentityAllocator::new();
		let mut mirror = Mirror::new();
		let layout = identities.allocate();
		mirror.instantiate(layout, "BoxLayout", &Props::new().with("orientation", "vertical"));
		let a = label(&mut mirror, &mut identities, "a");
		let b = label(&mut mirror, &mut identities, "b");
		mirror.bind_hierarchy(layout, a);
		mirror.bind_hierarchy(layout, b);
		mirror.bind_hierarchy(Handle::ROOT, layout);

		assert!(mirror.violations().is_empty());
		assert_eq!(mirror.children(layout), &[a, b]);
		assert_eq!(
			mirror.snapshot(),
			vec![WidgetSpec::new("BoxLayout").with_props(json!({ "orientation": "vertical" })).with_children(vec![
				WidgetSpec::new("Label").with_props(json!({ "text": "a" })),
				WidgetSpec::new("Label").with_props(json!({ "text": "b" })),
			])]
		);
	}

	#[test]
	fn terminate_releases_subtree() {
		let mut identities = IdentityAllocator::new();
		let mut mirror = Mirror::new();
		let layout = identities.allocate();
		mirror.instantiate(layout, "BoxLayout", &Props::new());
		let a = label(&mut mirror, &mut identities, "a");
		mirror.bind_hierarchy(layout, a);
		mirror.bind_hierarchy(Handle::ROOT, layout);

		mirror.unbind_hierarchy(Handle::ROOT, layout);
		mirror.terminate(layout);

		assert!(mirror.violations().is_empty());
		assert!(mirror.is_empty());
		assert!(mirror.is_terminated(a));
		assert!(mirror.snapshot().is_empty());
	}

	#[test]
	fn records_violations() {
		let mut identities = IdentityAllocator::new();
		let mut mirror = Mirror::new();
		let a = label(&mut mirror, &mut identities, "a");
		let b = label(&mut mirror, &mut identities, "b");
		let unknown = identities.allocate();

		mirror.instantiate(Handle::ROOT, "Label", &Props::new());
		mirror.instantiate(a, "Label", &Props::new());
		mirror.bind_hierarchy(Handle::ROOT, a);
		mirror.bind_hierarchy(b, a);
		mirror.unbind_hierarchy(b, a);
		mirror.apply_property_update(unknown, &Props::new());
		mirror.terminate(a);
		mirror.apply_property_update(a, &Props::new());
		mirror.bind_hierarchy(Handle::ROOT, Handle::TEXT);

		assert_eq!(
			mirror.violations(),
			&[
				Violation::Reserved { operation: "instantiate", handle: Handle::ROOT },
				Violation::DuplicateHandle(a),
				Violation::AlreadyBound { parent: b, child: a, current: Handle::ROOT },
				Violation::NotAChild { parent: b, child: a },
				Violation::Unknown { operation: "apply_property_update", handle: unknown },
				Violation::TerminatedWhileBound { handle: a, parent: Handle::ROOT },
				Violation::Terminated { operation: "apply_property_update", handle: a },
				Violation::Reserved { operation: "bind_hierarchy", handle: Handle::TEXT },
			]
		);
		assert!(mirror.children(Handle::ROOT).is_empty());
	}
}
