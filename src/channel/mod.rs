//! The one-way command surface of the external widget runtime.
//!
//! Every operation is fire-and-forget: Nothing is returned, nothing is acknowledged and nothing is retried.
//! Implementations must swallow their own failures.

use crate::{handle::Handle, props::Props};
use serde::Serialize;
use std::{cell::RefCell, rc::Rc};

mod json_lines;
mod mirror;

#[cfg(target_arch = "wasm32")]
mod js;

pub use json_lines::JsonLinesChannel;
pub use mirror::{Mirror, Violation};

#[cfg(target_arch = "wasm32")]
pub use js::JsChannel;

/// Instructs the external widget runtime.
///
/// The runtime is expected to apply commands in the order they are sent.
pub trait CommandChannel {
	/// Creates a widget of kind `type_tag`, addressable by `handle` from then on.
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props);

	/// Attaches `child` under `parent`. A `parent` of [`Handle::ROOT`] means the display surface.
	fn bind_hierarchy(&mut self, parent: Handle, child: Handle);

	/// Detaches `child` from `parent`.
	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle);

	/// Replaces the widget's property set wholesale.
	fn apply_property_update(&mut self, handle: Handle, props: &Props);

	/// Destroys the widget and releases its resources.
	fn terminate(&mut self, handle: Handle);
}

impl<C: CommandChannel + ?Sized> CommandChannel for Box<C> {
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props) {
		(**self).instantiate(handle, type_tag, props)
	}

	fn bind_hierarchy(&mut self, parent: Handle, child: Handle) {
		(**self).bind_hierarchy(parent, child)
	}

	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle) {
		(**self).unbind_hierarchy(parent, child)
	}

	fn apply_property_update(&mut self, handle: Handle, props: &Props) {
		(**self).apply_property_update(handle, props)
	}

	fn terminate(&mut self, handle: Handle) {
		(**self).terminate(handle)
	}
}

impl<C: CommandChannel + ?Sized> CommandChannel for &mut C {
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props) {
		(**self).instantiate(handle, type_tag, props)
	}

	fn bind_hierarchy(&mut self, parent: Handle, child: Handle) {
		(**self).bind_hierarchy(parent, child)
	}

	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle) {
		(**self).unbind_hierarchy(parent, child)
	}

	fn apply_property_update(&mut self, handle: Handle, props: &Props) {
		(**self).apply_property_update(handle, props)
	}

	fn terminate(&mut self, handle: Handle) {
		(**self).terminate(handle)
	}
}

/// An owned command, as sent through a [`CommandChannel`].
///
/// Serializes with an `"op"` tag, e.g. `{"op":"bind_hierarchy","parent":0,"child":1}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
	Instantiate { handle: Handle, type_tag: String, props: Props },
	BindHierarchy { parent: Handle, child: Handle },
	UnbindHierarchy { parent: Handle, child: Handle },
	ApplyPropertyUpdate { handle: Handle, props: Props },
	Terminate { handle: Handle },
}
impl Command {
	/// Sends this command (again) through `channel`.
	pub fn send(&self, channel: &mut dyn CommandChannel) {
		match self {
			Command::Instantiate { handle, type_tag, props } => channel.instantiate(*handle, type_tag, props),
			Command::BindHierarchy { parent, child } => channel.bind_hierarchy(*parent, *child),
			Command::UnbindHierarchy { parent, child } => channel.unbind_hierarchy(*parent, *child),
			Command::ApplyPropertyUpdate { handle, props } => channel.apply_property_update(*handle, props),
			Command::Terminate { handle } => channel.terminate(*handle),
		}
	}

	/// Every widget handle this command references, parent first.
	#[must_use]
	pub fn handles(&self) -> Vec<Handle> {
		match *self {
			Command::Instantiate { handle, .. } | Command::ApplyPropertyUpdate { handle, .. } | Command::Terminate { handle } => vec![handle],
			Command::BindHierarchy { parent, child } | Command::UnbindHierarchy { parent, child } => vec![parent, child],
		}
	}
}

/// Logs every command it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Command>>>);
impl Recorder {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn commands(&self) -> Vec<Command> {
		self.0.borrow().clone()
	}

	/// Removes and returns all commands logged so far.
	pub fn take(&self) -> Vec<Command> {
		self.0.borrow_mut().split_off(0)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}

	fn push(&mut self, command: Command) {
		self.0.borrow_mut().push(command)
	}
}
impl CommandChannel for Recorder {
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props) {
		self.push(Command::Instantiate {
			handle,
			type_tag: type_tag.to_owned(),
			props: props.clone(),
		})
	}

	fn bind_hierarchy(&mut self, parent: Handle, child: Handle) {
		self.push(Command::BindHierarchy { parent, child })
	}

	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle) {
		self.push(Command::UnbindHierarchy { parent, child })
	}

	fn apply_property_update(&mut self, handle: Handle, props: &Props) {
		self.push(Command::ApplyPropertyUpdate { handle, props: props.clone() })
	}

	fn terminate(&mut self, handle: Handle) {
		self.push(Command::Terminate { handle })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handle::IdentityAllocator;
	use serde_json::json;

	#[test]
	fn recorder_clones_share_log() {
		let recorder = Recorder::new();
		let mut channel: Box<dyn CommandChannel> = Box::new(recorder.clone());
		channel.bind_hierarchy(Handle::ROOT, IdentityAllocator::new().allocate());
		assert_eq!(recorder.len(), 1);
		assert_eq!(recorder.take().len(), 1);
		assert!(recorder.is_empty());
	}

	#[test]
	fn commands_replay() {
		let mut identities = IdentityAllocator::new();
		let (a, b) = (identities.allocate(), identities.allocate());
		let commands = vec![
			Command::Instantiate {
				handle: a,
				type_tag: "BoxLayout".to_owned(),
				props: Props::new(),
			},
			Command::BindHierarchy { parent: Handle::ROOT, child: a },
			Command::UnbindHierarchy { parent: a, child: b },
			Command::ApplyPropertyUpdate { handle: b, props: Props::new() },
			Command::Terminate { handle: b },
		];

		let mut recorder = Recorder::new();
		for command in &commands {
			command.send(&mut recorder);
		}
		assert_eq!(recorder.commands(), commands);
	}

	#[test]
	fn serialized_shape() {
		let handle = IdentityAllocator::new().allocate();
		let command = Command::Instantiate {
			handle,
			type_tag: "Label".to_owned(),
			props: Props::new().with("text", "hi"),
		};
		assert_eq!(
			serde_json::to_value(&command).unwrap(),
			json!({ "op": "instantiate", "handle": 1, "type_tag": "Label", "props": { "text": "hi" } })
		);
		assert_eq!(
			serde_json::to_value(&Command::Terminate { handle }).unwrap(),
			json!({ "op": "terminate", "handle": 1 })
		);
		assert_eq!(Command::BindHierarchy { parent: Handle::ROOT, child: handle }.handles(), vec![Handle::ROOT, handle]);
	}
}
