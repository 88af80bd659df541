use crate::{handle::Handle, props::Props};
use core::fmt::{self, Debug, Formatter};

/// The adapter's shadow record of one live external widget.
///
/// Properties only appear in [`Debug`] output with the `"dangerous-logging"` feature.
#[derive(Clone, PartialEq)]
pub struct HostNode {
	handle: Handle,
	type_tag: String,
	properties: Props,
}
impl HostNode {
	#[must_use]
	pub fn new(handle: Handle, type_tag: impl Into<String>, properties: Props) -> Self {
		Self {
			handle,
			type_tag: type_tag.into(),
			properties,
		}
	}

	/// The record handed out for text instances.
	///
	/// Widgets manage their text through explicit properties, so this record is never instantiated, bound or updated.
	#[must_use]
	pub fn text_sentinel() -> Self {
		Self::new(Handle::TEXT, "text", Props::new())
	}

	#[must_use]
	pub fn handle(&self) -> Handle {
		self.handle
	}

	#[must_use]
	pub fn type_tag(&self) -> &str {
		&self.type_tag
	}

	#[must_use]
	pub fn properties(&self) -> &Props {
		&self.properties
	}

	#[must_use]
	pub fn is_text_sentinel(&self) -> bool {
		self.handle == Handle::TEXT
	}

	/// Replaces all properties. Nothing is merged.
	pub fn replace_properties(&mut self, properties: Props) -> Props {
		core::mem::replace(&mut self.properties, properties)
	}
}

impl Debug for HostNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("HostNode");
		debug.field("handle", &self.handle).field("type_tag", &self.type_tag);
		if cfg!(feature = "dangerous-logging") {
			debug.field("properties", &self.properties);
		}
		debug.finish()
	}
}

/// The implicit top-level display surface, addressed as [`Handle::ROOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RootContainer;
impl RootContainer {
	#[must_use]
	pub fn handle(self) -> Handle {
		Handle::ROOT
	}
}
