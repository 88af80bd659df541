use hashbrown::HashMap;
use std::borrow::Cow;

/// Adapter and binding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Name of the global binding object the JavaScript channel looks up.
	pub binding_name: Cow<'static, str>,
	/// Element type tags to rename before they reach the runtime, e.g. `View` → `BoxLayout`.
	///
	/// Aliases are resolved once. They don't chain.
	pub type_aliases: HashMap<String, String>,
}
impl Default for Config {
	fn default() -> Self {
		Self {
			binding_name: Cow::Borrowed("Kivy"),
			type_aliases: HashMap::new(),
		}
	}
}
impl Config {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Aliases for Kivy's widget classes.
	#[must_use]
	pub fn kivy() -> Self {
		Self::new().with_alias("View", "BoxLayout")
	}

	#[must_use]
	pub fn with_binding_name(mut self, binding_name: impl Into<Cow<'static, str>>) -> Self {
		self.binding_name = binding_name.into();
		self
	}

	#[must_use]
	pub fn with_alias(mut self, type_tag: impl Into<String>, runtime_type: impl Into<String>) -> Self {
		self.type_aliases.insert(type_tag.into(), runtime_type.into());
		self
	}

	/// The type tag the runtime should see for `type_tag`.
	#[must_use]
	pub fn resolve_type<'a>(&'a self, type_tag: &'a str) -> &'a str {
		self.type_aliases.get(type_tag).map_or(type_tag, String::as_str)
	}
}
