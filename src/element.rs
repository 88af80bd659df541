//! The declarative element tree a [`Root`](`crate::Root`) renders.

use crate::props::{PropValue, Props};

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
	Host(HostElement),
	Text(String),
}

/// A widget of kind `type_tag`, identified among its siblings by `key` or, failing that, by position.
#[derive(Debug, Clone, PartialEq)]
pub struct HostElement {
	pub type_tag: String,
	pub key: Option<String>,
	pub props: Props,
	pub children: Vec<Element>,
}

#[must_use]
pub fn element(type_tag: impl Into<String>) -> HostElement {
	HostElement {
		type_tag: type_tag.into(),
		key: None,
		props: Props::new(),
		children: vec![],
	}
}

#[must_use]
pub fn text(text: impl Into<String>) -> Element {
	Element::Text(text.into())
}

impl HostElement {
	#[must_use]
	pub fn key(mut self, key: impl ToString) -> Self {
		self.key = Some(key.to_string());
		self
	}

	#[must_use]
	pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		self.props.insert(name, value);
		self
	}

	/// Replaces all props.
	#[must_use]
	pub fn props(mut self, props: Props) -> Self {
		self.props = props;
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Element>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Element>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}
}

impl From<HostElement> for Element {
	fn from(element: HostElement) -> Self {
		Element::Host(element)
	}
}
impl From<&str> for Element {
	fn from(text: &str) -> Self {
		Element::Text(text.to_owned())
	}
}
impl From<String> for Element {
	fn from(text: String) -> Self {
		Element::Text(text)
	}
}
