//! Serializable snapshots of widget trees.

use core::convert::TryFrom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
	#[error("invalid widget spec: {0}")]
	InvalidInput(String),
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// One widget and its descendants, as plain data.
///
/// Callbacks are never part of a [`WidgetSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
	pub widget_type: String,
	pub props: serde_json::Value,
	#[serde(default)]
	pub children: Vec<WidgetSpec>,
}
impl WidgetSpec {
	#[must_use]
	pub fn new(widget_type: impl Into<String>) -> Self {
		Self {
			widget_type: widget_type.into(),
			props: serde_json::Value::Object(serde_json::Map::new()),
			children: vec![],
		}
	}

	#[must_use]
	pub fn with_props(mut self, props: serde_json::Value) -> Self {
		self.props = props;
		self
	}

	#[must_use]
	pub fn with_children(mut self, children: Vec<WidgetSpec>) -> Self {
		self.children = children;
		self
	}

	/// Checks this tree recursively: Widget types must be non-blank and props must be JSON objects.
	///
	/// # Errors
	///
	/// [`SpecError::InvalidInput`] naming the first offending widget.
	pub fn validate(&self) -> Result<(), SpecError> {
		if self.widget_type.trim().is_empty() {
			return Err(SpecError::InvalidInput("widget_type must not be empty".to_owned()));
		}

		if !self.props.is_object() {
			return Err(SpecError::InvalidInput(format!("props of {:?} must be a JSON object", self.widget_type)));
		}

		self.children.iter().try_for_each(WidgetSpec::validate)
	}

	/// # Errors
	///
	/// Iff validation fails.
	pub fn to_json(&self) -> Result<String, SpecError> {
		self.validate()?;
		Ok(serde_json::to_string(self)?)
	}

	/// Counts this widget and all its descendants.
	#[must_use]
	pub fn len(&self) -> usize {
		1 + self.children.iter().map(WidgetSpec::len).sum::<usize>()
	}

	/// Always `false`, a [`WidgetSpec`] contains at least itself.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		false
	}
}
impl TryFrom<&str> for WidgetSpec {
	type Error = SpecError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		let parsed: WidgetSpec = serde_json::from_str(value)?;
		parsed.validate()?;
		Ok(parsed)
	}
}
