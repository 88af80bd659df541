//! Widget property bags.
//!
//! Property bags are forwarded to the external runtime as-is and replaced wholesale on update.

use core::{
	fmt::{self, Debug, Formatter},
	iter::FromIterator,
};
use hashbrown::{hash_map, HashMap};
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::rc::Rc;

/// An event handler stored in a property, like a button's `on_press`.
///
/// Callbacks compare by identity: Two [`Callback`]s are equal iff they are clones of the same registration.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[PropValue])>);
impl Callback {
	pub fn new(handler: impl Fn(&[PropValue]) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, arguments: &[PropValue]) {
		(self.0)(arguments)
	}

	/// Identity key, stable for as long as any clone of this [`Callback`] is alive.
	#[must_use]
	pub fn key(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}
impl PartialEq for Callback {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}
impl Debug for Callback {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Callback({:#x})", self.key())
	}
}

/// A single property value.
///
/// [`Callback`]s serialize as `null` inside lists and are omitted from serialized [`Props`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	List(Vec<PropValue>),
	Map(Props),
	Callback(Callback),
}
impl PropValue {
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropValue::String(string) => Some(string),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_callback(&self) -> Option<&Callback> {
		match self {
			PropValue::Callback(callback) => Some(callback),
			_ => None,
		}
	}

	/// Visits all [`Callback`]s in this value, including nested ones.
	pub fn for_each_callback(&self, visit: &mut dyn FnMut(&Callback)) {
		match self {
			PropValue::Callback(callback) => visit(callback),
			PropValue::List(items) => items.iter().for_each(|item| item.for_each_callback(visit)),
			PropValue::Map(props) => props.for_each_callback(visit),
			PropValue::Null | PropValue::Bool(_) | PropValue::Int(_) | PropValue::Float(_) | PropValue::String(_) => (),
		}
	}
}
impl Serialize for PropValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			PropValue::Null | PropValue::Callback(_) => serializer.serialize_unit(),
			PropValue::Bool(bool) => serializer.serialize_bool(*bool),
			PropValue::Int(int) => serializer.serialize_i64(*int),
			PropValue::Float(float) => serializer.serialize_f64(*float),
			PropValue::String(string) => serializer.serialize_str(string),
			PropValue::List(items) => items.serialize(serializer),
			PropValue::Map(props) => props.serialize(serializer),
		}
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		PropValue::Bool(value)
	}
}
impl From<i32> for PropValue {
	fn from(value: i32) -> Self {
		PropValue::Int(value.into())
	}
}
impl From<i64> for PropValue {
	fn from(value: i64) -> Self {
		PropValue::Int(value)
	}
}
impl From<f64> for PropValue {
	fn from(value: f64) -> Self {
		PropValue::Float(value)
	}
}
impl From<&str> for PropValue {
	fn from(value: &str) -> Self {
		PropValue::String(value.to_owned())
	}
}
impl From<String> for PropValue {
	fn from(value: String) -> Self {
		PropValue::String(value)
	}
}
impl<T: Into<PropValue>> From<Vec<T>> for PropValue {
	fn from(values: Vec<T>) -> Self {
		PropValue::List(values.into_iter().map(Into::into).collect())
	}
}
impl From<Props> for PropValue {
	fn from(props: Props) -> Self {
		PropValue::Map(props)
	}
}
impl From<Callback> for PropValue {
	fn from(callback: Callback) -> Self {
		PropValue::Callback(callback)
	}
}

/// A mapping of property name to [`PropValue`].
///
/// Serializes as a map with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(HashMap<String, PropValue>);
impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
		self.0.insert(name.into(), value.into())
	}

	pub fn remove(&mut self, name: &str) -> Option<PropValue> {
		self.0.remove(name)
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.0.get(name)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> hash_map::Iter<'_, String, PropValue> {
		self.0.iter()
	}

	/// Entries sorted by name.
	#[must_use]
	pub fn sorted(&self) -> Vec<(&str, &PropValue)> {
		let mut entries: Vec<_> = self.0.iter().map(|(name, value)| (name.as_str(), value)).collect();
		entries.sort_unstable_by_key(|&(name, _)| name);
		entries
	}

	pub fn for_each_callback(&self, visit: &mut dyn FnMut(&Callback)) {
		for value in self.0.values() {
			value.for_each_callback(visit)
		}
	}

	/// Converts this bag into a JSON object, dropping [`Callback`]s.
	#[must_use]
	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
	}
}
impl Serialize for Props {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let entries: Vec<_> = self.sorted().into_iter().filter(|(_, value)| value.as_callback().is_none()).collect();
		let mut map = serializer.serialize_map(Some(entries.len()))?;
		for (name, value) in entries {
			map.serialize_entry(name, value)?;
		}
		map.end()
	}
}
impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}
}
impl<'a> IntoIterator for &'a Props {
	type Item = (&'a String, &'a PropValue);
	type IntoIter = hash_map::Iter<'a, String, PropValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
