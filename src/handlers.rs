//! Reference-counted publication of [`Callback`]s to the external runtime.
//!
//! A callback may appear in the properties of many widgets at once. It's published once and
//! unpublished when no live widget's properties reference it anymore.
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use crate::{handle::Handle, props::Callback, props::Props};
use core::hash::Hash;
use hashbrown::{
	hash_map::{DrainFilter, Entry},
	HashMap,
};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};
use tracing::{error, trace};

pub(crate) struct CountSaturatedError;

/// A map whose entries carry a reference count. Entries at zero are "weak" and removed by [`RcHashMap::drain_weak`].
pub(crate) struct RcHashMap<K, C, V>(HashMap<K, (C, V)>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero;
impl<K, C, V> RcHashMap<K, C, V>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
{
	pub fn new() -> Self {
		Self(HashMap::new())
	}

	pub fn increment_or_insert_with<F: FnOnce(&K) -> V>(&mut self, k: K, v: F) -> Result<&mut V, CountSaturatedError> {
		match self.0.entry(k) {
			Entry::Occupied(occupied) => {
				let (c, v) = occupied.into_mut();
				*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok(v)
			}
			Entry::Vacant(vacant) => {
				let v = v(vacant.key());
				let (_, v) = vacant.insert((C::one(), v));
				Ok(v)
			}
		}
	}

	pub fn weak_decrement(&mut self, k: &K) -> Result<Option<&mut V>, CountSaturatedError> {
		match self.0.get_mut(k) {
			Some((c, v)) => {
				*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				Ok(Some(v))
			}
			None => Ok(None),
		}
	}

	pub fn get(&self, k: &K) -> Option<&V> {
		self.0.get(k).map(|(_, v)| v)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn drain_weak(&mut self) -> DrainWeak<'_, K, C, V> {
		DrainWeak(self.0.drain_filter(DrainWeak::weak_filter))
	}
}

pub(crate) struct DrainWeak<'a, K, C, V>(DrainFilter<'a, K, (C, V), fn(&K, &mut (C, V)) -> bool>);
impl<'a, K, C, V> DrainWeak<'a, K, C, V>
where
	C: Zero,
{
	fn weak_filter(_: &K, (c, _): &mut (C, V)) -> bool {
		c.is_zero()
	}
}
impl<'a, K, C, V> Iterator for DrainWeak<'a, K, C, V> {
	type Item = (K, V);

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next().map(|(k, (_, v))| (k, v))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.0.size_hint()
	}
}

/// Tracks which widgets reference which published callbacks.
///
/// `P` is whatever the runtime needs to invoke a callback, e.g. a JavaScript function.
/// Widget hierarchy is tracked as well, since terminating a widget releases its whole subtree.
pub(crate) struct HandlerTable<P> {
	published: RcHashMap<usize, u32, (Callback, P)>,
	by_widget: HashMap<Handle, Vec<usize>>,
	children: HashMap<Handle, Vec<Handle>>,
}
impl<P> HandlerTable<P> {
	pub fn new() -> Self {
		Self {
			published: RcHashMap::new(),
			by_widget: HashMap::new(),
			children: HashMap::new(),
		}
	}

	/// Replaces the callbacks referenced by `handle` with those in `props`,
	/// publishing new ones through `publish` and unpublishing unreferenced ones.
	///
	/// # Panics
	///
	/// Iff a single callback is referenced more than [`u32::MAX`] times.
	pub fn assign(&mut self, handle: Handle, props: &Props, publish: &mut dyn FnMut(&Callback) -> P) {
		let mut keys = vec![];
		let published = &mut self.published;
		props.for_each_callback(&mut |callback| {
			let key = callback.key();
			if published.increment_or_insert_with(key, |_| (callback.clone(), publish(callback))).is_err() {
				panic!("host-bridge: Too many (more than 4G) active references to the same `Callback`")
			}
			keys.push(key);
		});

		let previous = if keys.is_empty() { self.by_widget.remove(&handle) } else { self.by_widget.insert(handle, keys) };
		for key in previous.into_iter().flatten() {
			self.decrement(key)
		}
		self.collect();
	}

	pub fn bind(&mut self, parent: Handle, child: Handle) {
		self.children.entry(parent).or_default().push(child)
	}

	pub fn unbind(&mut self, parent: Handle, child: Handle) {
		if let Some(children) = self.children.get_mut(&parent) {
			children.retain(|&c| c != child)
		}
	}

	/// Drops all references held by `handle` and its descendants.
	pub fn release(&mut self, handle: Handle) {
		self.release_subtree(handle);
		for children in self.children.values_mut() {
			children.retain(|&c| c != handle)
		}
		self.collect();
	}

	fn release_subtree(&mut self, handle: Handle) {
		for key in self.by_widget.remove(&handle).into_iter().flatten() {
			self.decrement(key)
		}
		for child in self.children.remove(&handle).into_iter().flatten() {
			self.release_subtree(child)
		}
	}

	fn decrement(&mut self, key: usize) {
		match self.published.weak_decrement(&key) {
			Ok(Some(_)) => (),
			Ok(None) => error!("Tried to decrement callback {:#x} that isn't published", key),
			Err(CountSaturatedError) => error!("Tried to decrement callback {:#x} more often than referenced", key),
		}
	}

	fn collect(&mut self) {
		let freed = self.published.drain_weak().count();
		if freed > 0 {
			trace!("Unpublished {} callback(s).", freed);
		}
	}

	/// What was published for the callback with this [`Callback::key`].
	pub fn published(&self, key: usize) -> Option<&P> {
		self.published.get(&key).map(|(_, p)| p)
	}

	pub fn callback(&self, key: usize) -> Option<&Callback> {
		self.published.get(&key).map(|(callback, _)| callback)
	}

	pub fn len(&self) -> usize {
		self.published.len()
	}
}
