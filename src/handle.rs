//! Widget identities.

use core::fmt::{self, Display, Formatter};
use serde::Serialize;
use tracing::trace;

/// The integer identity by which the external runtime addresses a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Handle(i64);
impl Handle {
	/// The implicit top-level display container. Never instantiated or terminated.
	pub const ROOT: Self = Self(0);

	/// Carried by text instances, which the runtime never learns about.
	pub const TEXT: Self = Self(-1);

	#[must_use]
	pub fn get(self) -> i64 {
		self.0
	}

	#[must_use]
	pub fn is_root(self) -> bool {
		self == Self::ROOT
	}

	/// Whether this handle is one of the reserved sentinels rather than a real widget.
	#[must_use]
	pub fn is_sentinel(self) -> bool {
		self.0 <= 0
	}
}
impl Display for Handle {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}
impl From<i64> for Handle {
	fn from(handle: i64) -> Self {
		Self(handle)
	}
}
impl From<Handle> for i64 {
	fn from(handle: Handle) -> Self {
		handle.0
	}
}

/// Hands out [`Handle`]s in strictly increasing order, starting just above [`Handle::ROOT`].
///
/// Handles are never recycled.
#[derive(Debug)]
pub struct IdentityAllocator {
	next: i64,
}
impl Default for IdentityAllocator {
	fn default() -> Self {
		Self::new()
	}
}
impl IdentityAllocator {
	#[must_use]
	pub fn new() -> Self {
		Self { next: Handle::ROOT.0 + 1 }
	}

	/// # Panics
	///
	/// Iff the handle space is exhausted.
	pub fn allocate(&mut self) -> Handle {
		let handle = Handle(self.next);
		self.next = self.next.checked_add(1).expect("host-bridge: Handle space exhausted");
		trace!(%handle, "Allocated handle.");
		handle
	}

	/// The handle the next call to [`allocate`](`IdentityAllocator::allocate`) will return.
	#[must_use]
	pub fn peek(&self) -> Handle {
		Handle(self.next)
	}
}
