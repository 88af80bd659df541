//! A synchronous reconciliation engine.
//!
//! Each [`Root::update`] diffs the given [`Element`] tree against the previously committed one
//! and drives its [`HostConfig`] through a single commit:
//!
//! 1. [`clear_container`](`HostConfig::clear_container`), on the first commit only, then [`prepare_for_commit`](`HostConfig::prepare_for_commit`).
//! 2. Per sibling list, top-down:
//!    1. Deletions. The top of each deleted subtree is removed from its parent,
//!       then [`detach_deleted_instance`](`HostConfig::detach_deleted_instance`) visits the subtree children-first.
//!    2. Updates of retained nodes and creation of new subtrees, in sibling order.
//!       New subtrees are assembled with [`append_initial_child`](`HostConfig::append_initial_child`) before they are placed.
//!    3. Placement of new and moved nodes, each before the next sibling that stays where it is, or appended.
//! 3. [`commit_mount`](`HostConfig::commit_mount`) for new instances that asked for it, then [`reset_after_commit`](`HostConfig::reset_after_commit`).
//!
//! Siblings are matched by key where one is given and by position among unkeyed siblings otherwise.
//! A matched node whose type changed is replaced.

use crate::{
	element::{Element, HostElement},
	host_config::HostConfig,
	props::Props,
};
use core::{
	fmt::{self, Debug, Formatter},
	mem, slice,
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use tracing::{debug, error, instrument, level_filters::STATIC_MAX_LEVEL, trace_span, warn, Level};

/// How many levels of elements a [`Root`] renders by default.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// A render target together with the tree last committed to it.
pub struct Root<H: HostConfig> {
	host: H,
	container: H::Container,
	context: H::HostContext,
	children: Vec<Fiber<H::Instance>>,
	mounted: bool,
	depth_limit: usize,
}

impl<H: HostConfig> Root<H> {
	#[must_use]
	pub fn new(host: H, container: H::Container) -> Self {
		let context = host.get_root_host_context(&container);
		Self {
			host,
			container,
			context,
			children: vec![],
			mounted: false,
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}

	/// Limits how many levels of elements are rendered.
	///
	/// Deeper elements are skipped with an error, which leaves their part of the tree as it was.
	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// Renders `element` as the only top-level node.
	pub fn update(&mut self, element: impl Into<Element>) {
		let element = element.into();
		self.commit(slice::from_ref(&element))
	}

	/// Renders `elements` as top-level siblings.
	pub fn update_fragment<I>(&mut self, elements: I)
	where
		I: IntoIterator,
		I::Item: Into<Element>,
	{
		let elements: Vec<Element> = elements.into_iter().map(Into::into).collect();
		self.commit(&elements)
	}

	/// Removes everything rendered so far.
	pub fn unmount(&mut self) {
		if self.mounted {
			self.commit(&[])
		}
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.mounted
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	#[must_use]
	pub fn container(&self) -> &H::Container {
		&self.container
	}

	/// Gives up the host without unmounting.
	#[must_use]
	pub fn into_host(self) -> H {
		self.host
	}

	/// Looks up a committed node by its sibling indices, starting at the top level.
	#[must_use]
	pub fn public_instance(&self, path: &[usize]) -> Option<H::PublicInstance> {
		let (first, rest) = path.split_first()?;
		let mut fiber = self.children.get(*first)?;
		for index in rest {
			fiber = fiber.children.get(*index)?;
		}
		Some(self.host.get_public_instance(&fiber.instance))
	}

	#[instrument(skip(self, elements))]
	fn commit(&mut self, elements: &[Element]) {
		let started = self.host.now();
		if !self.mounted {
			self.host.clear_container(&self.container);
			self.mounted = true;
		}
		self.host.prepare_for_commit(&self.container);

		let old = mem::take(&mut self.children);
		let mut pass = Pass {
			host: &mut self.host,
			container: &self.container,
		};
		let mut children = pass.reconcile(Parent::Container, old, elements, &self.context, self.depth_limit);
		for child in &mut children {
			pass.commit_mounts(child)
		}
		self.children = children;

		self.host.reset_after_commit(&self.container);
		debug!(elapsed_ms = self.host.now() - started, "Committed.");
	}
}

impl<H: HostConfig + Debug> Debug for Root<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Root")
			.field("host", &self.host)
			.field("mounted", &self.mounted)
			.field("top_level_nodes", &self.children.len())
			.field("depth_limit", &self.depth_limit)
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
	Explicit(String),
	Implicit(usize),
}

fn keys(elements: &[Element]) -> Vec<Key> {
	let mut implicit = 0;
	let mut explicit = HashSet::new();
	elements
		.iter()
		.map(|element| match element {
			Element::Host(HostElement { key: Some(key), .. }) => {
				if STATIC_MAX_LEVEL >= Level::WARN && !explicit.insert(key.as_str()) {
					warn!("Duplicate key {:?} among siblings. Only the first one is matched across updates.", key)
				}
				Key::Explicit(key.clone())
			}
			_ => {
				implicit += 1;
				Key::Implicit(implicit - 1)
			}
		})
		.collect()
}

struct Fiber<I> {
	key: Key,
	kind: Kind,
	instance: I,
	children: Vec<Fiber<I>>,
	pending_mount: bool,
}

enum Kind {
	Host { type_tag: String, props: Props, text_content: bool },
	Text(String),
}
impl Kind {
	fn matches(&self, element: &Element) -> bool {
		match (self, element) {
			(Kind::Host { type_tag, .. }, Element::Host(element)) => *type_tag == element.type_tag,
			(Kind::Text(_), Element::Text(_)) => true,
			_ => false,
		}
	}
}

enum Parent<'a, I> {
	Container,
	Instance(&'a I),
}
impl<I> Clone for Parent<'_, I> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<I> Copy for Parent<'_, I> {}

struct Pass<'a, H: HostConfig> {
	host: &'a mut H,
	container: &'a H::Container,
}

impl<H: HostConfig> Pass<'_, H> {
	/// `depth` is the number of levels, including this one, that may still be rendered.
	fn reconcile(&mut self, parent: Parent<'_, H::Instance>, old: Vec<Fiber<H::Instance>>, elements: &[Element], context: &H::HostContext, depth: usize) -> Vec<Fiber<H::Instance>> {
		if depth == 0 {
			if !elements.is_empty() {
				error!("Depth limit reached. Skipping {} element(s).", elements.len());
			}
			return old;
		}

		let mut deletions = vec![];
		let mut previous = HashMap::with_capacity(old.len());
		for (index, fiber) in old.into_iter().enumerate() {
			match previous.entry(fiber.key.clone()) {
				Entry::Occupied(_) => deletions.push(fiber),
				Entry::Vacant(vacant) => {
					vacant.insert((index, fiber));
				}
			}
		}

		let keys = keys(elements);
		let mut matched = Vec::with_capacity(elements.len());
		let mut last_placed = 0;
		for (element, key) in elements.iter().zip(&keys) {
			matched.push(match previous.remove(key) {
				Some((index, fiber)) if fiber.kind.matches(element) => {
					let moved = index < last_placed;
					last_placed = last_placed.max(index);
					Some((fiber, moved))
				}
				Some((_, fiber)) => {
					deletions.push(fiber);
					None
				}
				None => None,
			})
		}
		let mut unmatched: Vec<_> = previous.into_iter().map(|(_, entry)| entry).collect();
		unmatched.sort_by_key(|(index, _)| *index);
		deletions.extend(unmatched.into_iter().map(|(_, fiber)| fiber));

		for fiber in deletions {
			self.delete(parent, fiber)
		}

		let mut children = Vec::with_capacity(elements.len());
		let mut placements = Vec::with_capacity(elements.len());
		for ((element, key), matched) in elements.iter().zip(keys).zip(matched) {
			match matched {
				Some((mut fiber, moved)) => {
					self.update(&mut fiber, element, context, depth);
					children.push(fiber);
					placements.push(moved);
				}
				None => {
					children.push(self.create(key, element, context, depth));
					placements.push(true);
				}
			}
		}

		let mut anchors = vec![None; children.len()];
		let mut anchor = None;
		for index in (0..children.len()).rev() {
			anchors[index] = anchor;
			if !placements[index] {
				anchor = Some(index)
			}
		}
		for (index, child) in children.iter().enumerate() {
			if placements[index] {
				self.place(parent, &child.instance, anchors[index].map(|anchor: usize| &children[anchor].instance))
			}
		}

		children
	}

	fn update(&mut self, fiber: &mut Fiber<H::Instance>, element: &Element, context: &H::HostContext, depth: usize) {
		match (&mut fiber.kind, element) {
			(Kind::Host { type_tag, props, text_content }, Element::Host(element)) => {
				let type_tag: &str = type_tag;
				let span = trace_span!("Updating host element", type_tag);
				let _enter = span.enter();

				if *props != element.props {
					if let Some(payload) = self.host.prepare_update(&fiber.instance, type_tag, props, &element.props, context) {
						self.host.commit_update(&mut fiber.instance, payload, type_tag, props, &element.props)
					}
					*props = element.props.clone();
				}

				let sets_text_content = self.host.should_set_text_content(type_tag, &element.props);
				if *text_content && !sets_text_content {
					self.host.reset_text_content(&fiber.instance)
				}
				*text_content = sets_text_content;

				let child_context = self.host.get_child_host_context(context, type_tag);
				let elements = if sets_text_content { &[][..] } else { element.children.as_slice() };
				let old = mem::take(&mut fiber.children);
				fiber.children = self.reconcile(Parent::Instance(&fiber.instance), old, elements, &child_context, depth - 1);
			}
			(Kind::Text(text), Element::Text(new_text)) => {
				if *text != *new_text {
					self.host.commit_text_update(&mut fiber.instance, text, new_text);
					*text = new_text.clone();
				}
			}
			_ => error!("Matched a node of a different kind. Skipping its update."),
		}
	}

	fn create(&mut self, key: Key, element: &Element, context: &H::HostContext, depth: usize) -> Fiber<H::Instance> {
		match element {
			Element::Host(element) => {
				let span = trace_span!("Creating host element", type_tag = %element.type_tag);
				let _enter = span.enter();

				let instance = self.host.create_instance(&element.type_tag, &element.props, self.container, context);
				let text_content = self.host.should_set_text_content(&element.type_tag, &element.props);
				let mut children = vec![];
				if !text_content && !element.children.is_empty() {
					if depth <= 1 {
						error!("Depth limit reached. Skipping {} element(s).", element.children.len());
					} else {
						let child_context = self.host.get_child_host_context(context, &element.type_tag);
						for (child, key) in element.children.iter().zip(keys(&element.children)) {
							let child = self.create(key, child, &child_context, depth - 1);
							self.host.append_initial_child(&instance, &child.instance);
							children.push(child);
						}
					}
				}
				let pending_mount = self.host.finalize_initial_children(&instance, &element.type_tag, &element.props, context);

				Fiber {
					key,
					kind: Kind::Host {
						type_tag: element.type_tag.clone(),
						props: element.props.clone(),
						text_content,
					},
					instance,
					children,
					pending_mount,
				}
			}
			Element::Text(text) => Fiber {
				key,
				instance: self.host.create_text_instance(text, self.container, context),
				kind: Kind::Text(text.clone()),
				children: vec![],
				pending_mount: false,
			},
		}
	}

	fn place(&mut self, parent: Parent<'_, H::Instance>, child: &H::Instance, before: Option<&H::Instance>) {
		match (parent, before) {
			(Parent::Container, None) => self.host.append_child_to_container(self.container, child),
			(Parent::Container, Some(before)) => self.host.insert_in_container_before(self.container, child, before),
			(Parent::Instance(parent), None) => self.host.append_child(parent, child),
			(Parent::Instance(parent), Some(before)) => self.host.insert_before(parent, child, before),
		}
	}

	fn delete(&mut self, parent: Parent<'_, H::Instance>, fiber: Fiber<H::Instance>) {
		match parent {
			Parent::Container => self.host.remove_child_from_container(self.container, &fiber.instance),
			Parent::Instance(parent) => self.host.remove_child(parent, &fiber.instance),
		}
		self.detach(&fiber)
	}

	fn detach(&mut self, fiber: &Fiber<H::Instance>) {
		for child in &fiber.children {
			self.detach(child)
		}
		self.host.detach_deleted_instance(&fiber.instance)
	}

	fn commit_mounts(&mut self, fiber: &mut Fiber<H::Instance>) {
		for child in &mut fiber.children {
			self.commit_mounts(child)
		}
		if mem::take(&mut fiber.pending_mount) {
			if let Kind::Host { type_tag, props, .. } = &fiber.kind {
				self.host.commit_mount(&fiber.instance, type_tag, props)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::{element, text};

	/// Records every callback as one line. Instances are numbered from 1 in creation order.
	#[derive(Debug, Default)]
	struct Log {
		created: u32,
		entries: Vec<String>,
	}
	impl Log {
		/// Entries of the last commits, without the commit brackets.
		fn take(&mut self) -> Vec<String> {
			mem::take(&mut self.entries)
				.into_iter()
				.filter(|entry| !matches!(entry.as_str(), "clear_container" | "prepare_for_commit" | "reset_after_commit"))
				.collect()
		}

		fn log(&mut self, entry: String) {
			self.entries.push(entry)
		}
	}
	impl HostConfig for Log {
		type Instance = u32;
		type Container = ();
		type HostContext = ();
		type UpdatePayload = ();
		type PublicInstance = u32;
		type TimeoutHandle = ();

		const SUPPORTS_MUTATION: bool = true;
		const SUPPORTS_PERSISTENCE: bool = false;
		const SUPPORTS_HYDRATION: bool = false;
		const IS_PRIMARY_RENDERER: bool = true;

		fn now(&self) -> f64 {
			0.0
		}
		fn schedule_timeout(&mut self, _: Box<dyn FnOnce()>, _: f64) {}
		fn cancel_timeout(&mut self, _: ()) {}
		fn no_timeout(&self) {}

		fn get_root_host_context(&self, _: &()) {}
		fn get_child_host_context(&self, _: &(), _: &str) {}
		fn should_set_text_content(&self, _: &str, props: &Props) -> bool {
			props.get("content").is_some()
		}

		fn create_instance(&mut self, type_tag: &str, _: &Props, _: &(), _: &()) -> u32 {
			self.created += 1;
			self.log(format!("create {} {}", type_tag, self.created));
			self.created
		}
		fn create_text_instance(&mut self, text: &str, _: &(), _: &()) -> u32 {
			self.created += 1;
			self.log(format!("text {:?} {}", text, self.created));
			self.created
		}
		fn append_initial_child(&mut self, parent: &u32, child: &u32) {
			self.log(format!("initial {} {}", parent, child))
		}
		fn finalize_initial_children(&mut self, _: &u32, type_tag: &str, _: &Props, _: &()) -> bool {
			type_tag == "Input"
		}
		fn commit_mount(&mut self, instance: &u32, _: &str, _: &Props) {
			self.log(format!("mount {}", instance))
		}
		fn get_public_instance(&self, instance: &u32) -> u32 {
			*instance
		}

		fn prepare_update(&self, _: &u32, _: &str, _: &Props, _: &Props, _: &()) -> Option<()> {
			Some(())
		}
		fn commit_update(&mut self, instance: &mut u32, _: (), _: &str, _: &Props, _: &Props) {
			self.log(format!("update {}", instance))
		}
		fn commit_text_update(&mut self, instance: &mut u32, old_text: &str, new_text: &str) {
			self.log(format!("text_update {} {:?} {:?}", instance, old_text, new_text))
		}
		fn reset_text_content(&mut self, instance: &u32) {
			self.log(format!("reset_text {}", instance))
		}

		fn append_child(&mut self, parent: &u32, child: &u32) {
			self.log(format!("append {} {}", parent, child))
		}
		fn append_child_to_container(&mut self, _: &(), child: &u32) {
			self.log(format!("append root {}", child))
		}
		fn insert_before(&mut self, parent: &u32, child: &u32, before: &u32) {
			self.log(format!("insert {} {} {}", parent, child, before))
		}
		fn insert_in_container_before(&mut self, _: &(), child: &u32, before: &u32) {
			self.log(format!("insert root {} {}", child, before))
		}
		fn remove_child(&mut self, parent: &u32, child: &u32) {
			self.log(format!("remove {} {}", parent, child))
		}
		fn remove_child_from_container(&mut self, _: &(), child: &u32) {
			self.log(format!("remove root {}", child))
		}
		fn clear_container(&mut self, _: &()) {
			self.log("clear_container".to_owned())
		}
		fn detach_deleted_instance(&mut self, instance: &u32) {
			self.log(format!("detach {}", instance))
		}

		fn prepare_for_commit(&mut self, _: &()) {
			self.log("prepare_for_commit".to_owned())
		}
		fn reset_after_commit(&mut self, _: &()) {
			self.log("reset_after_commit".to_owned())
		}
	}

	fn root() -> Root<Log> {
		Root::new(Log::default(), ())
	}

	fn labels(keys: &[&str]) -> HostElement {
		element("View").children(keys.iter().map(|key| element("Label").key(key).prop("text", *key)))
	}

	#[test]
	fn first_commit_builds_top_down_then_places() {
		let mut root = root();
		root.update(element("View").child(element("Label").prop("text", "a")).child(element("Label").prop("text", "b")));
		assert_eq!(
			root.host_mut().entries,
			[
				"clear_container",
				"prepare_for_commit",
				"create View 1",
				"create Label 2",
				"initial 1 2",
				"create Label 3",
				"initial 1 3",
				"append root 1",
				"reset_after_commit",
			]
		);
		assert!(root.is_mounted());
		assert_eq!(root.public_instance(&[0, 1]), Some(3));
		assert_eq!(root.public_instance(&[0, 2]), None);
	}

	#[test]
	fn identical_update_is_silent() {
		let mut root = root();
		root.update(labels(&["a", "b"]));
		root.host_mut().entries.clear();
		root.update(labels(&["a", "b"]));
		assert_eq!(root.host_mut().entries, ["prepare_for_commit", "reset_after_commit"]);
	}

	#[test]
	fn changed_props_update_in_place() {
		let mut root = root();
		root.update(element("View").child(element("Label").prop("text", "hi")));
		root.host_mut().take();
		root.update(element("View").child(element("Label").prop("text", "bye")));
		assert_eq!(root.host_mut().take(), ["update 2"]);
	}

	#[test]
	fn keyed_insertion_goes_before_next_stable_sibling() {
		let mut root = root();
		root.update(labels(&["a", "c"]));
		root.host_mut().take();
		root.update(labels(&["a", "b", "c"]));
		assert_eq!(root.host_mut().take(), ["create Label 4", "insert 1 4 3"]);
	}

	#[test]
	fn keyed_moves_are_replaced_after_the_last_stable_sibling() {
		let mut root = root();
		root.update(labels(&["a", "b", "c"]));
		root.host_mut().take();
		root.update(labels(&["c", "a", "b"]));
		assert_eq!(root.host_mut().take(), ["append 1 2", "append 1 3"]);
	}

	#[test]
	fn type_change_replaces_node() {
		let mut root = root();
		root.update(element("View").child(element("Label")));
		root.host_mut().take();
		root.update(element("View").child(element("Button")));
		assert_eq!(root.host_mut().take(), ["remove 1 2", "detach 2", "create Button 3", "append 1 3"]);
	}

	#[test]
	fn deletion_removes_top_and_detaches_subtree() {
		let mut root = root();
		root.update(element("View").child(element("Box").child(element("Label")).child(element("Label"))));
		root.host_mut().take();
		root.update(element("View"));
		assert_eq!(root.host_mut().take(), ["remove 1 2", "detach 3", "detach 4", "detach 2"]);
	}

	#[test]
	fn text_changes_update_in_place() {
		let mut root = root();
		root.update(element("View").child("hi"));
		assert_eq!(root.host_mut().take(), ["create View 1", "text \"hi\" 2", "initial 1 2", "append root 1"]);
		root.update(element("View").child(text("bye")));
		assert_eq!(root.host_mut().take(), ["text_update 2 \"hi\" \"bye\""]);
	}

	#[test]
	fn text_content_replaces_children() {
		let mut root = root();
		root.update(element("Text").prop("content", "x").child("ignored"));
		assert_eq!(root.host_mut().take(), ["create Text 1", "append root 1"]);
		root.update(element("Text").child("shown"));
		assert_eq!(root.host_mut().take(), ["update 1", "reset_text 1", "text \"shown\" 2", "append 1 2"]);
		root.update(element("Text").prop("content", "y").child("shown"));
		assert_eq!(root.host_mut().take(), ["update 1", "remove 1 2", "detach 2"]);
	}

	#[test]
	fn mounts_are_committed_after_placement() {
		let mut root = root();
		root.update(element("View").child(element("Input")));
		assert_eq!(root.host_mut().take(), ["create View 1", "create Input 2", "initial 1 2", "append root 1", "mount 2"]);
		root.update(element("View").child(element("Input")));
		assert_eq!(root.host_mut().take(), Vec::<String>::new());
	}

	#[test]
	fn fragments_insert_into_container() {
		let mut root = root();
		root.update_fragment(vec![element("Label").key("a"), element("Label").key("c")]);
		assert_eq!(root.host_mut().take(), ["create Label 1", "create Label 2", "append root 1", "append root 2"]);
		root.update_fragment(vec![element("Label").key("a"), element("Label").key("b"), element("Label").key("c")]);
		assert_eq!(root.host_mut().take(), ["create Label 3", "insert root 3 2"]);
	}

	#[test]
	fn depth_limit_skips_deeper_elements() {
		let mut root = root().with_depth_limit(2);
		root.update(element("View").child(element("Box").child(element("Label"))));
		assert_eq!(root.host_mut().take(), ["create View 1", "create Box 2", "initial 1 2", "append root 1"]);
		assert_eq!(root.public_instance(&[0, 0, 0]), None);
	}

	#[test]
	fn duplicate_keys_do_not_leak() {
		let mut root = root();
		root.update(labels(&["x", "x"]));
		root.host_mut().take();
		root.update(labels(&["x", "x"]));
		assert_eq!(root.host_mut().take(), ["remove 1 3", "detach 3", "create Label 4", "append 1 4"]);
		root.unmount();
		assert_eq!(root.host_mut().take(), ["remove root 1", "detach 2", "detach 4", "detach 1"]);
	}

	#[test]
	fn unmount_removes_everything() {
		let mut root = root();
		root.unmount();
		assert!(root.host_mut().entries.is_empty());

		root.update(element("View").child(element("Label")));
		root.host_mut().take();
		root.unmount();
		assert_eq!(root.host_mut().take(), ["remove root 1", "detach 2", "detach 1"]);
		assert_eq!(root.public_instance(&[0]), None);
	}
}
