//! One-call setup of a [`Root`] that renders through a [`HostAdapter`].

use crate::{adapter::HostAdapter, channel::CommandChannel, config::Config, element::Element, node::RootContainer, reconciler::Root};
use tracing::instrument;

/// Creates a root bound to the runtime's display root and commits `element` into it.
///
/// Pass [`None`] as `channel` to reconcile headlessly.
/// Later changes go through [`Root::update`], and [`Root::unmount`] removes the whole tree.
pub fn render<C: CommandChannel>(channel: Option<C>, element: impl Into<Element>) -> Root<HostAdapter<C>> {
	render_with_config(channel, Config::default(), element)
}

/// Like [`render`], with type aliases and binding name taken from `config`.
#[instrument(skip(channel, element))]
pub fn render_with_config<C: CommandChannel>(channel: Option<C>, config: Config, element: impl Into<Element>) -> Root<HostAdapter<C>> {
	let mut root = Root::new(HostAdapter::with_config(channel, config), RootContainer);
	root.update(element);
	root
}
