#![doc(html_root_url = "https://docs.rs/host-bridge/0.0.1")]
#![warn(clippy::pedantic)]
//! Drives a retained-mode widget runtime from a declarative element tree.
//!
//! The [`Root`] reconciles [`Element`] trees and calls into a [`HostConfig`].
//! [`HostAdapter`] is the [`HostConfig`] that turns those calls into the five operations of a [`CommandChannel`]:
//! instantiate, bind, unbind, property update and terminate, addressed by numeric [`Handle`]s.
//!
//! See [`channel`] for the available channels.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod adapter;
pub mod channel;
pub mod config;
pub mod element;
pub mod handle;
mod handlers;
pub mod host_config;
pub mod node;
pub mod props;
pub mod reconciler;
pub mod render;
pub mod widget_spec;

pub use adapter::HostAdapter;
pub use channel::{Command, CommandChannel};
pub use config::Config;
pub use element::{element, text, Element, HostElement};
pub use handle::Handle;
pub use host_config::HostConfig;
pub use node::{HostNode, RootContainer};
pub use props::{Callback, PropValue, Props};
pub use reconciler::Root;
pub use render::{render, render_with_config};
pub use widget_spec::{SpecError, WidgetSpec};
