use crate::{
	channel::{Command, CommandChannel},
	handle::Handle,
	props::Props,
};
use std::io::Write;
use tracing::{instrument, warn};

/// Writes each command as one line of JSON, for a runtime in another process reading a pipe or socket.
///
/// [`Callback`](`crate::Callback`)s can't cross this boundary and are dropped.
/// Write failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct JsonLinesChannel<W: Write> {
	writer: W,
	flush: bool,
}
impl<W: Write> JsonLinesChannel<W> {
	/// Creates a channel that flushes after every command.
	pub fn new(writer: W) -> Self {
		Self { writer, flush: true }
	}

	/// Creates a channel that leaves flushing to the caller (or to `writer` being dropped).
	pub fn buffered(writer: W) -> Self {
		Self { writer, flush: false }
	}

	pub fn get_ref(&self) -> &W {
		&self.writer
	}

	pub fn into_inner(self) -> W {
		self.writer
	}

	#[instrument(skip(self, command))]
	fn send(&mut self, command: &Command) {
		let writer = &mut self.writer;
		let result = serde_json::to_writer(&mut *writer, command)
			.map_err(std::io::Error::from)
			.and_then(|()| writer.write_all(b"\n"));
		let result = if self.flush { result.and_then(|()| writer.flush()) } else { result };
		if let Err(error) = result {
			warn!("Failed to send {:?}: {}", command.handles(), error)
		}
	}
}
impl<W: Write> CommandChannel for JsonLinesChannel<W> {
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props) {
		self.send(&Command::Instantiate {
			handle,
			type_tag: type_tag.to_owned(),
			props: props.clone(),
		})
	}

	fn bind_hierarchy(&mut self, parent: Handle, child: Handle) {
		self.send(&Command::BindHierarchy { parent, child })
	}

	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle) {
		self.send(&Command::UnbindHierarchy { parent, child })
	}

	fn apply_property_update(&mut self, handle: Handle, props: &Props) {
		self.send(&Command::ApplyPropertyUpdate { handle, props: props.clone() })
	}

	fn terminate(&mut self, handle: Handle) {
		self.send(&Command::Terminate { handle })
	}
}
