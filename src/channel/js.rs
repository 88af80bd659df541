use crate::{
	channel::CommandChannel,
	config::Config,
	handle::Handle,
	handlers::HandlerTable,
	props::{Callback, PropValue, Props},
};
use core::fmt::{self, Debug, Formatter};
use js_sys::{Array, Function, Object, Reflect};
use std::{cell::RefCell, rc::Rc};
use tracing::{error, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Forwards commands to a binding object on the JavaScript global scope, `globalThis.Kivy` by default:
///
/// ```ts
/// interface Binding {
///   instantiateWidget(id: number, type: string, props: Record<string, unknown>): void;
///   bindHierarchy(parentId: number, childId: number): void;
///   unbindHierarchy(parentId: number, childId: number): void;
///   applyPropertyUpdate(id: number, props: Record<string, unknown>): void;
///   terminateWidget(id: number): void;
/// }
/// ```
///
/// The binding is looked up once, on construction. Missing methods disable only their own operation.
/// Exceptions thrown by the binding are logged and otherwise ignored.
///
/// [`Callback`] properties become JavaScript functions. Each callback is published once, however many widgets reference it,
/// and is unpublished once no live widget's properties reference it anymore.
/// Calling an unpublished function logs a warning and does nothing.
pub struct JsChannel {
	binding: JsValue,
	instantiate_widget: Option<Function>,
	bind_hierarchy: Option<Function>,
	unbind_hierarchy: Option<Function>,
	apply_property_update: Option<Function>,
	terminate_widget: Option<Function>,
	handlers: Rc<RefCell<HandlerTable<Function>>>,
	common_handler: Closure<dyn Fn(JsValue, JsValue, JsValue)>,
}
impl JsChannel {
	/// Looks up [`Config::binding_name`] on the global scope.
	///
	/// Returns [`None`] if the binding isn't there (yet).
	#[must_use]
	pub fn from_config(config: &Config) -> Option<Self> {
		Self::from_global(&config.binding_name)
	}

	#[must_use]
	#[instrument]
	pub fn from_global(name: &str) -> Option<Self> {
		let binding = match Reflect::get(&js_sys::global(), &JsValue::from_str(name)) {
			Ok(binding) => binding,
			Err(error) => {
				warn!("Could not look up binding: {:?}", error);
				return None;
			}
		};
		if binding.is_undefined() || binding.is_null() {
			trace!("No binding found.");
			return None;
		}
		Some(Self::from_binding(binding))
	}

	#[must_use]
	pub fn from_binding(binding: JsValue) -> Self {
		fn method(binding: &JsValue, name: &str) -> Option<Function> {
			match Reflect::get(binding, &JsValue::from_str(name)) {
				Ok(value) => match value.dyn_into::<Function>() {
					Ok(function) => Some(function),
					Err(value) => {
						warn!("Binding member `{}` is not a function but {:?}; This operation is disabled.", name, value);
						None
					}
				},
				Err(error) => {
					warn!("Could not read binding member `{}`: {:?}; This operation is disabled.", name, error);
					None
				}
			}
		}

		let handlers = Rc::new(RefCell::new(HandlerTable::new()));
		let common_handler = {
			let handlers = Rc::downgrade(&handlers);
			Closure::wrap(Box::new(move |key: JsValue, first: JsValue, second: JsValue| {
				let span = trace_span!("common_handler", ?key);
				let _enter = span.enter();

				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				let callback = match (key.as_f64(), handlers.upgrade()) {
					(Some(key), Some(handlers)) => {
						let handlers = handlers.borrow();
						let callback = handlers.callback(key as usize).cloned();
						callback
					}
					_ => None,
				};

				match callback {
					Some(callback) => {
						let arguments: Vec<_> = [first, second].iter().take_while(|argument| !argument.is_undefined()).map(from_js).collect();
						callback.call(&arguments)
					}
					None => warn!("Invoked unpublished callback {:?}; Ignoring.", key),
				}
			}) as Box<dyn Fn(JsValue, JsValue, JsValue)>)
		};

		Self {
			instantiate_widget: method(&binding, "instantiateWidget"),
			bind_hierarchy: method(&binding, "bindHierarchy"),
			unbind_hierarchy: method(&binding, "unbindHierarchy"),
			apply_property_update: method(&binding, "applyPropertyUpdate"),
			terminate_widget: method(&binding, "terminateWidget"),
			binding,
			handlers,
			common_handler,
		}
	}

	/// Number of currently published callbacks.
	#[must_use]
	pub fn published_callbacks(&self) -> usize {
		self.handlers.borrow().len()
	}

	fn call(&self, method: Option<&Function>, name: &'static str, arguments: &[JsValue]) {
		let function = match method {
			Some(function) => function,
			None => return trace!("`{}` is unavailable. Skipping.", name),
		};
		let arguments: Array = arguments.iter().collect();
		if let Err(error) = function.apply(&self.binding, &arguments) {
			error!("`{}` threw {:?}; Ignoring.", name, error)
		}
	}

	/// Publishes the callbacks in `props` for `handle` and converts `props` into a plain object.
	fn publish_props(&self, handle: Handle, props: &Props) -> Object {
		let common_handler = &self.common_handler;
		let mut handlers = self.handlers.borrow_mut();
		handlers.assign(handle, props, &mut |callback| publish(common_handler, callback));
		props_to_js(props, &handlers)
	}
}
impl Debug for JsChannel {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("JsChannel")
			.field("binding", &self.binding)
			.field("published_callbacks", &self.published_callbacks())
			.finish()
	}
}
impl CommandChannel for JsChannel {
	#[instrument(skip(self, props))]
	fn instantiate(&mut self, handle: Handle, type_tag: &str, props: &Props) {
		let props = self.publish_props(handle, props);
		self.call(self.instantiate_widget.as_ref(), "instantiateWidget", &[js_handle(handle), JsValue::from_str(type_tag), props.into()])
	}

	#[instrument(skip(self))]
	fn bind_hierarchy(&mut self, parent: Handle, child: Handle) {
		self.call(self.bind_hierarchy.as_ref(), "bindHierarchy", &[js_handle(parent), js_handle(child)]);
		self.handlers.borrow_mut().bind(parent, child)
	}

	#[instrument(skip(self))]
	fn unbind_hierarchy(&mut self, parent: Handle, child: Handle) {
		self.call(self.unbind_hierarchy.as_ref(), "unbindHierarchy", &[js_handle(parent), js_handle(child)]);
		self.handlers.borrow_mut().unbind(parent, child)
	}

	#[instrument(skip(self, props))]
	fn apply_property_update(&mut self, handle: Handle, props: &Props) {
		let props = self.publish_props(handle, props);
		self.call(self.apply_property_update.as_ref(), "applyPropertyUpdate", &[js_handle(handle), props.into()])
	}

	#[instrument(skip(self))]
	fn terminate(&mut self, handle: Handle) {
		self.call(self.terminate_widget.as_ref(), "terminateWidget", &[js_handle(handle)]);
		self.handlers.borrow_mut().release(handle)
	}
}

#[allow(clippy::cast_precision_loss)]
fn js_handle(handle: Handle) -> JsValue {
	JsValue::from_f64(handle.get() as f64)
}

#[allow(clippy::cast_precision_loss)]
fn publish(common_handler: &Closure<dyn Fn(JsValue, JsValue, JsValue)>, callback: &Callback) -> Function {
	trace!(key = callback.key(), "Publishing callback.");
	common_handler.as_ref().unchecked_ref::<Function>().bind1(&JsValue::UNDEFINED, &JsValue::from_f64(callback.key() as f64))
}

fn props_to_js(props: &Props, handlers: &HandlerTable<Function>) -> Object {
	let object = Object::new();
	for (name, value) in props {
		if let Err(error) = Reflect::set(&object, &JsValue::from_str(name), &to_js(value, handlers)) {
			error!("Could not set property {:?}: {:?}", name, error)
		}
	}
	object
}

#[allow(clippy::cast_precision_loss)]
fn to_js(value: &PropValue, handlers: &HandlerTable<Function>) -> JsValue {
	match value {
		PropValue::Null => JsValue::NULL,
		PropValue::Bool(bool) => JsValue::from_bool(*bool),
		PropValue::Int(int) => JsValue::from_f64(*int as f64),
		PropValue::Float(float) => JsValue::from_f64(*float),
		PropValue::String(string) => JsValue::from_str(string),
		PropValue::List(items) => items.iter().map(|item| to_js(item, handlers)).collect::<Array>().into(),
		PropValue::Map(props) => props_to_js(props, handlers).into(),
		PropValue::Callback(callback) => match handlers.published(callback.key()) {
			Some(function) => function.clone().into(),
			None => {
				error!("Callback {:?} was not published. Passing `null`.", callback);
				JsValue::NULL
			}
		},
	}
}

#[allow(clippy::cast_possible_truncation)]
fn from_js(value: &JsValue) -> PropValue {
	const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
	if value.is_null() || value.is_undefined() {
		PropValue::Null
	} else if let Some(bool) = value.as_bool() {
		PropValue::Bool(bool)
	} else if let Some(number) = value.as_f64() {
		if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
			PropValue::Int(number as i64)
		} else {
			PropValue::Float(number)
		}
	} else if let Some(string) = value.as_string() {
		PropValue::String(string)
	} else if Array::is_array(value) {
		PropValue::List(Array::from(value).iter().map(|item| from_js(&item)).collect())
	} else {
		trace!("Passing unsupported callback argument {:?} as `null`.", value);
		PropValue::Null
	}
}
