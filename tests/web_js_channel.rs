#![cfg(target_arch = "wasm32")]

use host_bridge::{channel::JsChannel, element, render, Callback, Config};
use js_sys::{Array, Function, Object, Reflect};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_logging() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

/// A binding whose methods append `[name, ...arguments]` to `log`.
fn stub_binding(log: &Array, methods: &[&'static str]) -> Object {
	let binding = Object::new();
	for &name in methods {
		let log = log.clone();
		let method = Closure::wrap(Box::new(move |first: JsValue, second: JsValue, third: JsValue| {
			let entry: Array = [JsValue::from_str(name), first, second, third].iter().filter(|argument| !argument.is_undefined()).collect();
			log.push(&entry);
		}) as Box<dyn Fn(JsValue, JsValue, JsValue)>);
		Reflect::set(&binding, &JsValue::from_str(name), method.as_ref()).unwrap();
		method.forget();
	}
	binding
}

const ALL_METHODS: &[&str] = &["instantiateWidget", "bindHierarchy", "unbindHierarchy", "applyPropertyUpdate", "terminateWidget"];

fn entry(log: &Array, index: u32) -> Array {
	log.get(index).dyn_into().unwrap()
}

#[wasm_bindgen_test]
fn commands_reach_global_binding() {
	init_logging();
	let log = Array::new();
	Reflect::set(&js_sys::global(), &JsValue::from_str("HostBridgeTest"), &stub_binding(&log, ALL_METHODS)).unwrap();

	let channel = JsChannel::from_config(&Config::new().with_binding_name("HostBridgeTest")).unwrap();
	let mut root = render(Some(channel), element("Label").prop("text", "hi"));
	assert_eq!(log.length(), 2);

	let instantiate = entry(&log, 0);
	assert_eq!(instantiate.get(0).as_string().as_deref(), Some("instantiateWidget"));
	assert_eq!(instantiate.get(1).as_f64(), Some(1.0));
	assert_eq!(instantiate.get(2).as_string().as_deref(), Some("Label"));
	assert_eq!(Reflect::get(&instantiate.get(3), &JsValue::from_str("text")).unwrap().as_string().as_deref(), Some("hi"));

	let bind = entry(&log, 1);
	assert_eq!(bind.get(0).as_string().as_deref(), Some("bindHierarchy"));
	assert_eq!(bind.get(1).as_f64(), Some(0.0));
	assert_eq!(bind.get(2).as_f64(), Some(1.0));

	root.unmount();
	assert_eq!(log.length(), 4);
	assert_eq!(entry(&log, 2).get(0).as_string().as_deref(), Some("unbindHierarchy"));
	assert_eq!(entry(&log, 3).get(0).as_string().as_deref(), Some("terminateWidget"));
}

#[wasm_bindgen_test]
fn absent_binding() {
	init_logging();
	assert!(JsChannel::from_global("NoSuchHostBridgeBinding").is_none());
}

#[wasm_bindgen_test]
fn missing_methods_are_skipped() {
	init_logging();
	let log = Array::new();
	let channel = JsChannel::from_binding(stub_binding(&log, &["terminateWidget"]).into());

	let mut root = render(Some(channel), element("Label"));
	assert_eq!(log.length(), 0);
	root.unmount();
	assert_eq!(log.length(), 1);
	assert_eq!(entry(&log, 0).get(1).as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
fn callbacks_are_published_while_referenced() {
	init_logging();
	let log = Array::new();
	let channel = JsChannel::from_binding(stub_binding(&log, ALL_METHODS).into());

	let presses = Rc::new(Cell::new(0));
	let on_press = {
		let presses = Rc::clone(&presses);
		Callback::new(move |_| presses.set(presses.get() + 1))
	};

	let mut root = render(
		Some(channel),
		element("View")
			.child(element("Button").prop("on_press", on_press.clone()))
			.child(element("Button").prop("on_press", on_press)),
	);
	assert_eq!(root.host().channel().unwrap().published_callbacks(), 1);

	let props = entry(&log, 1).get(3);
	let function: Function = Reflect::get(&props, &JsValue::from_str("on_press")).unwrap().dyn_into().unwrap();
	function.call0(&JsValue::UNDEFINED).unwrap();
	assert_eq!(presses.get(), 1);

	root.update(element("View").child(element("Button")).child(element("Button")));
	assert_eq!(root.host().channel().unwrap().published_callbacks(), 0);

	function.call0(&JsValue::UNDEFINED).unwrap();
	assert_eq!(presses.get(), 1);
}
