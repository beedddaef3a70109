//! The browser document, through [`web_sys`].

use crate::{
	host::{Host, Inspected},
	value::{Callback, Value},
};
use core::cell::RefCell;
use hashbrown::{hash_map::Entry, HashMap};
use js_sys::{Function, TypeError};
use std::rc::Rc;
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CharacterData, Document, Element, Node};

/// One JavaScript function per [`Callback`], with the number of listeners it is bound as.
struct Bound {
	count: usize,
	/// Keeps the id unique while the entry exists.
	callback: Callback,
	closure: Closure<dyn Fn(web_sys::Event)>,
}

impl Bound {
	fn function(&self) -> &Function {
		self.closure.as_ref().unchecked_ref()
	}
}

type ListenerMap = HashMap<usize, Bound>;

/// A [`Host`] writing into a live [`Document`].
///
/// Each distinct [`Callback`] is wrapped into one JavaScript function, which is reused for every binding of it.
/// The function is dropped once its last binding was removed through [`Host::remove_event_listener`].
/// Bindings are shared by all clones of a [`DomHost`], so keep one around while the page is in use.
#[derive(Clone)]
pub struct DomHost {
	document: Document,
	listeners: Rc<RefCell<ListenerMap>>,
}

impl DomHost {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			listeners: Rc::default(),
		}
	}

	/// The host for the current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::new)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// How many distinct [`Callback`]s are currently bound through this host.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Counts one more binding of `callback` and returns its function.
	fn increment_or_wrap(&self, callback: &Callback) -> Function {
		let mut listeners = self.listeners.borrow_mut();
		let bound = match listeners.entry(callback.id()) {
			Entry::Occupied(occupied) => {
				let bound = occupied.into_mut();
				bound.count += 1;
				bound
			}
			Entry::Vacant(vacant) => {
				trace!("Wrapping new callback.");
				let handler = callback.clone();
				let closure = Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&event)) as Box<dyn Fn(web_sys::Event)>);
				vacant.insert(Bound {
					count: 1,
					callback: callback.clone(),
					closure,
				})
			}
		};
		debug_assert!(bound.callback.ptr_eq(callback));
		bound.function().clone()
	}

	/// Counts one binding of `callback` less, and drops its function after the last one.
	fn decrement(&self, callback: &Callback) {
		if let Entry::Occupied(mut occupied) = self.listeners.borrow_mut().entry(callback.id()) {
			let bound = occupied.get_mut();
			bound.count -= 1;
			if bound.count == 0 {
				trace!("Dropping unbound callback.");
				occupied.remove();
			}
		}
	}
}

fn as_element<'a>(node: &'a Node, operation: &str) -> Result<&'a Element, JsValue> {
	node.dyn_ref::<Element>()
		.ok_or_else(|| TypeError::new(&format!("{}: {:?} is not an element", operation, node.node_name())).into())
}

impl Host for DomHost {
	type Node = Node;
	type Error = JsValue;

	fn create_element(&self, tag: &str) -> Result<Node, JsValue> {
		self.document.create_element(tag).map(Into::into)
	}

	fn create_text(&self, content: &str) -> Result<Node, JsValue> {
		Ok(self.document.create_text_node(content).into())
	}

	fn insert_before(&self, parent: &Node, node: &Node, reference: Option<&Node>) -> Result<(), JsValue> {
		parent.insert_before(node, reference).map(drop)
	}

	fn remove_child(&self, parent: &Node, child: &Node) -> Result<(), JsValue> {
		parent.remove_child(child).map(drop)
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.first_child()
	}

	fn last_child(&self, node: &Node) -> Option<Node> {
		node.last_child()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		node.next_sibling()
	}

	fn previous_sibling(&self, node: &Node) -> Option<Node> {
		node.previous_sibling()
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) -> Result<(), JsValue> {
		as_element(element, "setAttribute")?.set_attribute(name, value)
	}

	fn add_event_listener(&self, element: &Node, event: &str, listener: &Value) -> Result<(), JsValue> {
		let callback = listener
			.as_callback()
			.ok_or_else(|| JsValue::from(TypeError::new(&format!("listener for {:?} is not callable", event))))?;
		let element = as_element(element, "addEventListener")?;
		let function = self.increment_or_wrap(callback);
		element.add_event_listener_with_callback(event, &function).map_err(|error| {
			self.decrement(callback);
			error
		})
	}

	fn remove_event_listener(&self, element: &Node, event: &str, listener: &Value) -> Result<(), JsValue> {
		let callback = match listener.as_callback() {
			Some(callback) => callback,
			None => return Ok(()),
		};
		let element = as_element(element, "removeEventListener")?;
		let function = match self.listeners.borrow().get(&callback.id()) {
			Some(bound) => bound.function().clone(),
			None => {
				error!(event, "Tried to unbind a callback that isn't bound through this host.");
				return Ok(());
			}
		};
		element.remove_event_listener_with_callback(event, &function)?;
		self.decrement(callback);
		Ok(())
	}

	fn inspect(&self, node: &Node) -> Inspected {
		if let Some(element) = node.dyn_ref::<Element>() {
			let map = element.attributes();
			let attributes = (0..map.length())
				.filter_map(|i| map.item(i))
				.map(|attribute| (attribute.name(), attribute.value()))
				.collect();
			Inspected::Element {
				tag: element.local_name(),
				attributes,
			}
		} else if node.node_type() == Node::TEXT_NODE {
			Inspected::Text(node.unchecked_ref::<CharacterData>().data())
		} else {
			Inspected::Other
		}
	}
}
