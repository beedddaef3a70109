//! An in-memory document, mainly for tests.

use crate::{
	host::{Host, Inspected},
	value::{Callback, Value},
};
use core::{cell::RefCell, fmt::Write as _};
use std::{collections::BTreeMap, rc::Rc};
use thiserror::Error;
use tracing::{trace, trace_span};

/// Identifies a node within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("invalid tag name {0:?}")]
	InvalidTagName(String),
	#[error("listener for {0:?} events is not callable")]
	NotCallable(String),
	#[error("{child:?} is not a child of {parent:?}")]
	NotAChild { parent: NodeId, child: NodeId },
	#[error("{0:?} is not an element")]
	NotAnElement(NodeId),
	#[error("{node:?} can't be inserted into {parent:?}, which is inside it")]
	HierarchyRequest { parent: NodeId, node: NodeId },
	#[error("unknown node {0:?}")]
	UnknownNode(NodeId),
}

/// Passed to listeners by [`Document::dispatch`] as `&dyn Any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	pub name: String,
	pub target: NodeId,
}

/// A shared handle to an in-memory node tree with a `body` element at its root.
///
/// Nodes are never freed while the [`Document`] exists, so [`NodeId`]s of removed nodes stay valid.
/// That makes it unsuited to long-running use: only listeners are dropped early, when they are unbound.
#[derive(Clone)]
pub struct Document(Rc<RefCell<Tree>>);

struct Tree {
	nodes: Vec<NodeData>,
	mutations: usize,
}

struct NodeData {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	kind: Kind,
}

enum Kind {
	Element {
		tag: String,
		attributes: BTreeMap<String, String>,
		listeners: Vec<(String, Callback)>,
	},
	Text(String),
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	#[must_use]
	pub fn new() -> Self {
		Self(Rc::new(RefCell::new(Tree {
			nodes: vec![NodeData {
				parent: None,
				children: vec![],
				kind: Kind::Element {
					tag: "body".to_owned(),
					attributes: BTreeMap::new(),
					listeners: vec![],
				},
			}],
			mutations: 0,
		})))
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		NodeId(0)
	}

	/// How many insertions, removals, attribute assignments and listener bindings happened so far.
	#[must_use]
	pub fn mutation_count(&self) -> usize {
		self.0.borrow().mutations
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.0.borrow().node(node).map(|data| data.children.clone()).unwrap_or_default()
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.0.borrow().node(node).and_then(|data| data.parent)
	}

	/// Whether `node` is `body` or inside it.
	#[must_use]
	pub fn is_connected(&self, node: NodeId) -> bool {
		let tree = self.0.borrow();
		let mut current = Some(node);
		while let Some(node) = current {
			if node == self.body() {
				return true;
			}
			current = tree.node(node).and_then(|data| data.parent);
		}
		false
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<String> {
		match self.0.borrow().node(node).map(|data| &data.kind) {
			Some(Kind::Element { tag, .. }) => Some(tag.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<String> {
		match self.0.borrow().node(node).map(|data| &data.kind) {
			Some(Kind::Text(text)) => Some(text.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		match self.0.borrow().node(node).map(|data| &data.kind) {
			Some(Kind::Element { attributes, .. }) => attributes.get(name).cloned(),
			_ => None,
		}
	}

	/// Finds the first connected element whose `id` attribute is `id`, in document order.
	#[must_use]
	pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
		let mut pending = vec![self.body()];
		while let Some(node) = pending.pop() {
			if self.attribute(node, "id").as_deref() == Some(id) {
				return Some(node);
			}
			pending.extend(self.children(node).into_iter().rev());
		}
		None
	}

	/// How many listeners are bound across all nodes, attached or not.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.0
			.borrow()
			.nodes
			.iter()
			.map(|data| match &data.kind {
				Kind::Element { listeners, .. } => listeners.len(),
				Kind::Text(_) => 0,
			})
			.sum()
	}

	/// Calls the listeners for `name` on `target` and then on its ancestors, and returns how many were called.
	///
	/// Listeners may change the document.
	pub fn dispatch(&self, target: NodeId, name: &str) -> usize {
		let span = trace_span!("Dispatching event", name, ?target);
		let _enter = span.enter();

		let listeners: Vec<Callback> = {
			let tree = self.0.borrow();
			let mut listeners = vec![];
			let mut current = Some(target);
			while let Some(node) = current {
				if let Some(Kind::Element { listeners: bound, .. }) = tree.node(node).map(|data| &data.kind) {
					listeners.extend(bound.iter().filter(|(event, _)| event == name).map(|(_, callback)| callback.clone()));
				}
				current = tree.node(node).and_then(|data| data.parent);
			}
			listeners
		};

		let event = Event { name: name.to_owned(), target };
		for listener in &listeners {
			listener.call(&event);
		}
		trace!("Called {} listener(s).", listeners.len());
		listeners.len()
	}

	/// Serializes `node`'s content as HTML. Attributes are listed in name order.
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for child in self.children(node) {
			self.write_html(&mut html, child);
		}
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(&mut html, node);
		html
	}

	fn write_html(&self, html: &mut String, node: NodeId) {
		let (tag, attributes) = match self.0.borrow().node(node).map(|data| &data.kind) {
			Some(Kind::Text(text)) => return html.push_str(&escape(text, false)),
			Some(Kind::Element { tag, attributes, .. }) => (tag.clone(), attributes.clone()),
			None => return,
		};
		html.push('<');
		html.push_str(&tag);
		for (name, value) in &attributes {
			// Writing to a `String` can't fail.
			let _ = write!(html, " {}=\"{}\"", name, escape(value, true));
		}
		html.push('>');
		for child in self.children(node) {
			self.write_html(html, child);
		}
		let _ = write!(html, "</{}>", tag);
	}
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

fn is_valid_tag_name(tag: &str) -> bool {
	let mut chars = tag.chars();
	chars.next().map_or(false, |first| first.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl Tree {
	fn node(&self, node: NodeId) -> Option<&NodeData> {
		self.nodes.get(node.0)
	}

	fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData, Error> {
		self.nodes.get_mut(node.0).ok_or(Error::UnknownNode(node))
	}

	fn element_mut(&mut self, node: NodeId) -> Result<&mut Kind, Error> {
		match &mut self.node_mut(node)?.kind {
			kind @ Kind::Element { .. } => Ok(kind),
			Kind::Text(_) => Err(Error::NotAnElement(node)),
		}
	}

	fn push(&mut self, kind: Kind) -> NodeId {
		self.nodes.push(NodeData {
			parent: None,
			children: vec![],
			kind,
		});
		NodeId(self.nodes.len() - 1)
	}

	fn index_of(&self, parent: NodeId, child: NodeId) -> Result<usize, Error> {
		self.node(parent)
			.ok_or(Error::UnknownNode(parent))?
			.children
			.iter()
			.position(|&c| c == child)
			.ok_or(Error::NotAChild { parent, child })
	}

	fn sibling(&self, node: NodeId, offset: isize) -> Option<NodeId> {
		let parent = self.node(node)?.parent?;
		let index = self.index_of(parent, node).ok()?;
		let index = if offset < 0 { index.checked_sub(offset.unsigned_abs())? } else { index + offset.unsigned_abs() };
		self.node(parent)?.children.get(index).copied()
	}

	fn detach(&mut self, node: NodeId) -> Result<(), Error> {
		if let Some(parent) = self.node_mut(node)?.parent {
			let index = self.index_of(parent, node)?;
			self.node_mut(parent)?.children.remove(index);
			self.node_mut(node)?.parent = None;
			self.mutations += 1;
		}
		Ok(())
	}
}

impl Host for Document {
	type Node = NodeId;
	type Error = Error;

	fn create_element(&self, tag: &str) -> Result<NodeId, Error> {
		if !is_valid_tag_name(tag) {
			return Err(Error::InvalidTagName(tag.to_owned()));
		}
		Ok(self.0.borrow_mut().push(Kind::Element {
			tag: tag.to_owned(),
			attributes: BTreeMap::new(),
			listeners: vec![],
		}))
	}

	fn create_text(&self, content: &str) -> Result<NodeId, Error> {
		Ok(self.0.borrow_mut().push(Kind::Text(content.to_owned())))
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) -> Result<(), Error> {
		let (parent, node) = (*parent, *node);
		let mut tree = self.0.borrow_mut();
		tree.element_mut(parent)?;

		let mut ancestor = Some(parent);
		while let Some(current) = ancestor {
			if current == node {
				return Err(Error::HierarchyRequest { parent, node });
			}
			ancestor = tree.node(current).and_then(|data| data.parent);
		}

		tree.detach(node)?;
		let index = match reference {
			Some(&reference) => tree.index_of(parent, reference)?,
			None => tree.node_mut(parent)?.children.len(),
		};
		tree.node_mut(parent)?.children.insert(index, node);
		tree.node_mut(node)?.parent = Some(parent);
		tree.mutations += 1;
		Ok(())
	}

	fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), Error> {
		let mut tree = self.0.borrow_mut();
		let index = tree.index_of(*parent, *child)?;
		tree.node_mut(*parent)?.children.remove(index);
		tree.node_mut(*child)?.parent = None;
		tree.mutations += 1;
		Ok(())
	}

	fn first_child(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().node(*node)?.children.first().copied()
	}

	fn last_child(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().node(*node)?.children.last().copied()
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().sibling(*node, 1)
	}

	fn previous_sibling(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().sibling(*node, -1)
	}

	fn set_attribute(&self, element: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		let mut tree = self.0.borrow_mut();
		if let Kind::Element { attributes, .. } = tree.element_mut(*element)? {
			attributes.insert(name.to_owned(), value.to_owned());
		}
		tree.mutations += 1;
		Ok(())
	}

	fn add_event_listener(&self, element: &NodeId, event: &str, listener: &Value) -> Result<(), Error> {
		let callback = listener.as_callback().ok_or_else(|| Error::NotCallable(event.to_owned()))?;
		let mut tree = self.0.borrow_mut();
		if let Kind::Element { listeners, .. } = tree.element_mut(*element)? {
			// Like the DOM, ignore exact duplicates.
			if listeners.iter().any(|(name, bound)| name == event && bound.ptr_eq(callback)) {
				return Ok(());
			}
			listeners.push((event.to_owned(), callback.clone()));
		}
		tree.mutations += 1;
		Ok(())
	}

	fn remove_event_listener(&self, element: &NodeId, event: &str, listener: &Value) -> Result<(), Error> {
		let callback = match listener.as_callback() {
			Some(callback) => callback,
			None => return Ok(()),
		};
		let mut tree = self.0.borrow_mut();
		if let Kind::Element { listeners, .. } = tree.element_mut(*element)? {
			match listeners.iter().position(|(name, bound)| name == event && bound.ptr_eq(callback)) {
				Some(index) => {
					listeners.remove(index);
				}
				None => {
					trace!(event, "Listener to remove isn't bound.");
					return Ok(());
				}
			}
		}
		tree.mutations += 1;
		Ok(())
	}

	fn inspect(&self, node: &NodeId) -> Inspected {
		match self.0.borrow().node(*node).map(|data| &data.kind) {
			Some(Kind::Element { tag, attributes, .. }) => Inspected::Element {
				tag: tag.clone(),
				attributes: attributes.iter().map(|(name, value)| (name.clone(), value.clone())).collect(),
			},
			Some(Kind::Text(text)) => Inspected::Text(text.clone()),
			None => Inspected::Other,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Document, Error};
	use crate::{host::Host, value::Value, Callback};
	use std::{cell::Cell, rc::Rc};

	#[test]
	fn insert_and_navigate() {
		let document = Document::new();
		let body = document.body();
		let a = document.create_text("a").unwrap();
		let c = document.create_text("c").unwrap();
		let b = document.create_element("b").unwrap();
		document.insert_before(&body, &a, None).unwrap();
		document.insert_before(&body, &c, None).unwrap();
		document.insert_before(&body, &b, Some(&c)).unwrap();

		assert_eq!(document.children(body), [a, b, c]);
		assert_eq!(document.next_sibling(&a), Some(b));
		assert_eq!(document.previous_sibling(&a), None);
		assert_eq!(document.previous_sibling(&c), Some(b));
		assert_eq!(document.inner_html(body), "a<b></b>c");
		assert_eq!(document.mutation_count(), 3);
	}

	#[test]
	fn errors() {
		let document = Document::new();
		let body = document.body();
		let text = document.create_text("x").unwrap();
		let stray = document.create_text("y").unwrap();

		assert_eq!(document.create_element("no spaces"), Err(Error::InvalidTagName("no spaces".to_owned())));
		assert_eq!(document.insert_before(&text, &stray, None), Err(Error::NotAnElement(text)));
		assert_eq!(document.remove_child(&body, &stray), Err(Error::NotAChild { parent: body, child: stray }));
		assert_eq!(document.add_event_listener(&body, "click", &Value::from("nope")), Err(Error::NotCallable("click".to_owned())));
		assert_eq!(document.insert_before(&body, &body, None), Err(Error::HierarchyRequest { parent: body, node: body }));
	}

	#[test]
	fn dispatch_bubbles() {
		let document = Document::new();
		let body = document.body();
		let button = document.create_element("button").unwrap();
		document.insert_before(&body, &button, None).unwrap();

		let count = Rc::new(Cell::new(0));
		let callback = Callback::new({
			let count = Rc::clone(&count);
			move |_| count.set(count.get() + 1)
		});
		document.add_event_listener(&button, "click", &callback.clone().into()).unwrap();
		document.add_event_listener(&button, "click", &callback.clone().into()).unwrap();
		document.add_event_listener(&body, "click", &callback.into()).unwrap();

		assert_eq!(document.dispatch(button, "click"), 2);
		assert_eq!(document.dispatch(button, "input"), 0);
		assert_eq!(count.get(), 2);
		assert_eq!(document.listener_count(), 2);
	}

	#[test]
	fn remove_listeners() {
		let document = Document::new();
		let button = document.create_element("button").unwrap();
		let callback: Value = Callback::new(|_| ()).into();
		document.add_event_listener(&button, "click", &callback).unwrap();
		document.remove_event_listener(&button, "input", &callback).unwrap();
		assert_eq!(document.listener_count(), 1);

		let mutations = document.mutation_count();
		document.remove_event_listener(&button, "click", &callback).unwrap();
		assert_eq!(document.listener_count(), 0);
		assert_eq!(document.dispatch(button, "click"), 0);
		assert_eq!(document.mutation_count(), mutations + 1);

		document.remove_event_listener(&button, "click", &Value::from("nope")).unwrap();
	}

	#[test]
	fn escaping() {
		let document = Document::new();
		let body = document.body();
		let p = document.create_element("p").unwrap();
		document.set_attribute(&p, "title", "\"<&>\"").unwrap();
		let text = document.create_text("1 < 2 & 3").unwrap();
		document.insert_before(&p, &text, None).unwrap();
		document.insert_before(&body, &p, None).unwrap();
		assert_eq!(document.inner_html(body), "<p title=\"&quot;&lt;&amp;&gt;&quot;\">1 &lt; 2 &amp; 3</p>");
	}
}
