//! Declarative descriptions, as returned from [`Component::render`].

use crate::{
	component::{Component, ComponentRef},
	value::{Map, Value},
	vnode::{Element, Fragment, Text, VNode},
};
use tracing::trace;

/// A render result before nested components are resolved.
#[derive(Debug, Clone)]
pub enum Node {
	Text(String),
	Element { tag: String, attributes: Map, children: Vec<Node> },
	Fragment { key: Option<String>, children: Vec<Node> },
	Component(ComponentRef),
}

/// The first argument of [`create_element`].
#[derive(Debug, Clone)]
pub enum ElementType {
	Tag(String),
	Fragment,
	Component(fn() -> Box<dyn Component>),
}

impl From<&str> for ElementType {
	fn from(tag: &str) -> Self {
		Self::Tag(tag.to_owned())
	}
}

impl From<String> for ElementType {
	fn from(tag: String) -> Self {
		Self::Tag(tag)
	}
}

/// The [`ElementType`] that instantiates `C` via [`Default`].
#[must_use]
pub fn component<C: Component + Default>() -> ElementType {
	fn construct<C: Component + Default>() -> Box<dyn Component> {
		Box::new(C::default())
	}
	ElementType::Component(construct::<C>)
}

/// A child argument of [`create_element`]. Lists are flattened and [`Child::Empty`] is dropped.
#[derive(Debug, Clone)]
pub enum Child {
	Node(Node),
	List(Vec<Child>),
	Empty,
}

impl From<Node> for Child {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<VNode> for Child {
	fn from(vnode: VNode) -> Self {
		Self::Node(vnode.into())
	}
}

impl From<ComponentRef> for Child {
	fn from(component: ComponentRef) -> Self {
		Self::Node(Node::Component(component))
	}
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Self::Node(Node::Text(text.to_owned()))
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::Node(Node::Text(text))
	}
}

impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(child: Option<T>) -> Self {
		child.map_or(Self::Empty, Into::into)
	}
}

impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Self::List(children.into_iter().map(Into::into).collect())
	}
}

impl From<&str> for Node {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Node {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<VNode> for Node {
	fn from(vnode: VNode) -> Self {
		match vnode {
			VNode::Text(Text { content, span: () }) => Self::Text(content),
			VNode::Element(Element { tag, attributes, children, span: () }) => Self::Element {
				tag,
				attributes,
				children: children.into_iter().map(Into::into).collect(),
			},
			VNode::Fragment(Fragment { key, children, span: () }) => Self::Fragment {
				key,
				children: children.into_iter().map(Into::into).collect(),
			},
		}
	}
}

/// Builds an element, a fragment or a new component instance.
///
/// Only `key` is kept from a fragment's `attributes`. Elements treat `key` as ordinary attribute,
/// components receive it as ordinary prop.
pub fn create_element(ty: impl Into<ElementType>, attributes: Map, children: impl IntoIterator<Item = Child>) -> Node {
	let mut flattened = vec![];
	flatten_into(&mut flattened, children);
	match ty.into() {
		ElementType::Tag(tag) => Node::Element {
			tag,
			attributes,
			children: flattened,
		},
		ElementType::Fragment => {
			let key = attributes.get("key").map(|key| match key {
				Value::String(key) => key.to_string(),
				key => key.to_attribute_string(),
			});
			if attributes.len() > usize::from(key.is_some()) {
				trace!("Ignoring fragment attributes other than `key`.");
			}
			Node::Fragment { key, children: flattened }
		}
		ElementType::Component(construct) => Node::Component(ComponentRef::from_box(construct(), attributes, flattened)),
	}
}

fn flatten_into(flattened: &mut Vec<Node>, children: impl IntoIterator<Item = Child>) {
	for child in children {
		match child {
			Child::Node(node) => flattened.push(node),
			Child::List(children) => flatten_into(flattened, children),
			Child::Empty => (),
		}
	}
}

/// Builds a [`Map`] from key-value pairs, e.g. for [`create_element`]'s `attributes`.
pub fn attributes<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Map {
	entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
