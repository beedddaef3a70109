//! The document layer the reconciler writes through.

use crate::value::Value;
use core::fmt::Debug;

/// Low-level tree surgery on a concrete document.
///
/// Implemented by [`crate::memory::Document`] and [`crate::dom::DomHost`].
/// The reconciler never calls these directly, only through [`Span`](`crate::span::Span`) cursors.
///
/// Hosts are cheap handles to shared documents: [`Clone`] must not copy the document itself.
pub trait Host: Clone {
	/// A handle to an element or text node. Equality is node identity.
	type Node: Clone + PartialEq + Debug;
	type Error: Debug;

	fn create_element(&self, tag: &str) -> Result<Self::Node, Self::Error>;
	fn create_text(&self, content: &str) -> Result<Self::Node, Self::Error>;

	/// Inserts the detached `node` into `parent` before `reference`, or at the end if `reference` is [`None`].
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) -> Result<(), Self::Error>;
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn last_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
	fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;

	/// Binds `listener` to events named `event` on `element`.
	///
	/// `listener` is passed through as assigned. Hosts fail for values that aren't callable.
	fn add_event_listener(&self, element: &Self::Node, event: &str, listener: &Value) -> Result<(), Self::Error>;

	/// Undoes one [`Host::add_event_listener`] with the same arguments, once `element` was dropped from the tree.
	///
	/// Hosts may then release whatever they keep for `listener`. Values that aren't callable were never bound and are ignored.
	fn remove_event_listener(&self, element: &Self::Node, event: &str, listener: &Value) -> Result<(), Self::Error>;

	fn inspect(&self, node: &Self::Node) -> Inspected;
}

/// What [`Host::inspect`] can tell about a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspected {
	Element { tag: String, attributes: Vec<(String, String)> },
	Text(String),
	/// Comments, processing instructions and the like.
	Other,
}
