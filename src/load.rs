//! Reading existing document content back into [`VNode`]s.

use crate::{
	host::{Host, Inspected},
	value::{Map, Value},
	vnode::VNode,
};
use tracing::{instrument, warn};

/// Loads the child nodes of `parent`.
///
/// Nodes that are neither elements nor text are skipped with a warning.
/// Attribute values are loaded as strings, and there are no event listeners, since hosts can't report them.
#[instrument(skip(host))]
pub fn load_child_nodes<H: Host>(host: &H, parent: &H::Node) -> Vec<VNode> {
	let mut children = vec![];
	let mut next = host.first_child(parent);
	while let Some(child) = next {
		if let Some(vnode) = load_node(host, &child) {
			children.push(vnode);
		}
		next = host.next_sibling(&child);
	}
	children
}

/// Loads `node` and its content, or [`None`] if it's neither an element nor text.
pub fn load_node<H: Host>(host: &H, node: &H::Node) -> Option<VNode> {
	match host.inspect(node) {
		Inspected::Text(text) => Some(VNode::text(text)),
		Inspected::Element { tag, attributes } => Some(VNode::element(tag, load_attributes(attributes), load_child_nodes(host, node))),
		Inspected::Other => {
			warn!("Skipping unrecognised node {:?}.", node);
			None
		}
	}
}

fn load_attributes(attributes: Vec<(String, String)>) -> Map {
	attributes.into_iter().map(|(name, value)| (name, Value::from(value))).collect()
}

#[cfg(test)]
mod tests {
	use super::load_child_nodes;
	use crate::{host::Host, memory::Document, value::Map, vnode::VNode};

	#[test]
	fn loads_nested_content() {
		let document = Document::new();
		let body = document.body();
		let div = document.create_element("div").unwrap();
		document.set_attribute(&div, "class", "box").unwrap();
		let text = document.create_text("hi").unwrap();
		document.insert_before(&div, &text, None).unwrap();
		document.insert_before(&body, &div, None).unwrap();

		let mut attributes = Map::new();
		attributes.insert("class".to_owned(), "box".into());
		let expected = VNode::element("div", attributes, vec![VNode::text("hi")]);

		let loaded = load_child_nodes(&document, &body);
		assert_eq!(loaded.len(), 1);
		assert!(crate::is_same_node(&loaded[0], &expected));
		assert_eq!(loaded[0].children().len(), 1);
	}
}
