//! Virtual nodes: the flattened output of one render pass.

use crate::{host::Host, span::Span, value::Map};
use core::fmt::Debug;

/// A materialized tree, as cached between updates.
pub type Rendered<H> = VNode<Span<<H as Host>::Node>>;

/// One node of a render result.
///
/// `M` is the per-node mark: `()` for a fresh description,
/// a [`Span`] once [materialized](`crate::materialize::materialize`).
/// Apart from that mark, a [`VNode`] isn't changed after it is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode<M = ()> {
	Text(Text<M>),
	Element(Element<M>),
	Fragment(Fragment<M>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text<M = ()> {
	pub content: String,
	pub span: M,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element<M = ()> {
	pub tag: String,
	pub attributes: Map,
	pub children: Vec<VNode<M>>,
	pub span: M,
}

/// A group of siblings without a document node of its own.
///
/// Once materialized, `span` is only meaningful while `children` is empty.
/// Otherwise the fragment occupies the concatenation of its children's spans, see [`VNode::region`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment<M = ()> {
	/// Stored and compared by [`is_same_node`], but never used to match children.
	pub key: Option<String>,
	pub children: Vec<VNode<M>>,
	pub span: M,
}

impl VNode {
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text(Text { content: content.into(), span: () })
	}

	pub fn element(tag: impl Into<String>, attributes: Map, children: Vec<VNode>) -> Self {
		Self::Element(Element {
			tag: tag.into(),
			attributes,
			children,
			span: (),
		})
	}

	#[must_use]
	pub fn fragment(key: Option<String>, children: Vec<VNode>) -> Self {
		Self::Fragment(Fragment { key, children, span: () })
	}
}

impl<M> VNode<M> {
	#[must_use]
	pub fn children(&self) -> &[VNode<M>] {
		match self {
			Self::Text(_) => &[],
			Self::Element(Element { children, .. }) | Self::Fragment(Fragment { children, .. }) => children,
		}
	}

	/// Follows child indices from this node.
	#[must_use]
	pub fn at_path(&self, path: &[usize]) -> Option<&VNode<M>> {
		path.iter().try_fold(self, |node, &i| node.children().get(i))
	}

	pub(crate) fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut VNode<M>> {
		path.iter().try_fold(self, |node, &i| match node {
			Self::Text(_) => None,
			Self::Element(Element { children, .. }) | Self::Fragment(Fragment { children, .. }) => children.get_mut(i),
		})
	}

	/// Drops the marks, e.g. to compare a materialized tree against an expected description.
	#[must_use]
	pub fn unmarked(&self) -> VNode {
		match self {
			Self::Text(Text { content, .. }) => VNode::text(content.clone()),
			Self::Element(Element { tag, attributes, children, .. }) => VNode::element(tag.clone(), attributes.clone(), children.iter().map(Self::unmarked).collect()),
			Self::Fragment(Fragment { key, children, .. }) => VNode::fragment(key.clone(), children.iter().map(Self::unmarked).collect()),
		}
	}

	pub(crate) fn kind_name(&self) -> &'static str {
		match self {
			Self::Text(_) => "text",
			Self::Element(_) => "element",
			Self::Fragment(_) => "fragment",
		}
	}
}

impl<N: Clone + PartialEq + Debug> VNode<Span<N>> {
	/// The span this node currently occupies.
	#[must_use]
	pub fn region(&self) -> Span<N> {
		match self {
			Self::Text(Text { span, .. }) | Self::Element(Element { span, .. }) => span.clone(),
			Self::Fragment(Fragment { children, span, .. }) => match (children.first(), children.last()) {
				(Some(first), Some(last)) => Span::cover(&first.region(), &last.region()),
				_ => span.clone(),
			},
		}
	}
}

/// Decides whether `new` may reuse `old`'s span, so that only their children need reconciling.
///
/// Attribute values are compared shallowly (see [`Value::same`](`crate::value::Value::same`)),
/// so maps and callbacks recreated during each render always count as changed.
#[must_use]
pub fn is_same_node<A, B>(old: &VNode<A>, new: &VNode<B>) -> bool {
	match (old, new) {
		(VNode::Text(old), VNode::Text(new)) => old.content == new.content,
		(VNode::Element(old), VNode::Element(new)) => {
			old.tag == new.tag
				&& old.attributes.len() == new.attributes.len()
				&& new.attributes.iter().all(|(name, value)| old.attributes.get(name).map_or(false, |old_value| old_value.same(value)))
		}
		(VNode::Fragment(old), VNode::Fragment(new)) => old.key == new.key,
		_ => false,
	}
}
