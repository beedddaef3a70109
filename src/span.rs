//! Cursors over contiguous runs of sibling nodes.

use crate::{
	host::Host,
	materialize,
	vnode::{Rendered, VNode},
};
use core::fmt::Debug;
use tracing::{error, instrument, trace};

/// A contiguous region of the live document, as occupied by one materialized [`VNode`].
///
/// A [`Span`] is either a non-empty run of siblings (`first..=last`) under `parent`,
/// or an empty insertion point right after `after` (at the start of `parent` if that is [`None`]).
///
/// Spans refer to nodes rather than offsets, so they stay valid while sibling spans grow or shrink.
#[derive(Debug, Clone, PartialEq)]
pub struct Span<N> {
	parent: N,
	extent: Extent<N>,
}

#[derive(Debug, Clone, PartialEq)]
enum Extent<N> {
	Nodes { first: N, last: N },
	Point { after: Option<N> },
}

impl<N: Clone + PartialEq + Debug> Span<N> {
	/// Removes all of `container`'s content and returns an insertion point inside it.
	#[instrument(skip(host))]
	pub fn acquire<H: Host<Node = N>>(host: &H, container: &N) -> Result<Self, H::Error> {
		let mut removed = 0_usize;
		while let Some(child) = host.first_child(container) {
			host.remove_child(container, &child)?;
			removed += 1;
		}
		trace!("Cleared {} node(s) from the container.", removed);
		Ok(Self::point(container.clone(), None))
	}

	/// An insertion point after `element`'s current last child.
	pub fn end_of<H: Host<Node = N>>(host: &H, element: &N) -> Self {
		Self::point(element.clone(), host.last_child(element))
	}

	pub(crate) fn single(parent: N, node: N) -> Self {
		Self {
			parent,
			extent: Extent::Nodes { first: node.clone(), last: node },
		}
	}

	fn point(parent: N, after: Option<N>) -> Self {
		Self { parent, extent: Extent::Point { after } }
	}

	/// The span from the start of `first` to the end of `last`. Both must share a parent.
	#[must_use]
	pub fn cover(first: &Self, last: &Self) -> Self {
		debug_assert!(first.parent == last.parent, "Covered spans must be siblings.");
		match (&first.extent, &last.extent) {
			(Extent::Nodes { first: start, .. }, Extent::Nodes { last: end, .. }) => Self {
				parent: first.parent.clone(),
				extent: Extent::Nodes {
					first: start.clone(),
					last: end.clone(),
				},
			},
			(Extent::Nodes { .. }, Extent::Point { .. }) => first.clone(),
			(Extent::Point { .. }, _) => last.clone(),
		}
	}

	#[must_use]
	pub fn parent(&self) -> &N {
		&self.parent
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		matches!(self.extent, Extent::Point { .. })
	}

	/// The node a span for one text or element node consists of.
	#[must_use]
	pub fn single_node(&self) -> Option<&N> {
		match &self.extent {
			Extent::Nodes { first, last } if first == last => Some(first),
			_ => None,
		}
	}

	/// A new empty span immediately after this span's end.
	#[must_use]
	pub fn clone_after(&self) -> Self {
		match &self.extent {
			Extent::Nodes { last, .. } => Self::point(self.parent.clone(), Some(last.clone())),
			Extent::Point { .. } => self.clone(),
		}
	}

	/// Writes `vnode` into this span, replacing whatever currently occupies it.
	pub fn materialize<H: Host<Node = N>>(self, host: &H, vnode: VNode) -> Result<Rendered<H>, H::Error> {
		materialize::materialize(host, vnode, self)
	}

	/// Puts the detached `node` in place of this span's content and returns the span of `node`.
	pub fn replace<H: Host<Node = N>>(&self, host: &H, node: &N) -> Result<Self, H::Error> {
		match &self.extent {
			Extent::Point { after } => {
				let reference = match after {
					Some(after) => host.next_sibling(after),
					None => host.first_child(&self.parent),
				};
				host.insert_before(&self.parent, node, reference.as_ref())?;
			}
			Extent::Nodes { first, last } => {
				host.insert_before(&self.parent, node, Some(first))?;
				remove_run(host, &self.parent, first, last)?;
			}
		}
		Ok(Self::single(self.parent.clone(), node.clone()))
	}

	/// Removes this span's content from the document and returns the empty span left in its place.
	pub fn clear<H: Host<Node = N>>(&self, host: &H) -> Result<Self, H::Error> {
		match &self.extent {
			Extent::Point { .. } => Ok(self.clone()),
			Extent::Nodes { first, last } => {
				let after = host.previous_sibling(first);
				remove_run(host, &self.parent, first, last)?;
				Ok(Self::point(self.parent.clone(), after))
			}
		}
	}

	/// Lists the nodes currently inside this span.
	pub fn nodes<H: Host<Node = N>>(&self, host: &H) -> Vec<N> {
		let mut nodes = vec![];
		if let Extent::Nodes { first, last } = &self.extent {
			let mut current = Some(first.clone());
			while let Some(node) = current {
				let is_last = node == *last;
				current = if is_last { None } else { host.next_sibling(&node) };
				nodes.push(node);
				if !is_last && current.is_none() {
					error!("Span end not found among the following siblings of its start.");
				}
			}
		}
		nodes
	}
}

fn remove_run<H: Host>(host: &H, parent: &H::Node, first: &H::Node, last: &H::Node) -> Result<(), H::Error> {
	let mut current = first.clone();
	loop {
		let next = host.next_sibling(&current);
		host.remove_child(parent, &current)?;
		if current == *last {
			return Ok(());
		}
		current = match next {
			Some(next) => next,
			None => {
				error!("Reached the end of the parent's child nodes before the end of the span. Stopping.");
				return Ok(());
			}
		}
	}
}
