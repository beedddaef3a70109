//! The positional diff between a materialized tree and its successor.

use crate::{
	attribute,
	host::Host,
	materialize::materialize,
	redact, LogPath,
	span::Span,
	vnode::{is_same_node, Element, Fragment, Rendered, Text, VNode},
};
use tracing::{error, info, instrument, trace, trace_span};

#[derive(Debug, Default)]
struct Stats {
	reused: usize,
	replaced: usize,
	appended: usize,
	removed: usize,
	released: usize,
}

/// Patches the document from `old` to `new` and returns `new` with the spans it now occupies.
///
/// At each position, a node that [`is_same_node`] as its predecessor inherits its span, and only its children are reconciled.
/// Any other node is materialized into its predecessor's span instead, replacing that whole subtree.
///
/// Children are matched by index only. Surplus new children are appended after the last processed sibling,
/// surplus old children are cleared. If `new` has no children at all, the old children are left in place.
///
/// Listeners bound inside replaced or removed subtrees are unbound through [`Host::remove_event_listener`].
///
/// `old` is not changed, so it stays available if the host fails part of the way through.
///
/// # Errors
///
/// Host errors are returned as-is. There is no rollback.
#[instrument(skip(host, old, new), fields(old = old.kind_name(), new = new.kind_name()))]
pub fn reconcile<H: Host>(host: &H, old: &Rendered<H>, new: VNode) -> Result<Rendered<H>, H::Error> {
	let mut stats = Stats::default();
	let tree = reconcile_at(host, old, new, &mut vec![], &mut stats)?;
	let Stats {
		reused,
		replaced,
		appended,
		removed,
		released,
	} = stats;
	info!(reused, replaced, appended, removed, released, "Reconciled.");
	Ok(tree)
}

fn reconcile_at<H: Host>(host: &H, old: &Rendered<H>, new: VNode, path: &mut Vec<usize>, stats: &mut Stats) -> Result<Rendered<H>, H::Error> {
	if !is_same_node(old, &new) {
		let span = trace_span!("Replacing mismatching", old = old.kind_name(), new = new.kind_name(), path = ?LogPath(path));
		let _enter = span.enter();
		stats.replaced += 1;
		let replacement = materialize(host, new, old.region())?;
		stats.released += release(host, old)?;
		return Ok(replacement);
	}
	stats.reused += 1;

	match (old, new) {
		(VNode::Text(old), VNode::Text(Text { content, span: () })) => {
			let span = trace_span!("Reusing text", text = redact(&content), path = ?LogPath(path));
			let _enter = span.enter();
			Ok(VNode::Text(Text { content, span: old.span.clone() }))
		}

		(VNode::Element(old), VNode::Element(Element { tag, attributes, children, span: () })) => {
			let span = trace_span!("Reusing element", tag = tag.as_str(), path = ?LogPath(path));
			let _enter = span.enter();
			let children = if children.is_empty() {
				trace!("No new children. Leaving {} old child(ren) in place.", old.children.len());
				vec![]
			} else {
				let anchor = match old.span.single_node() {
					Some(element) => Anchor::Inside(element),
					None => {
						error!("Element span doesn't consist of one node. Appending after it instead.");
						Anchor::At(old.span.clone_after())
					}
				};
				reconcile_children(host, &old.children, children, anchor, path, stats)?
			};
			Ok(VNode::Element(Element {
				tag,
				attributes,
				children,
				span: old.span.clone(),
			}))
		}

		(old_fragment @ VNode::Fragment(_), VNode::Fragment(Fragment { key, children, span: () })) => {
			let span = trace_span!("Reusing fragment", key = ?key, path = ?LogPath(path));
			let _enter = span.enter();
			let region = old_fragment.region();
			let children = if children.is_empty() {
				trace!("No new children. Leaving {} old child(ren) in place.", old_fragment.children().len());
				vec![]
			} else {
				reconcile_children(host, old_fragment.children(), children, Anchor::At(region.clone()), path, stats)?
			};
			Ok(VNode::Fragment(Fragment { key, children, span: region }))
		}

		(old, new) => unreachable!("`is_same_node` matched a {} with a {}", old.kind_name(), new.kind_name()),
	}
}

/// Where the first child goes if there was none before.
enum Anchor<'a, N> {
	/// At the end of an element's content.
	Inside(&'a N),
	/// Into this span, replacing e.g. an empty fragment's placeholder.
	At(Span<N>),
}

fn reconcile_children<H: Host>(
	host: &H,
	old_children: &[Rendered<H>],
	new_children: Vec<VNode>,
	anchor: Anchor<'_, H::Node>,
	path: &mut Vec<usize>,
	stats: &mut Stats,
) -> Result<Vec<Rendered<H>>, H::Error> {
	let new_len = new_children.len();
	let mut anchor = Some(anchor);
	let mut rendered: Vec<Rendered<H>> = Vec::with_capacity(new_len);
	for (i, new_child) in new_children.into_iter().enumerate() {
		path.push(i);
		let child = match old_children.get(i) {
			Some(old_child) => reconcile_at(host, old_child, new_child, path, stats)?,
			None => {
				let span = trace_span!("Appending child", i, kind = new_child.kind_name(), path = ?LogPath(path));
				let _enter = span.enter();
				let at = match (rendered.last(), anchor.take()) {
					(Some(previous), _) => previous.region().clone_after(),
					(None, Some(Anchor::Inside(element))) => Span::end_of(host, element),
					(None, Some(Anchor::At(at))) => at,
					(None, None) => unreachable!("the anchor is only taken for the first child"),
				};
				stats.appended += 1;
				materialize(host, new_child, at)?
			}
		};
		path.pop();
		rendered.push(child);
	}

	for (i, removed) in old_children.iter().enumerate().skip(new_len) {
		let span = trace_span!("Removing child", i, kind = removed.kind_name());
		let _enter = span.enter();
		stats.removed += 1;
		removed.region().clear(host)?;
		stats.released += release(host, removed)?;
	}

	Ok(rendered)
}

/// Unbinds the listeners of a subtree that is no longer in the document, and returns how many there were.
fn release<H: Host>(host: &H, old: &Rendered<H>) -> Result<usize, H::Error> {
	match old {
		VNode::Text(_) => Ok(0),
		VNode::Element(Element {
			tag,
			attributes,
			children,
			span: region,
		}) => {
			let span = trace_span!("Releasing element", tag = tag.as_str());
			let _enter = span.enter();
			let mut released = 0;
			match region.single_node() {
				Some(element) => {
					for (key, value) in attributes {
						if attribute::unbind(host, element, key, value)? {
							released += 1;
						}
					}
				}
				None => error!("Element span doesn't consist of one node. Can't unbind its listeners."),
			}
			for child in children {
				released += release(host, child)?;
			}
			Ok(released)
		}
		VNode::Fragment(Fragment { children, .. }) => {
			let mut released = 0;
			for child in children {
				released += release(host, child)?;
			}
			Ok(released)
		}
	}
}
