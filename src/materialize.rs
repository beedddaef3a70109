//! Writing fresh [`VNode`]s into the document.

use crate::{
	attribute,
	host::Host,
	redact,
	span::Span,
	value::Value,
	vnode::{Element, Fragment, Rendered, Text, VNode},
};
use core::fmt::{self, Debug, Formatter};
use tracing::{instrument, trace, trace_span};

/// Writes `vnode` into `at`, replacing whatever currently occupies it, and returns the tree annotated with its spans.
///
/// Element content is assembled before the element is inserted, so each element is inserted into the document exactly once.
/// An empty [`Fragment`] is represented by an empty text node, so that it keeps its position among its siblings.
///
/// # Errors
///
/// Host errors are returned as-is. Content written before the failure stays in the document.
#[instrument(skip(host, vnode, at), fields(kind = vnode.kind_name()))]
pub fn materialize<H: Host>(host: &H, vnode: VNode, at: Span<H::Node>) -> Result<Rendered<H>, H::Error> {
	match vnode {
		VNode::Text(Text { content, span: () }) => {
			let span = trace_span!("Creating text node", text = redact(&content));
			let _enter = span.enter();
			let text = host.create_text(&content)?;
			Ok(VNode::Text(Text {
				span: at.replace(host, &text)?,
				content,
			}))
		}

		VNode::Element(Element { tag, attributes, children, span: () }) => {
			let span = trace_span!("Creating element", tag = tag.as_str(), "children.len()" = children.len());
			let _enter = span.enter();
			let element = host.create_element(&tag)?;
			for (key, value) in &attributes {
				let span = trace_span!("Binding attribute", key = key.as_str(), value = ?RedactedValue(value));
				let _enter = span.enter();
				attribute::bind(host, &element, key, value)?;
			}

			let mut rendered: Vec<Rendered<H>> = Vec::with_capacity(children.len());
			for child in children {
				let child_at = match rendered.last() {
					Some(previous) => previous.region().clone_after(),
					None => Span::end_of(host, &element),
				};
				rendered.push(materialize(host, child, child_at)?);
			}

			Ok(VNode::Element(Element {
				span: at.replace(host, &element)?,
				tag,
				attributes,
				children: rendered,
			}))
		}

		VNode::Fragment(Fragment { key, children, span: () }) => {
			let span = trace_span!("Creating fragment", key = ?key, "children.len()" = children.len());
			let _enter = span.enter();
			if children.is_empty() {
				trace!("Empty fragment. Inserting placeholder.");
				let placeholder = host.create_text("")?;
				return Ok(VNode::Fragment(Fragment {
					key,
					children: vec![],
					span: at.replace(host, &placeholder)?,
				}));
			}

			// The first child takes over `at`, the others follow it.
			let mut child_at = at;
			let mut rendered: Vec<Rendered<H>> = Vec::with_capacity(children.len());
			for child in children {
				let child = materialize(host, child, child_at)?;
				child_at = child.region().clone_after();
				rendered.push(child);
			}

			let span = match (rendered.first(), rendered.last()) {
				(Some(first), Some(last)) => Span::cover(&first.region(), &last.region()),
				_ => child_at,
			};
			Ok(VNode::Fragment(Fragment { key, children: rendered, span }))
		}
	}
}

/// An attribute value, only logged with the `dangerous-logging` feature.
struct RedactedValue<'a>(&'a Value);
impl Debug for RedactedValue<'_> {
	#[allow(clippy::non_ascii_literal)]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			Debug::fmt(self.0, f)
		} else {
			f.write_str("…")
		}
	}
}
