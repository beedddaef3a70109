#![doc(html_root_url = "https://docs.rs/span-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Components render [`VNode`] trees, which are [materialized](`materialize::materialize`) into [`Span`]s of a [`Host`] document.
//! On state changes, the document is [reconciled](`reconcile::reconcile`) in place, position by position.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attribute;
pub mod component;
pub mod dom;
pub mod host;
pub mod load;
pub mod materialize;
pub mod memory;
pub mod node;
pub mod reconcile;
pub mod root;
pub mod span;
pub mod state;
pub mod value;
pub mod vnode;

pub use component::{Component, ComponentRef, Context, UpdateError, WeakComponentRef};
pub use host::Host;
pub use node::{attributes, component, create_element, Child, ElementType, Node};
pub use root::{render, Root};
pub use span::Span;
pub use value::{Callback, Map, Value};
pub use vnode::{is_same_node, Rendered, VNode};

use core::fmt::{self, Debug, Formatter};

/// Text content, only logged with the `dangerous-logging` feature.
#[allow(clippy::non_ascii_literal)]
pub(crate) fn redact(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"…"
	}
}

/// A child index path, only logged with the `log-paths` feature.
pub(crate) struct LogPath<'a>(pub &'a [usize]);
impl Debug for LogPath<'_> {
	#[allow(clippy::non_ascii_literal)]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "log-paths") {
			Debug::fmt(self.0, f)
		} else {
			f.write_str("…")
		}
	}
}
