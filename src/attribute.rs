//! The fixed mapping from attribute keys to host effects.

use crate::{host::Host, value::Value};
use tracing::trace;

/// What assigning an attribute does to a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<'a> {
	/// `on<Name>`: an event listener for `lowercaseFirst(<Name>)`, e.g. `"onClick"` ⇒ `"click"`.
	Listener(&'a str),
	/// `className`: the host's `class` attribute.
	Class,
	Attribute(&'a str),
}

impl<'a> Binding<'a> {
	/// Maps an attribute key to its effect.
	///
	/// Any non-empty suffix after `on` names an event, which lets `onclick` work just like `onClick`.
	#[must_use]
	pub fn classify(key: &'a str) -> Self {
		match key.strip_prefix("on") {
			Some(event) if !event.is_empty() => Self::Listener(event),
			_ if key == "className" => Self::Class,
			_ => Self::Attribute(key),
		}
	}

	/// The event name for [`Binding::Listener`], with its first character lower-cased.
	#[must_use]
	pub fn event_name(suffix: &str) -> String {
		let mut chars = suffix.chars();
		chars.next().map_or_else(String::new, |first| first.to_lowercase().chain(chars).collect())
	}
}

/// Applies one attribute to a freshly created `element`.
///
/// Values are passed through unchecked. Whether e.g. a non-callable listener fails is up to the host.
pub fn bind<H: Host>(host: &H, element: &H::Node, key: &str, value: &Value) -> Result<(), H::Error> {
	match Binding::classify(key) {
		Binding::Listener(suffix) => {
			let event = Binding::event_name(suffix);
			trace!(event = %event, "Binding event listener.");
			host.add_event_listener(element, &event, value)
		}
		Binding::Class => host.set_attribute(element, "class", &value.to_attribute_string()),
		Binding::Attribute(name) => host.set_attribute(element, name, &value.to_attribute_string()),
	}
}

/// Undoes the part of [`bind`] that outlives `element` in the host, which is only the case for listeners.
///
/// Returns whether anything was unbound.
pub fn unbind<H: Host>(host: &H, element: &H::Node, key: &str, value: &Value) -> Result<bool, H::Error> {
	match Binding::classify(key) {
		Binding::Listener(suffix) => {
			let event = Binding::event_name(suffix);
			trace!(event = %event, "Unbinding event listener.");
			host.remove_event_listener(element, &event, value).map(|()| true)
		}
		Binding::Class | Binding::Attribute(_) => Ok(false),
	}
}
