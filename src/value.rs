//! Attribute, prop and state values.

use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use std::{collections::BTreeMap, rc::Rc};

/// String-keyed map of [`Value`]s, used for attributes, props and state.
pub type Map = BTreeMap<String, Value>;

/// A loosely typed value, as assigned to attributes, props and component state.
///
/// Composite values ([`Value::Array`], [`Value::Map`] and [`Value::Callback`]) are shared by reference.
/// [`Value::same`] and this type's [`PartialEq`] implementation compare them by identity only.
#[derive(Clone)]
pub enum Value {
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	Array(Rc<Vec<Value>>),
	Map(Rc<Map>),
	Callback(Callback),
}

impl Value {
	#[must_use]
	pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
		Self::Array(Rc::new(items.into_iter().collect()))
	}

	#[must_use]
	pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
		Self::Map(Rc::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()))
	}

	/// Shallow comparison.
	///
	/// Primitives compare by value (so `NaN` is never the same as itself),
	/// composites and callbacks only if they are the same reference.
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			#[allow(clippy::float_cmp)]
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
			(Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
			(Self::Callback(a), Self::Callback(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	/// Whether a state merge recurses into this value instead of overwriting it.
	#[must_use]
	pub fn is_composite(&self) -> bool {
		matches!(self, Self::Array(_) | Self::Map(_))
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(string) => Some(string),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Self::Number(number) => Some(number),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_map(&self) -> Option<&Map> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_callback(&self) -> Option<&Callback> {
		match self {
			Self::Callback(callback) => Some(callback),
			_ => None,
		}
	}

	/// Looks up `key` in a [`Value::Map`], or an index in a [`Value::Array`].
	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		match self {
			Self::Map(map) => map.get(key),
			Self::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
			_ => None,
		}
	}

	/// The string a browser would store when this value is assigned as attribute.
	#[must_use]
	pub fn to_attribute_string(&self) -> String {
		match self {
			Self::Null => "null".to_owned(),
			Self::Bool(b) => b.to_string(),
			Self::Number(number) => format_number(*number),
			Self::String(string) => string.to_string(),
			Self::Array(items) => items
				.iter()
				.map(|item| match item {
					Self::Null => String::new(),
					item => item.to_attribute_string(),
				})
				.collect::<Vec<_>>()
				.join(","),
			Self::Map(_) => "[object Object]".to_owned(),
			Self::Callback(_) => "[object Function]".to_owned(),
		}
	}
}

fn format_number(number: f64) -> String {
	if number.is_nan() {
		"NaN".to_owned()
	} else if number.is_infinite() {
		String::from(if number > 0.0 { "Infinity" } else { "-Infinity" })
	} else if number == 0.0 {
		"0".to_owned()
	} else {
		// `Display` for `f64` already omits a trailing `.0`.
		number.to_string()
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.same(other)
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(b) => Debug::fmt(b, f),
			Self::Number(number) => Debug::fmt(number, f),
			Self::String(string) => Debug::fmt(string, f),
			Self::Array(items) => f.debug_list().entries(items.iter()).finish(),
			Self::Map(map) => f.debug_map().entries(map.iter()).finish(),
			Self::Callback(callback) => Debug::fmt(callback, f),
		}
	}
}

impl Default for Value {
	fn default() -> Self {
		Self::Null
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for Value {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl From<&str> for Value {
	fn from(string: &str) -> Self {
		Self::String(string.into())
	}
}

impl From<String> for Value {
	fn from(string: String) -> Self {
		Self::String(string.into())
	}
}

impl From<Map> for Value {
	fn from(map: Map) -> Self {
		Self::Map(Rc::new(map))
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Self::Array(Rc::new(items))
	}
}

impl From<Callback> for Value {
	fn from(callback: Callback) -> Self {
		Self::Callback(callback)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// An event handler.
///
/// The host passes its native event type as `&dyn Any`:
/// [`web_sys::Event`] for the [DOM host](`crate::dom`) and [`crate::memory::Event`] for the in-memory one.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&dyn Any)>);
impl Callback {
	pub fn new(handler: impl 'static + Fn(&dyn Any)) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// A stable identity for as long as any clone of this [`Callback`] is alive.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}

impl Debug for Callback {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Callback({:#x})", self.id())
	}
}
