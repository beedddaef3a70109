//! Structural merging of component state.

use crate::value::{Map, Value};
use std::rc::Rc;
use tracing::trace;

/// Applies `patch` to `state`.
///
/// If `state` isn't a [`Value::Map`] (which includes the initial [`Value::Null`]), it becomes `patch` wholesale.
/// Otherwise each patched key overwrites the existing value, unless that value is an array or map,
/// in which case the merge recurses into it key by key.
///
/// Arrays merge like maps from index to value:
/// Assigning a shorter array overwrites only the overlapping indices and keeps the old trailing items.
/// Merging a primitive into an existing array or map leaves the existing value unchanged.
///
/// Shared maps and arrays are copied on write, so values handed out earlier (e.g. as attributes) keep their contents and identity.
pub fn update(state: &mut Value, patch: Map) {
	match state {
		Value::Map(map) => {
			let map = Rc::make_mut(map);
			for (key, value) in &patch {
				set_key(map, key, value)
			}
		}
		_ => *state = patch.into(),
	}
}

fn assign(slot: &mut Value, value: &Value) {
	if slot.is_composite() {
		merge_into(slot, value)
	} else {
		*slot = value.clone()
	}
}

fn merge_into(target: &mut Value, patch: &Value) {
	match patch {
		Value::Map(entries) => {
			for (key, value) in entries.iter() {
				match target {
					Value::Map(map) => set_key(Rc::make_mut(map), key, value),
					Value::Array(items) => match canonical_index(key) {
						Some(index) => set_index(Rc::make_mut(items), index, value),
						None => trace!("Ignoring non-index key merged into an array."),
					},
					_ => unreachable!("only composites are merged into"),
				}
			}
		}
		Value::Array(values) => {
			for (index, value) in values.iter().enumerate() {
				match target {
					Value::Map(map) => set_key(Rc::make_mut(map), &index.to_string(), value),
					Value::Array(items) => set_index(Rc::make_mut(items), index, value),
					_ => unreachable!("only composites are merged into"),
				}
			}
		}
		_ => trace!("Merging a primitive into a composite value leaves it unchanged."),
	}
}

fn set_key(map: &mut Map, key: &str, value: &Value) {
	match map.get_mut(key) {
		Some(slot) => assign(slot, value),
		None => {
			map.insert(key.to_owned(), value.clone());
		}
	}
}

fn set_index(items: &mut Vec<Value>, index: usize, value: &Value) {
	if let Some(slot) = items.get_mut(index) {
		assign(slot, value)
	} else {
		items.resize(index, Value::Null);
		items.push(value.clone());
	}
}

/// Only the canonical spelling of an index addresses an array item, so `"01"` and `"+1"` don't.
fn canonical_index(key: &str) -> Option<usize> {
	key.parse::<usize>().ok().filter(|index| index.to_string() == key)
}

#[cfg(test)]
mod tests {
	use super::update;
	use crate::value::{Map, Value};

	fn map<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Map {
		entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
	}

	fn numbers(items: &[i32]) -> Value {
		Value::array(items.iter().copied().map(Value::from))
	}

	#[test]
	fn uninitialized_state_is_replaced() {
		let mut state = Value::Null;
		update(&mut state, map([("a", 1.into())]));
		assert_eq!(state.get("a"), Some(&Value::from(1)));
	}

	#[test]
	fn non_map_state_is_replaced() {
		let mut state = Value::from("old");
		update(&mut state, map([("a", 1.into())]));
		assert_eq!(state.as_map().map(Map::len), Some(1));
	}

	#[test]
	fn nested_merge() {
		let mut state = Value::from(map([("a", 1.into()), ("b", map([("c", 2.into()), ("d", 3.into())]).into())]));
		update(&mut state, map([("b", map([("c", 9.into())]).into())]));

		assert_eq!(state.get("a"), Some(&Value::from(1)));
		let b = state.get("b").unwrap();
		assert_eq!(b.get("c"), Some(&Value::from(9)));
		assert_eq!(b.get("d"), Some(&Value::from(3)));
		assert_eq!(b.as_map().map(Map::len), Some(2));
	}

	#[test]
	fn primitives_are_overwritten() {
		let mut state = Value::from(map([("a", 1.into()), ("b", Value::Null)]));
		update(&mut state, map([("a", "x".into()), ("b", map([("c", 1.into())]).into()), ("new", true.into())]));
		assert_eq!(state.get("a"), Some(&Value::from("x")));
		assert_eq!(state.get("b").and_then(|b| b.get("c")), Some(&Value::from(1)));
		assert_eq!(state.get("new"), Some(&Value::from(true)));
	}

	#[test]
	fn shorter_array_keeps_trailing_items() {
		let mut state = Value::from(map([("list", numbers(&[1, 2, 3]))]));
		update(&mut state, map([("list", numbers(&[7]))]));
		assert_eq!(state.get("list").unwrap().to_attribute_string(), "7,2,3");
	}

	#[test]
	fn longer_array_extends() {
		let mut state = Value::from(map([("list", numbers(&[1]))]));
		update(&mut state, map([("list", numbers(&[4, 5]))]));
		assert_eq!(state.get("list").unwrap().to_attribute_string(), "4,5");
	}

	#[test]
	fn map_into_array_by_index() {
		let mut state = Value::from(map([("list", numbers(&[1, 2]))]));
		update(&mut state, map([("list", map([("1", 9.into()), ("01", 8.into()), ("length", 0.into())]).into())]));
		assert_eq!(state.get("list").unwrap().to_attribute_string(), "1,9");
	}

	#[test]
	fn primitive_into_composite_is_ignored() {
		let mut state = Value::from(map([("b", map([("c", 2.into())]).into())]));
		update(&mut state, map([("b", 5.into())]));
		assert_eq!(state.get("b").and_then(|b| b.get("c")), Some(&Value::from(2)));
	}

	#[test]
	fn copy_on_write() {
		let inner = Value::from(map([("c", 2.into())]));
		let mut state = Value::from(map([("b", inner.clone())]));
		update(&mut state, map([("b", map([("c", 3.into())]).into())]));

		assert_eq!(inner.get("c"), Some(&Value::from(2)));
		assert_eq!(state.get("b").and_then(|b| b.get("c")), Some(&Value::from(3)));
		assert!(!state.get("b").unwrap().same(&inner));
	}
}
