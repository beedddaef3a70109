//! User components and their state updates.

use crate::{
	host::Host,
	node::Node,
	LogPath,
	reconcile::reconcile,
	state,
	value::{Map, Value},
	vnode::{Element, Fragment, Rendered, Text, VNode},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{error, info, instrument, trace, trace_span};

/// The authoring surface of a component.
///
/// `render` is called once per mount or update and must not have side effects:
/// everything it depends on is available through the [`Context`].
pub trait Component: 'static {
	fn render(&self, cx: &Context<'_>) -> Node;

	/// The state before the first [`ComponentRef::update_state`]. [`None`] leaves it [`Value::Null`].
	fn initial_state(&self) -> Option<Map> {
		None
	}
}

/// What a [`Component`] may read while rendering.
pub struct Context<'a> {
	props: &'a Map,
	children: &'a [Node],
	state: Value,
	this: WeakComponentRef,
}
impl<'a> Context<'a> {
	#[must_use]
	pub fn props(&self) -> &'a Map {
		self.props
	}

	/// The prop named `name`, or [`Value::Null`] if the creator didn't supply it.
	#[must_use]
	pub fn prop(&self, name: &str) -> Value {
		self.props.get(name).cloned().unwrap_or(Value::Null)
	}

	/// The children passed to [`create_element`](`crate::node::create_element`), unresolved.
	#[must_use]
	pub fn children(&self) -> &'a [Node] {
		self.children
	}

	#[must_use]
	pub fn state(&self) -> &Value {
		&self.state
	}

	/// A handle for event handlers, which mustn't keep the component alive.
	#[must_use]
	pub fn this(&self) -> WeakComponentRef {
		self.this.clone()
	}
}

#[derive(Debug, Error)]
pub enum UpdateError {
	#[error("the component is not mounted")]
	NotMounted,
	#[error("the component is already being updated")]
	Reentrant,
	#[error("the component was dropped")]
	Dropped,
	#[error("host operation failed: {0:?}")]
	Host(Box<dyn Debug>),
}

/// A shared handle to a component instance.
#[derive(Clone)]
pub struct ComponentRef(Rc<Instance>);

/// A [`ComponentRef`] that doesn't keep the component alive.
#[derive(Clone)]
pub struct WeakComponentRef(Weak<Instance>);

struct Instance {
	component: Box<dyn Component>,
	props: Map,
	children: Vec<Node>,
	state: RefCell<Value>,
	mount: RefCell<MountState>,
}

enum MountState {
	Unmounted,
	Mounted(Box<dyn Patch>),
	Patching,
}

/// The reconciliation side of a mounted component, kept apart from the authoring surface.
pub(crate) trait Patch {
	/// Reconciles this component's output in the shared tree against `next`, and stores the result there.
	fn patch(&mut self, next: VNode, owners: Vec<Owner>) -> Result<(), UpdateError>;

	/// Unmounts the components nested in this one's output.
	fn unmount_nested(&self);
}

/// A component found while flattening, with the path of its output from the flattened root.
pub(crate) struct Owner {
	pub path: Vec<usize>,
	pub component: ComponentRef,
}

/// The tree a root and all components inside it patch, so that each sees the others' changes.
pub(crate) type SharedTree<H> = Rc<RefCell<Rendered<H>>>;

struct Mounted<H: Host> {
	host: H,
	tree: SharedTree<H>,
	/// Where this component's output is in `tree`.
	path: Vec<usize>,
	/// Keeps components nested in this one's output alive, so their event handlers can still update them.
	/// Includes all of their own nested components, outermost last.
	nested: Vec<ComponentRef>,
}

impl<H: Host + 'static> Patch for Mounted<H>
where
	H::Error: 'static,
{
	fn patch(&mut self, next: VNode, owners: Vec<Owner>) -> Result<(), UpdateError> {
		{
			let mut tree = self.tree.try_borrow_mut().map_err(|_| UpdateError::Reentrant)?;
			let previous = tree.at_path_mut(&self.path).ok_or_else(|| {
				error!(path = ?LogPath(&self.path), "Component output missing from the shared tree.");
				UpdateError::NotMounted
			})?;
			*previous = reconcile(&self.host, previous, next).map_err(|error| UpdateError::Host(Box::new(error)))?;
		}
		unmount_all(&self.nested);
		self.nested = adopt(&self.host, &self.tree, &self.path, owners);
		Ok(())
	}

	fn unmount_nested(&self) {
		unmount_all(&self.nested);
	}
}

impl ComponentRef {
	pub fn new(component: impl Component, props: Map, children: Vec<Node>) -> Self {
		Self::from_box(Box::new(component), props, children)
	}

	pub(crate) fn from_box(component: Box<dyn Component>, props: Map, children: Vec<Node>) -> Self {
		let state = component.initial_state().map_or(Value::Null, Value::from);
		Self(Rc::new(Instance {
			component,
			props,
			children,
			state: RefCell::new(state),
			mount: RefCell::new(MountState::Unmounted),
		}))
	}

	#[must_use]
	pub fn props(&self) -> &Map {
		&self.0.props
	}

	#[must_use]
	pub fn children(&self) -> &[Node] {
		&self.0.children
	}

	#[must_use]
	pub fn state(&self) -> Value {
		self.0.state.borrow().clone()
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		!matches!(*self.0.mount.borrow(), MountState::Unmounted)
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakComponentRef {
		WeakComponentRef(Rc::downgrade(&self.0))
	}

	/// Merges `patch` into the state (see [`state::update`]) and patches the document to match a fresh render.
	///
	/// The state is merged even if the document can't be patched.
	///
	/// # Errors
	///
	/// - [`UpdateError::NotMounted`] before the component was first rendered into a document.
	/// - [`UpdateError::Reentrant`] if called while this component is being patched, e.g. from its own `render`.
	/// - [`UpdateError::Host`] if the host failed. The document may be partially patched then,
	///   and the component keeps its previous tree.
	#[instrument(skip(patch))]
	pub fn update_state(&self, patch: Map) -> Result<(), UpdateError> {
		state::update(&mut self.0.state.borrow_mut(), patch);

		let mut mounted = match self.0.mount.replace(MountState::Patching) {
			MountState::Mounted(mounted) => mounted,
			MountState::Patching => return Err(UpdateError::Reentrant),
			MountState::Unmounted => {
				*self.0.mount.borrow_mut() = MountState::Unmounted;
				return Err(UpdateError::NotMounted);
			}
		};

		let mut owners = vec![];
		let next = self.render(&mut vec![], &mut owners);
		let result = mounted.patch(next, owners);
		*self.0.mount.borrow_mut() = MountState::Mounted(mounted);

		match &result {
			Ok(()) => info!("Component updated."),
			Err(error) => error!("Component update failed: {}", error),
		}
		result
	}

	fn render(&self, path: &mut Vec<usize>, owners: &mut Vec<Owner>) -> VNode {
		let cx = Context {
			props: &self.0.props,
			children: &self.0.children,
			state: self.state(),
			this: self.downgrade(),
		};
		let output = self.0.component.render(&cx);
		flatten(&output, path, owners)
	}

	fn mount(&self, mounted: Box<dyn Patch>) {
		let mut mount = self.0.mount.borrow_mut();
		if let MountState::Patching = *mount {
			// Only possible if a component renders itself while updating.
			error!("Not replacing the tree of a component that is being patched.");
			return;
		}
		*mount = MountState::Mounted(mounted);
	}

	/// Unmounts this component and, through its own [`Mounted`], everything nested in it at the time.
	fn unmount(&self) {
		let previous = {
			let mut mount = self.0.mount.borrow_mut();
			match *mount {
				MountState::Mounted(_) => core::mem::replace(&mut *mount, MountState::Unmounted),
				MountState::Unmounted | MountState::Patching => return,
			}
		};
		if let MountState::Mounted(mounted) = previous {
			mounted.unmount_nested();
		}
	}
}

impl Debug for ComponentRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentRef")
			.field("props", &self.0.props)
			.field("children.len()", &self.0.children.len())
			.field("mounted", &self.is_mounted())
			.finish()
	}
}

impl WeakComponentRef {
	#[must_use]
	pub fn upgrade(&self) -> Option<ComponentRef> {
		self.0.upgrade().map(ComponentRef)
	}

	/// See [`ComponentRef::update_state`].
	///
	/// # Errors
	///
	/// [`UpdateError::Dropped`] if the component no longer exists, otherwise as [`ComponentRef::update_state`].
	pub fn update_state(&self, patch: Map) -> Result<(), UpdateError> {
		self.upgrade().ok_or(UpdateError::Dropped)?.update_state(patch)
	}
}

impl Debug for WeakComponentRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("WeakComponentRef").field(&self.0.as_ptr()).finish()
	}
}

/// Resolves nested components by rendering them, recording each one as [`Owner`] of its output.
pub(crate) fn flatten(node: &Node, path: &mut Vec<usize>, owners: &mut Vec<Owner>) -> VNode {
	match node {
		Node::Text(content) => VNode::Text(Text {
			content: content.clone(),
			span: (),
		}),
		Node::Element { tag, attributes, children } => VNode::Element(Element {
			tag: tag.clone(),
			attributes: attributes.clone(),
			children: flatten_children(children, path, owners),
			span: (),
		}),
		Node::Fragment { key, children } => VNode::Fragment(Fragment {
			key: key.clone(),
			children: flatten_children(children, path, owners),
			span: (),
		}),
		Node::Component(component) => {
			let span = trace_span!("Rendering component", "props.len()" = component.props().len());
			let _enter = span.enter();
			let vnode = component.render(path, owners);
			owners.push(Owner {
				path: path.clone(),
				component: component.clone(),
			});
			vnode
		}
	}
}

fn flatten_children(children: &[Node], path: &mut Vec<usize>, owners: &mut Vec<Owner>) -> Vec<VNode> {
	children
		.iter()
		.enumerate()
		.map(|(i, child)| {
			path.push(i);
			let vnode = flatten(child, path, owners);
			path.pop();
			vnode
		})
		.collect()
}

/// Mounts each owner at its output, found at `base` followed by the owner's path in `tree`.
///
/// `owners` must be in the order [`flatten`] found them, where nested components come before the one that rendered them.
/// Each owner then keeps the earlier owners inside its own output as its nested components.
///
/// Returns the owners, which the caller keeps alive.
pub(crate) fn adopt<H: Host + 'static>(host: &H, tree: &SharedTree<H>, base: &[usize], owners: Vec<Owner>) -> Vec<ComponentRef>
where
	H::Error: 'static,
{
	let paths: Vec<Vec<usize>> = owners.iter().map(|owner| [base, &owner.path].concat()).collect();
	let components: Vec<ComponentRef> = owners.into_iter().map(|owner| owner.component).collect();

	let mut adopted = Vec::with_capacity(components.len());
	for (i, (path, component)) in paths.iter().zip(&components).enumerate() {
		if tree.borrow().at_path(path).is_none() {
			error!(path = ?LogPath(path), "Component output not found in the rendered tree.");
			continue;
		}

		// A component that renders another one directly shares its path, so the prefix test includes equality.
		let nested: Vec<ComponentRef> = paths[..i]
			.iter()
			.zip(&components[..i])
			.filter(|(inner, _)| inner.starts_with(path))
			.map(|(_, inner)| inner.clone())
			.collect();
		trace!(path = ?LogPath(path), nested = nested.len(), "Mounting component.");
		component.mount(Box::new(Mounted {
			host: host.clone(),
			tree: Rc::clone(tree),
			path: path.clone(),
			nested,
		}));
		adopted.push(component.clone());
	}
	adopted
}

/// Unmounts components replaced by a fresh render, including those they rendered themselves later on,
/// so stale handles can't patch their former position.
pub(crate) fn unmount_all(components: &[ComponentRef]) {
	for component in components {
		component.unmount();
	}
}
