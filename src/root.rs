//! Mounting descriptions into a container.

use crate::{
	component::{adopt, flatten, unmount_all, ComponentRef, SharedTree},
	host::Host,
	materialize::materialize,
	node::Node,
	reconcile::reconcile,
	span::Span,
	vnode::Rendered,
};
use core::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::{info, instrument};

/// A description mounted into a container, see [`render`].
pub struct Root<H: Host> {
	host: H,
	tree: SharedTree<H>,
	components: Vec<ComponentRef>,
}

/// Clears `container` and mounts `root` into it.
///
/// Components inside `root` are rendered recursively and are then kept alive by the returned [`Root`],
/// so that their own [`update_state`](`ComponentRef::update_state`) works from event handlers.
///
/// # Errors
///
/// Host errors are returned as-is. The container may be left partially filled.
#[instrument(skip(host, root))]
pub fn render<H: Host + 'static>(host: &H, root: &Node, container: &H::Node) -> Result<Root<H>, H::Error>
where
	H::Error: 'static,
{
	let at = Span::acquire(host, container)?;
	let mut owners = vec![];
	let vnode = flatten(root, &mut vec![], &mut owners);
	let tree = Rc::new(RefCell::new(materialize(host, vnode, at)?));
	let components = adopt(host, &tree, &[], owners);
	info!("Mounted {} component(s).", components.len());
	Ok(Root {
		host: host.clone(),
		tree,
		components,
	})
}

impl<H: Host + 'static> Root<H>
where
	H::Error: 'static,
{
	/// Reconciles the mounted tree against a fresh description.
	///
	/// Components from the previous pass are unmounted, and those in `next` are mounted in their place.
	///
	/// # Errors
	///
	/// Host errors are returned as-is. The previous tree is kept in that case.
	#[instrument(skip(self, next))]
	pub fn update(&mut self, next: &Node) -> Result<(), H::Error> {
		let mut owners = vec![];
		let vnode = flatten(next, &mut vec![], &mut owners);
		let tree = reconcile(&self.host, &*self.tree.borrow(), vnode)?;
		*self.tree.borrow_mut() = tree;
		unmount_all(&self.components);
		self.components = adopt(&self.host, &self.tree, &[], owners);
		Ok(())
	}

	/// The mounted tree, including changes made by components updating themselves.
	///
	/// # Panics
	///
	/// Iff called while a component inside this root is being patched.
	#[must_use]
	pub fn tree(&self) -> Ref<'_, Rendered<H>> {
		self.tree.borrow()
	}

	/// The span the mounted content currently occupies.
	#[must_use]
	pub fn span(&self) -> Span<H::Node> {
		self.tree.borrow().region()
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	/// The components rendered during the last pass, outermost last.
	#[must_use]
	pub fn components(&self) -> &[ComponentRef] {
		&self.components
	}
}
