use span_dom::{
	attributes,
	memory::{Document, Error},
	reconcile::reconcile,
	Callback, Map, Rendered, Span, VNode,
};
use std::{cell::Cell, rc::Rc};

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn mount(document: &Document, vnode: VNode) -> Rendered<Document> {
	init_tracing();
	Span::acquire(document, &document.body()).unwrap().materialize(document, vnode).unwrap()
}

fn text(content: &str) -> VNode {
	VNode::text(content)
}

fn element(tag: &str, children: Vec<VNode>) -> VNode {
	VNode::element(tag, Map::new(), children)
}

fn fragment(children: Vec<VNode>) -> VNode {
	VNode::fragment(None, children)
}

#[test]
fn identical_trees_cause_no_mutations() {
	let document = Document::new();
	let tree = || element("div", vec![element("p", vec![text("a")]), fragment(vec![text("b"), text("c")])]);
	let old = mount(&document, tree());
	let html = document.inner_html(document.body());
	let mutations = document.mutation_count();

	let new = reconcile(&document, &old, tree()).unwrap();
	assert_eq!(document.mutation_count(), mutations);
	assert_eq!(document.inner_html(document.body()), html);
	assert_eq!(new.region(), old.region());
}

#[test]
fn changed_text_keeps_element() {
	let document = Document::new();
	let old = mount(&document, element("div", vec![text("x")]));
	let div = document.children(document.body())[0];

	reconcile(&document, &old, element("div", vec![text("y")])).unwrap();
	assert_eq!(document.children(document.body()), [div]);
	assert_eq!(document.inner_html(document.body()), "<div>y</div>");
}

#[test]
fn changed_text_keeps_siblings() {
	let document = Document::new();
	let old = mount(&document, element("p", vec![text("a"), text("b"), text("c")]));
	let p = document.children(document.body())[0];
	let before = document.children(p);
	let (a, c) = (before[0], before[2]);

	reconcile(&document, &old, element("p", vec![text("a"), text("B"), text("c")])).unwrap();
	let children = document.children(p);
	assert_eq!(children.len(), 3);
	assert_eq!((children[0], children[2]), (a, c));
	assert_eq!(document.text(children[1]).as_deref(), Some("B"));
}

#[test]
fn mismatching_nodes_are_replaced_in_place() {
	let document = Document::new();
	let old = mount(&document, element("div", vec![text("before"), element("em", vec![text("x")]), text("after")]));

	let new = reconcile(&document, &old, element("div", vec![text("before"), element("strong", vec![]), text("after")])).unwrap();
	assert_eq!(document.inner_html(document.body()), "<div>before<strong></strong>after</div>");
	assert_eq!(new.children().len(), 3);
}

#[test]
fn changed_attributes_replace_the_element() {
	let document = Document::new();
	let old = mount(&document, VNode::element("div", attributes([("id", "a")]), vec![]));
	let div = document.children(document.body())[0];

	reconcile(&document, &old, VNode::element("div", attributes([("id", "b")]), vec![])).unwrap();
	let replaced = document.children(document.body())[0];
	assert_ne!(replaced, div);
	assert_eq!(document.attribute(replaced, "id").as_deref(), Some("b"));
	assert!(!document.is_connected(div));
}

#[test]
fn children_grow_and_shrink() {
	let document = Document::new();
	let list = |items: &[&str]| element("ul", items.iter().map(|item| element("li", vec![text(item)])).collect());

	let one = mount(&document, list(&["a"]));
	let ul = document.children(document.body())[0];
	let a = document.children(ul)[0];

	let three = reconcile(&document, &one, list(&["a", "b", "c"])).unwrap();
	assert_eq!(document.inner_html(ul), "<li>a</li><li>b</li><li>c</li>");
	assert_eq!(document.children(ul)[0], a);

	reconcile(&document, &three, list(&["a"])).unwrap();
	assert_eq!(document.inner_html(ul), "<li>a</li>");
	assert_eq!(document.children(ul), [a]);
}

#[test]
fn empty_new_children_leave_old_children_in_place() {
	let document = Document::new();
	let old = mount(&document, element("div", vec![text("x")]));
	let mutations = document.mutation_count();

	let new = reconcile(&document, &old, element("div", vec![])).unwrap();
	assert_eq!(document.mutation_count(), mutations);
	assert_eq!(document.inner_html(document.body()), "<div>x</div>");
	assert!(new.children().is_empty());
}

#[test]
fn appending_to_a_fragment_stays_before_its_siblings() {
	let document = Document::new();
	let old = mount(&document, element("div", vec![fragment(vec![text("a"), text("b")]), text("c")]));

	let new = reconcile(&document, &old, element("div", vec![fragment(vec![text("a"), text("b"), text("d")]), text("c")])).unwrap();
	assert_eq!(document.inner_html(document.body()), "<div>abdc</div>");

	reconcile(&document, &new, element("div", vec![fragment(vec![text("a")]), text("c")])).unwrap();
	assert_eq!(document.inner_html(document.body()), "<div>ac</div>");
}

#[test]
fn empty_fragments_keep_their_position() {
	let document = Document::new();
	let old = mount(&document, element("div", vec![text("a"), fragment(vec![]), text("c")]));
	let div = document.children(document.body())[0];
	assert_eq!(document.children(div).len(), 3);
	assert_eq!(document.inner_html(div), "ac");

	reconcile(&document, &old, element("div", vec![text("a"), fragment(vec![text("b1"), text("b2")]), text("c")])).unwrap();
	assert_eq!(document.inner_html(div), "ab1b2c");
	assert_eq!(document.children(div).len(), 4);
}

#[test]
fn differently_keyed_fragments_are_replaced() {
	let document = Document::new();
	let old = mount(&document, element("div", vec![VNode::fragment(Some("x".to_owned()), vec![text("a"), text("b")]), text("c")]));

	let new = reconcile(&document, &old, element("div", vec![VNode::fragment(Some("y".to_owned()), vec![text("z")]), text("c")])).unwrap();
	assert_eq!(document.inner_html(document.body()), "<div>zc</div>");
	assert_eq!(new.children()[0].children().len(), 1);
}

#[test]
fn class_name_and_listeners() {
	let document = Document::new();
	let clicks = Rc::new(Cell::new(0));
	let on_click = Callback::new({
		let clicks = Rc::clone(&clicks);
		move |_| clicks.set(clicks.get() + 1)
	});

	let mut button = attributes([("className", "primary"), ("id", "go")]);
	button.insert("onClick".to_owned(), on_click.into());
	mount(&document, VNode::element("button", button, vec![text("Go")]));

	let button = document.element_by_id("go").unwrap();
	assert_eq!(document.outer_html(button), "<button class=\"primary\" id=\"go\">Go</button>");
	assert_eq!(document.dispatch(button, "click"), 1);
	assert_eq!(clicks.get(), 1);
}

#[test]
fn host_errors_are_returned() {
	init_tracing();
	let document = Document::new();
	let at = Span::acquire(&document, &document.body()).unwrap();
	let result = at.materialize(&document, VNode::element("button", attributes([("onClick", "alert(1)")]), vec![]));
	assert_eq!(result.err(), Some(Error::NotCallable("click".to_owned())));

	let at = Span::acquire(&document, &document.body()).unwrap();
	let result = at.materialize(&document, element("not a tag", vec![]));
	assert_eq!(result.err(), Some(Error::InvalidTagName("not a tag".to_owned())));
}

#[test]
fn acquire_clears_the_container() {
	let document = Document::new();
	mount(&document, element("div", vec![text("old")]));
	let fresh = mount(&document, text("new"));
	assert_eq!(document.inner_html(document.body()), "new");
	assert_eq!(fresh.region().nodes(&document), document.children(document.body()));
}

#[test]
fn dropped_subtrees_release_their_listeners() {
	let document = Document::new();
	let button = |callback: &Callback| VNode::element("button", attributes([("onClick", callback.clone())]), vec![]);
	let (a, b) = (Callback::new(|_| ()), Callback::new(|_| ()));

	let old = mount(&document, element("div", vec![button(&a), element("p", vec![button(&b)])]));
	assert_eq!(document.listener_count(), 2);

	let kept = reconcile(&document, &old, element("div", vec![button(&a), element("p", vec![button(&b)])])).unwrap();
	assert_eq!(document.listener_count(), 2);

	let replaced = reconcile(&document, &kept, element("div", vec![button(&Callback::new(|_| ())), element("p", vec![button(&b)])])).unwrap();
	assert_eq!(document.listener_count(), 2);

	reconcile(&document, &replaced, element("div", vec![text("x")])).unwrap();
	assert_eq!(document.listener_count(), 0);
	assert_eq!(document.inner_html(document.body()), "<div>x</div>");
}
