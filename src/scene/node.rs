use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
    foundation::error::VeneerResult,
    scene::element::{Element, ElementId, ElementTree, Listener},
    scene::events::EventQueue,
};

type Update<U> = Box<dyn FnOnce(&mut U)>;

/// Pending state updates requested by nodes; the host drains them into its next snapshot.
pub struct UpdateQueue<U> {
    inner: Rc<RefCell<VecDeque<Update<U>>>>,
}

impl<U> Clone for UpdateQueue<U> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<U> Default for UpdateQueue<U> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<U> UpdateQueue<U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, update: impl FnOnce(&mut U) + 'static) {
        self.inner.borrow_mut().push_back(Box::new(update));
    }

    /// Run queued updates against `state` in request order. Returns how many ran.
    pub fn apply(&self, state: &mut U) -> usize {
        let drained: Vec<Update<U>> = self.inner.borrow_mut().drain(..).collect();
        let n = drained.len();
        for update in drained {
            update(state);
        }
        n
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// Callbacks handed to every node at construction.
pub struct NodeContext<U> {
    pub update: UpdateQueue<U>,
    pub dispatch: EventQueue,
    /// When set, listeners are registered here instead of on the node's own element.
    pub event_target: Option<ElementId>,
}

impl<U> Clone for NodeContext<U> {
    fn clone(&self) -> Self {
        Self {
            update: self.update.clone(),
            dispatch: self.dispatch.clone(),
            event_target: self.event_target,
        }
    }
}

impl<U> NodeContext<U> {
    pub fn new(update: UpdateQueue<U>, dispatch: EventQueue) -> Self {
        Self {
            update,
            dispatch,
            event_target: None,
        }
    }

    pub fn with_event_target(mut self, target: ElementId) -> Self {
        self.event_target = Some(target);
        self
    }
}

/// What a concrete node does: build its element, declare listeners, and redraw itself.
///
/// `S` is the snapshot rendered from; `U` is the host state update callbacks mutate.
pub trait NodeBehavior<S, U> {
    fn create_element(&self, tree: &mut ElementTree) -> VeneerResult<ElementId>;

    fn listeners(&self, _ctx: &NodeContext<U>) -> Vec<(String, Listener)> {
        Vec::new()
    }

    fn render_self(&mut self, state: &S, element: &mut Element) -> VeneerResult<()>;

    fn is_shown(&self, _state: &S) -> bool {
        true
    }
}

struct Child<S, U> {
    node: SceneNode<S, U>,
    attached: bool,
}

/// Retained node with a fixed list of children; only attachment changes between passes.
pub struct SceneNode<S, U> {
    behavior: Box<dyn NodeBehavior<S, U>>,
    element: ElementId,
    children: Vec<Child<S, U>>,
}

impl<S, U> SceneNode<S, U> {
    /// Build the node's element and register its listeners. Children start detached.
    pub fn new(
        tree: &mut ElementTree,
        behavior: impl NodeBehavior<S, U> + 'static,
        ctx: &NodeContext<U>,
        children: Vec<SceneNode<S, U>>,
    ) -> VeneerResult<Self> {
        let element = behavior.create_element(tree)?;
        let target = ctx.event_target.unwrap_or(element);
        for (event_type, handler) in behavior.listeners(ctx) {
            tree.add_shared_listener(target, &event_type, handler);
        }
        Ok(Self {
            behavior: Box::new(behavior),
            element,
            children: children
                .into_iter()
                .map(|node| Child {
                    node,
                    attached: false,
                })
                .collect(),
        })
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&SceneNode<S, U>> {
        self.children.get(index).map(|c| &c.node)
    }

    pub fn is_child_attached(&self, index: usize) -> bool {
        self.children.get(index).is_some_and(|c| c.attached)
    }

    pub fn is_shown(&self, state: &S) -> bool {
        self.behavior.is_shown(state)
    }

    /// Redraw this node, then reconcile children in declaration order.
    ///
    /// Shown children render before anything at this level is attached or detached, so an error
    /// from any child leaves this level's attachment untouched. Hidden children are not rendered.
    pub fn render(&mut self, state: &S, tree: &mut ElementTree) -> VeneerResult<()> {
        self.behavior
            .render_self(state, tree.element_mut(self.element)?)?;

        let shown: Vec<bool> = self
            .children
            .iter()
            .map(|c| c.node.behavior.is_shown(state))
            .collect();

        let results: Vec<VeneerResult<()>> = self
            .children
            .iter_mut()
            .zip(&shown)
            .filter(|(_, show)| **show)
            .map(|(c, _)| c.node.render(state, tree))
            .collect();
        for r in results {
            r?;
        }

        let mut position = 0usize;
        for (child, &show) in self.children.iter_mut().zip(&shown) {
            match (show, child.attached) {
                (true, false) => {
                    tree.insert_child_at(self.element, position, child.node.element)?;
                    child.attached = true;
                }
                (false, true) => {
                    tree.remove_child(self.element, child.node.element)?;
                    child.attached = false;
                }
                _ => {}
            }
            if child.attached {
                position += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
