use std::{
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use crate::{
    foundation::core::Point,
    foundation::error::{VeneerError, VeneerResult},
};

/// Index of an element in its [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    fn from_index(index: usize) -> VeneerResult<Self> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| VeneerError::scene(format!("element index {index} exceeds u32")))
    }
}

/// Pointer/keyboard event delivered by the host UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiEvent {
    pub event_type: String,
    pub pointer: Option<Point>,
    pub key: Option<String>,
    /// Shift/meta held: selection extends instead of replacing.
    pub additive: bool,
}

impl UiEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, pointer: Point) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// One output element: a tag, string attributes, optional text, ordered children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.remove(name);
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn clear_text(&mut self) {
        self.text = None;
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }
}

/// Shared UI event handler.
pub type Listener = Rc<dyn Fn(&UiEvent)>;

/// Arena of elements standing in for the host UI framework's element tree.
///
/// Elements are never freed; nodes create theirs once and only attach or detach afterwards.
#[derive(Default)]
pub struct ElementTree {
    elements: Vec<Element>,
    listeners: HashMap<(ElementId, String), Vec<Listener>>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, tag: impl Into<String>) -> VeneerResult<ElementId> {
        let id = ElementId::from_index(self.elements.len())?;
        self.elements.push(Element {
            tag: tag.into(),
            ..Element::default()
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    pub fn element(&self, id: ElementId) -> VeneerResult<&Element> {
        self.get(id)
            .ok_or_else(|| VeneerError::scene(format!("unknown element #{}", id.0)))
    }

    pub fn element_mut(&mut self, id: ElementId) -> VeneerResult<&mut Element> {
        self.elements
            .get_mut(id.0 as usize)
            .ok_or_else(|| VeneerError::scene(format!("unknown element #{}", id.0)))
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|e| e.parent.is_some())
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> VeneerResult<()> {
        let at = self.element(parent)?.children.len();
        self.insert_child_at(parent, at, child)
    }

    /// Attach `child` under `parent` at `index` (clamped), moving it from any previous parent.
    pub fn insert_child_at(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> VeneerResult<()> {
        if parent == child || self.is_ancestor(child, parent) {
            return Err(VeneerError::scene(format!(
                "attaching element #{} under #{} would form a cycle",
                child.0, parent.0
            )));
        }
        self.element(child)?;
        self.element(parent)?;
        self.detach(child)?;

        let p = self.element_mut(parent)?;
        let at = index.min(p.children.len());
        p.children.insert(at, child);
        self.element_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns false when it was not a child of `parent`.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> VeneerResult<bool> {
        let p = self.element_mut(parent)?;
        let Some(pos) = p.children.iter().position(|&c| c == child) else {
            return Ok(false);
        };
        p.children.remove(pos);
        self.element_mut(child)?.parent = None;
        Ok(true)
    }

    fn detach(&mut self, child: ElementId) -> VeneerResult<()> {
        if let Some(parent) = self.element(child)?.parent {
            self.remove_child(parent, child)?;
        }
        Ok(())
    }

    fn is_ancestor(&self, candidate: ElementId, of: ElementId) -> bool {
        let mut cur = self.get(of).and_then(|e| e.parent);
        while let Some(id) = cur {
            if id == candidate {
                return true;
            }
            cur = self.get(id).and_then(|e| e.parent);
        }
        false
    }

    pub fn add_listener(
        &mut self,
        element: ElementId,
        event_type: &str,
        handler: impl Fn(&UiEvent) + 'static,
    ) {
        self.add_shared_listener(element, event_type, Rc::new(handler));
    }

    pub(crate) fn add_shared_listener(
        &mut self,
        element: ElementId,
        event_type: &str,
        handler: Listener,
    ) {
        self.listeners
            .entry((element, event_type.to_owned()))
            .or_default()
            .push(handler);
    }

    pub fn listener_count(&self, element: ElementId, event_type: &str) -> usize {
        self.listeners
            .get(&(element, event_type.to_owned()))
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to `target`, bubbling to the nearest ancestor with a listener.
    ///
    /// Returns the element whose listeners ran.
    pub fn dispatch_ui_event(&self, target: ElementId, event: &UiEvent) -> Option<ElementId> {
        let mut cur = Some(target);
        while let Some(id) = cur {
            if let Some(handlers) = self.listeners.get(&(id, event.event_type.clone())) {
                for h in handlers {
                    h(event);
                }
                return Some(id);
            }
            cur = self.get(id).and_then(|e| e.parent);
        }
        None
    }
}
