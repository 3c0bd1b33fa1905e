//! Undoable edits over an [`OverlayScene`].
//!
//! Every successful execute or undo announces the resulting state through the scene's event
//! queue (`commit` or `remove`), so the persistence bridge sees undo/redo like any other edit.

use std::collections::BTreeSet;

use crate::{
    foundation::core::{Affine, OverlayId, Transform2D},
    foundation::error::{VeneerError, VeneerResult},
    history::command::Command,
    overlay::model::{Overlay, OverlayDoc},
    scene::store::OverlayScene,
};

fn unknown(id: &OverlayId) -> VeneerError {
    VeneerError::scene(format!("unknown overlay '{id}'"))
}

/// Insert a new overlay (user draw or paste).
#[derive(Clone, Debug)]
pub struct AddOverlay {
    doc: OverlayDoc,
    position: Option<usize>,
}

impl AddOverlay {
    pub fn new(overlay: &Overlay) -> Self {
        Self::from_doc(overlay.to_doc())
    }

    pub fn from_doc(doc: OverlayDoc) -> Self {
        Self {
            doc,
            position: None,
        }
    }

    pub fn id(&self) -> &OverlayId {
        &self.doc.id
    }
}

impl Command<OverlayScene> for AddOverlay {
    fn execute(&mut self, scene: &mut OverlayScene) -> VeneerResult<()> {
        let overlay = Overlay::from_doc(self.doc.clone())?;
        match self.position {
            Some(at) => scene.insert_at(at, overlay)?,
            None => {
                scene.insert(overlay)?;
                self.position = scene.position(&self.doc.id);
            }
        }
        scene.emit_commit(&self.doc.id)
    }

    fn undo(&mut self, scene: &mut OverlayScene) -> VeneerResult<()> {
        let removed = scene.remove(&self.doc.id)?;
        scene.emit_remove(&removed)
    }

    fn description(&self) -> String {
        format!("add overlay '{}'", self.doc.id)
    }
}

/// Delete an overlay; undo restores it at its former position with fresh resources.
#[derive(Clone, Debug)]
pub struct RemoveOverlay {
    id: OverlayId,
    snapshot: Option<(usize, OverlayDoc)>,
}

impl RemoveOverlay {
    pub fn new(id: impl Into<OverlayId>) -> Self {
        Self {
            id: id.into(),
            snapshot: None,
        }
    }
}

impl Command<OverlayScene> for RemoveOverlay {
    fn execute(&mut self, scene: &mut OverlayScene) -> VeneerResult<()> {
        let at = scene.position(&self.id).ok_or_else(|| unknown(&self.id))?;
        let removed = scene.remove(&self.id)?;
        self.snapshot = Some((at, removed.to_doc()));
        scene.emit_remove(&removed)
    }

    fn undo(&mut self, scene: &mut OverlayScene) -> VeneerResult<()> {
        let (at, doc) = self.snapshot.clone().ok_or_else(|| {
            VeneerError::history(format!("remove of '{}' was never executed", self.id))
        })?;
        scene.insert_at(at, Overlay::from_doc(doc)?)?;
        scene.emit_commit(&self.id)
    }

    fn description(&self) -> String {
        format!("remove overlay '{}'", self.id)
    }
}

/// One property value of an overlay, as stored before and after an edit.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayEdit {
    Transform(Transform2D),
    Tags(BTreeSet<String>),
    Field(String),
    Label(String),
}

impl OverlayEdit {
    fn name(&self) -> &'static str {
        match self {
            Self::Transform(_) => "transform",
            Self::Tags(_) => "tags",
            Self::Field(_) => "field",
            Self::Label(_) => "label",
        }
    }

    /// Write `self` into the overlay, returning the value it replaced.
    fn apply(self, scene: &mut OverlayScene, id: &OverlayId) -> VeneerResult<Self> {
        Ok(match self {
            Self::Transform(t) => Self::Transform(scene.set_transform(id, t)?),
            Self::Tags(t) => Self::Tags(scene.set_tags(id, t)?),
            Self::Field(f) => Self::Field(scene.set_field(id, f)?),
            Self::Label(l) => Self::Label(scene.set_label(id, l)?),
        })
    }
}

/// Set one property of an existing overlay to an absolute value.
#[derive(Clone, Debug)]
pub struct EditOverlay {
    id: OverlayId,
    after: OverlayEdit,
    before: Option<OverlayEdit>,
}

impl EditOverlay {
    pub fn new(id: impl Into<OverlayId>, after: OverlayEdit) -> Self {
        Self {
            id: id.into(),
            after,
            before: None,
        }
    }

    pub fn transform(id: impl Into<OverlayId>, transform: Transform2D) -> Self {
        Self::new(id, OverlayEdit::Transform(transform))
    }

    /// Compose `matrix` on top of the overlay's current transform.
    pub fn transform_by(
        scene: &OverlayScene,
        id: &OverlayId,
        matrix: Affine,
    ) -> VeneerResult<Self> {
        let current = scene.get(id).ok_or_else(|| unknown(id))?.transform();
        Ok(Self::transform(id.clone(), current.then(matrix)))
    }

    pub fn tags(id: impl Into<OverlayId>, tags: BTreeSet<String>) -> Self {
        Self::new(id, OverlayEdit::Tags(tags))
    }

    pub fn field(id: impl Into<OverlayId>, field: impl Into<String>) -> Self {
        Self::new(id, OverlayEdit::Field(field.into()))
    }

    pub fn label(id: impl Into<OverlayId>, label: impl Into<String>) -> Self {
        Self::new(id, OverlayEdit::Label(label.into()))
    }
}

impl Command<OverlayScene> for EditOverlay {
    fn execute(&mut self, scene: &mut OverlayScene) -> VeneerResult<()> {
        let prev = self.after.clone().apply(scene, &self.id)?;
        if self.before.is_none() {
            self.before = Some(prev);
        }
        scene.emit_commit(&self.id)
    }

    fn undo(&mut self, scene: &mut OverlayScene) -> VeneerResult<()> {
        let before = self.before.clone().ok_or_else(|| {
            VeneerError::history(format!(
                "{} edit of '{}' was never executed",
                self.after.name(),
                self.id
            ))
        })?;
        before.apply(scene, &self.id)?;
        scene.emit_commit(&self.id)
    }

    fn description(&self) -> String {
        format!("set {} of '{}'", self.after.name(), self.id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/edits.rs"]
mod tests;
