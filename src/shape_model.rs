use crate::drawing::{Shape, ShapeId};
use crate::geometry::Point;
use crate::hit_test;

/// The committed shapes in append order plus the current selection.
///
/// Later shapes are drawn on top and win hit-tests. The selection is stored
/// by id and always resolved against the collection, so it can never point
/// at a detached copy.
#[derive(Debug, Default, Clone)]
pub struct ShapeModel {
    shapes: Vec<Shape>,
    selected: Option<ShapeId>,
}

impl ShapeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id() == id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.get(id).is_some()
    }

    pub fn add(&mut self, shape: Shape) {
        log::debug!("Committed {} {}", shape.type_name(), shape.id());
        self.shapes.push(shape);
    }

    pub fn remove_by_id(&mut self, id: &ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|shape| shape.id() == id)?;
        let removed = self.shapes.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        log::debug!("Removed {} {}", removed.type_name(), removed.id());
        Some(removed)
    }

    /// Translates the selected shape; returns `false` when nothing is selected.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        let Some(id) = self.selected.as_ref() else {
            return false;
        };
        match self.shapes.iter_mut().find(|shape| shape.id() == id) {
            Some(shape) => {
                shape.translate(dx, dy);
                true
            }
            None => false,
        }
    }

    pub fn undo_last(&mut self) -> Option<Shape> {
        let removed = self.shapes.pop()?;
        if self.selected.as_ref() == Some(removed.id()) {
            self.selected = None;
        }
        log::debug!("Undid {} {}", removed.type_name(), removed.id());
        Some(removed)
    }

    pub fn clear_all(&mut self) {
        log::debug!("Cleared {} shapes", self.shapes.len());
        self.shapes.clear();
        self.selected = None;
    }

    /// Sets or clears the selection. Ids not in the collection clear it.
    pub fn select(&mut self, id: Option<ShapeId>) {
        self.selected = id.filter(|id| self.contains(id));
    }

    pub fn selected(&self) -> Option<&Shape> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&ShapeId> {
        self.selected.as_ref()
    }

    pub fn hit_test(&self, pos: Point, tolerance_floor: f64) -> Option<&Shape> {
        hit_test::find_topmost(&self.shapes, pos, tolerance_floor).map(|index| &self.shapes[index])
    }

    /// Swaps in a new collection wholesale, dropping the selection.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
        self.selected = None;
    }
}
