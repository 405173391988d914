//! Pointer and keyboard handling.
//!
//! Every entry point takes the active tool and tool settings explicitly, so
//! the same settings reach both the live preview and the committed shape.

use crate::drawing::{Shape, ShapeKind, Tool, ToolSettings};
use crate::geometry::{Point, Rect};
use crate::shape_model::ShapeModel;
use crate::state::UserInputState::{Dragging, Drawing, Idle};
use crate::state::{InputState, Repaint};

/// Keys with a binding. Hosts map their native key events onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Option<Key> {
        match key {
            "Delete" => Some(Key::Delete),
            "Backspace" => Some(Key::Backspace),
            "ArrowUp" => Some(Key::ArrowUp),
            "ArrowDown" => Some(Key::ArrowDown),
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            "Escape" | "Esc" => Some(Key::Escape),
            _ => None,
        }
    }
}

impl InputState {
    pub fn pointer_down(
        &mut self,
        model: &mut ShapeModel,
        pos: Point,
        tool: Tool,
        settings: &ToolSettings,
    ) -> Repaint {
        // A release we never saw (e.g. outside the window) still ends the old gesture.
        let mut repaint = if self.state != Idle {
            self.pointer_leave(model, tool, settings)
        } else {
            Repaint::None
        };
        self.last_pos = Some(pos);

        match tool {
            Tool::Select => {
                let hit = model
                    .hit_test(pos, self.limits.hit_tolerance_floor)
                    .map(|shape| (shape.id().clone(), shape.origin()));

                match hit {
                    Some((id, origin)) => {
                        log::debug!("Selected {} at {:?}", id, pos);
                        model.select(Some(id));
                        self.state = Dragging;
                        self.grab_offset = Some((pos.x - origin.x, pos.y - origin.y));
                        Repaint::Full
                    }
                    None if model.selected_id().is_some() => {
                        model.select(None);
                        Repaint::Full
                    }
                    None => repaint,
                }
            }
            Tool::Eraser => {
                let hit = model
                    .hit_test(pos, self.limits.hit_tolerance_floor)
                    .map(|shape| shape.id().clone());

                match hit {
                    Some(id) => {
                        model.remove_by_id(&id);
                        model.select(None);
                        Repaint::Full
                    }
                    None => repaint,
                }
            }
            Tool::Rectangle | Tool::Circle | Tool::Freehand => {
                if model.selected_id().is_some() {
                    model.select(None);
                    repaint = Repaint::Full;
                }

                self.state = Drawing;
                self.drag_start = Some(pos);
                self.current_stroke.clear();

                if tool == Tool::Freehand {
                    self.current_stroke.push(pos);
                    if repaint == Repaint::None {
                        repaint = Repaint::Dot { at: pos };
                    }
                }
                repaint
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        model: &mut ShapeModel,
        pos: Point,
        tool: Tool,
        _settings: &ToolSettings,
    ) -> Repaint {
        self.last_pos = Some(pos);

        match self.state {
            Dragging => {
                let (Some((ox, oy)), Some(origin)) =
                    (self.grab_offset, model.selected().map(Shape::origin))
                else {
                    return Repaint::None;
                };
                let (dx, dy) = origin.delta_to(Point::new(pos.x - ox, pos.y - oy));
                if model.move_selected(dx, dy) {
                    Repaint::Full
                } else {
                    Repaint::None
                }
            }
            Drawing => match tool {
                Tool::Rectangle | Tool::Circle => Repaint::Full,
                Tool::Freehand => {
                    let from = self.current_stroke.last().copied().unwrap_or(pos);
                    self.current_stroke.push(pos);
                    Repaint::Segment { from, to: pos }
                }
                Tool::Select | Tool::Eraser => Repaint::None,
            },
            Idle => Repaint::None,
        }
    }

    pub fn pointer_up(
        &mut self,
        model: &mut ShapeModel,
        pos: Point,
        tool: Tool,
        settings: &ToolSettings,
    ) -> Repaint {
        self.last_pos = Some(pos);

        let repaint = match self.state {
            Dragging => Repaint::None,
            Drawing => {
                if let Some(kind) = self.finish_drawing(pos, tool) {
                    model.add(Shape::new(kind, settings.style()));
                }
                Repaint::Full
            }
            Idle => Repaint::None,
        };

        self.reset();
        repaint
    }

    /// Pointer left the overlay or was released elsewhere: ends the gesture
    /// at the last known position.
    pub fn pointer_leave(
        &mut self,
        model: &mut ShapeModel,
        tool: Tool,
        settings: &ToolSettings,
    ) -> Repaint {
        match (self.state, self.last_pos) {
            (Idle, _) => Repaint::None,
            (_, Some(pos)) => self.pointer_up(model, pos, tool, settings),
            (_, None) => {
                self.reset();
                Repaint::Full
            }
        }
    }

    pub fn key_down(&mut self, model: &mut ShapeModel, key: Key) -> Repaint {
        if key == Key::Escape && self.is_drawing() {
            log::debug!("Discarded in-progress shape");
            self.reset();
            return Repaint::Full;
        }

        let Some(id) = model.selected_id().cloned() else {
            return Repaint::None;
        };

        let step = self.limits.nudge_step;
        match key {
            Key::Delete | Key::Backspace => {
                model.remove_by_id(&id);
                if self.is_dragging() {
                    self.reset();
                }
            }
            Key::ArrowUp => self.nudge(model, 0.0, -step),
            Key::ArrowDown => self.nudge(model, 0.0, step),
            Key::ArrowLeft => self.nudge(model, -step, 0.0),
            Key::ArrowRight => self.nudge(model, step, 0.0),
            Key::Escape => model.select(None),
        }
        Repaint::Full
    }

    fn nudge(&mut self, model: &mut ShapeModel, dx: f64, dy: f64) {
        // Keep an ongoing drag anchored to the nudged position.
        if model.move_selected(dx, dy) && self.is_dragging() {
            if let Some((ox, oy)) = self.grab_offset {
                self.grab_offset = Some((ox - dx, oy - dy));
            }
        }
    }

    /// Geometry of the shape being drawn, for the live preview.
    pub fn preview(&self, tool: Tool) -> Option<ShapeKind> {
        if !self.is_drawing() {
            return None;
        }
        let start = self.drag_start?;
        let current = self.last_pos.unwrap_or(start);

        match tool {
            Tool::Rectangle => {
                let rect = Rect::from_corners(start, current);
                Some(ShapeKind::Rectangle {
                    x: rect.left,
                    y: rect.top,
                    width: rect.width,
                    height: rect.height,
                })
            }
            Tool::Circle => Some(ShapeKind::Circle {
                x: start.x,
                y: start.y,
                radius: start.distance(current),
            }),
            Tool::Freehand => Some(ShapeKind::Freehand {
                points: self.current_stroke.clone(),
            }),
            Tool::Select | Tool::Eraser => None,
        }
    }

    /// Validated geometry for the gesture ending at `end`; `None` when it is
    /// too small (or too short) to keep.
    fn finish_drawing(&mut self, end: Point, tool: Tool) -> Option<ShapeKind> {
        let start = self.drag_start?;
        let min = self.limits.min_shape_size;

        match tool {
            Tool::Rectangle => {
                let rect = Rect::from_corners(start, end);
                (rect.width > min && rect.height > min).then_some(ShapeKind::Rectangle {
                    x: rect.left,
                    y: rect.top,
                    width: rect.width,
                    height: rect.height,
                })
            }
            Tool::Circle => {
                let radius = start.distance(end);
                (radius > min).then_some(ShapeKind::Circle {
                    x: start.x,
                    y: start.y,
                    radius,
                })
            }
            Tool::Freehand => {
                if self.current_stroke.last() != Some(&end) {
                    self.current_stroke.push(end);
                }
                (self.current_stroke.len() >= 2).then(|| ShapeKind::Freehand {
                    points: std::mem::take(&mut self.current_stroke),
                })
            }
            Tool::Select | Tool::Eraser => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnotatorConfig;
    use crate::state::GestureLimits;

    fn setup() -> (InputState, ShapeModel, ToolSettings) {
        (
            InputState::new(GestureLimits::from(&AnnotatorConfig::default())),
            ShapeModel::new(),
            ToolSettings::new("#ff0000", 0.5, 2),
        )
    }

    fn drag(
        input: &mut InputState,
        model: &mut ShapeModel,
        tool: Tool,
        settings: &ToolSettings,
        from: (f64, f64),
        to: (f64, f64),
    ) {
        input.pointer_down(model, Point::new(from.0, from.1), tool, settings);
        input.pointer_move(model, Point::new(to.0, to.1), tool, settings);
        input.pointer_up(model, Point::new(to.0, to.1), tool, settings);
    }

    #[test]
    fn test_rectangle_normalized_in_any_direction() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (100.0, 80.0), (10.0, 10.0));

        assert_eq!(
            model.shapes()[0].kind(),
            &ShapeKind::Rectangle {
                x: 10.0,
                y: 10.0,
                width: 90.0,
                height: 70.0
            }
        );
        assert_eq!(model.shapes()[0].style, settings.style());
    }

    #[test]
    fn test_small_shapes_are_discarded() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (0.0, 0.0), (5.0, 50.0));
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (0.0, 0.0), (50.0, -5.0));
        drag(&mut input, &mut model, Tool::Circle, &settings, (0.0, 0.0), (3.0, 4.0));
        assert!(model.is_empty());

        drag(&mut input, &mut model, Tool::Circle, &settings, (0.0, 0.0), (3.0, 4.1));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_freehand_tap_does_not_commit() {
        let (mut input, mut model, settings) = setup();
        let at = Point::new(4.0, 4.0);
        assert_eq!(
            input.pointer_down(&mut model, at, Tool::Freehand, &settings),
            Repaint::Dot { at }
        );
        input.pointer_up(&mut model, at, Tool::Freehand, &settings);
        assert!(model.is_empty());
        assert_eq!(input.state, Idle);
    }

    #[test]
    fn test_freehand_draws_incremental_segments_and_commits() {
        let (mut input, mut model, settings) = setup();
        let tool = Tool::Freehand;
        input.pointer_down(&mut model, Point::new(0.0, 0.0), tool, &settings);
        let repaint = input.pointer_move(&mut model, Point::new(3.0, 1.0), tool, &settings);
        assert_eq!(
            repaint,
            Repaint::Segment {
                from: Point::new(0.0, 0.0),
                to: Point::new(3.0, 1.0)
            }
        );
        input.pointer_up(&mut model, Point::new(6.0, 2.0), tool, &settings);

        assert_eq!(
            model.shapes()[0].kind(),
            &ShapeKind::Freehand {
                points: vec![Point::new(0.0, 0.0), Point::new(3.0, 1.0), Point::new(6.0, 2.0)]
            }
        );
    }

    #[test]
    fn test_preview_never_enters_model() {
        let (mut input, mut model, settings) = setup();
        input.pointer_down(&mut model, Point::new(10.0, 10.0), Tool::Circle, &settings);
        input.pointer_move(&mut model, Point::new(40.0, 10.0), Tool::Circle, &settings);

        assert_eq!(
            input.preview(Tool::Circle),
            Some(ShapeKind::Circle {
                x: 10.0,
                y: 10.0,
                radius: 30.0
            })
        );
        assert!(model.is_empty());
    }

    #[test]
    fn test_select_drag_keeps_grab_offset() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (10.0, 10.0), (60.0, 60.0));

        input.pointer_down(&mut model, Point::new(20.0, 30.0), Tool::Select, &settings);
        assert!(model.selected().is_some());
        input.pointer_move(&mut model, Point::new(25.0, 32.0), Tool::Select, &settings);
        input.pointer_move(&mut model, Point::new(30.0, 40.0), Tool::Select, &settings);
        input.pointer_up(&mut model, Point::new(30.0, 40.0), Tool::Select, &settings);

        assert_eq!(model.shapes()[0].origin(), Point::new(20.0, 20.0));
        assert!(model.selected().is_some());
    }

    #[test]
    fn test_select_miss_clears_selection() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (10.0, 10.0), (60.0, 60.0));
        input.pointer_down(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);
        input.pointer_up(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);

        let repaint = input.pointer_down(&mut model, Point::new(200.0, 200.0), Tool::Select, &settings);
        assert_eq!(repaint, Repaint::Full);
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_eraser_removes_on_pointer_down() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Circle, &settings, (50.0, 50.0), (70.0, 50.0));
        assert_eq!(model.len(), 1);

        let repaint = input.pointer_down(&mut model, Point::new(55.0, 55.0), Tool::Eraser, &settings);
        assert_eq!(repaint, Repaint::Full);
        assert!(model.is_empty());
    }

    #[test]
    fn test_pointer_leave_commits_at_last_position() {
        let (mut input, mut model, settings) = setup();
        input.pointer_down(&mut model, Point::new(0.0, 0.0), Tool::Rectangle, &settings);
        input.pointer_move(&mut model, Point::new(30.0, 20.0), Tool::Rectangle, &settings);
        input.pointer_leave(&mut model, Tool::Rectangle, &settings);

        assert_eq!(model.len(), 1);
        assert_eq!(input.state, Idle);
        assert_eq!(input.pointer_leave(&mut model, Tool::Rectangle, &settings), Repaint::None);
    }

    #[test]
    fn test_escape_discards_draw_in_progress() {
        let (mut input, mut model, settings) = setup();
        input.pointer_down(&mut model, Point::new(0.0, 0.0), Tool::Rectangle, &settings);
        input.pointer_move(&mut model, Point::new(30.0, 20.0), Tool::Rectangle, &settings);

        assert_eq!(input.key_down(&mut model, Key::Escape), Repaint::Full);
        input.pointer_up(&mut model, Point::new(30.0, 20.0), Tool::Rectangle, &settings);
        assert!(model.is_empty());
    }

    #[test]
    fn test_nudge_during_drag_survives_next_move() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (10.0, 10.0), (60.0, 60.0));

        input.pointer_down(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);
        input.key_down(&mut model, Key::ArrowRight);
        input.key_down(&mut model, Key::ArrowRight);
        input.pointer_move(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);
        input.pointer_up(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);

        assert_eq!(model.shapes()[0].origin(), Point::new(12.0, 10.0));

        input.pointer_down(&mut model, Point::new(22.0, 20.0), Tool::Select, &settings);
        input.pointer_move(&mut model, Point::new(32.0, 25.0), Tool::Select, &settings);
        assert_eq!(model.shapes()[0].origin(), Point::new(22.0, 15.0));
    }

    #[test]
    fn test_keys_need_a_selection() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (10.0, 10.0), (60.0, 60.0));
        assert_eq!(input.key_down(&mut model, Key::Delete), Repaint::None);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_draw_clears_selection_but_tool_switch_does_not() {
        let (mut input, mut model, settings) = setup();
        drag(&mut input, &mut model, Tool::Rectangle, &settings, (10.0, 10.0), (60.0, 60.0));
        input.pointer_down(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);
        input.pointer_up(&mut model, Point::new(20.0, 20.0), Tool::Select, &settings);
        assert!(model.selected().is_some());

        input.pointer_down(&mut model, Point::new(100.0, 100.0), Tool::Circle, &settings);
        assert!(model.selected().is_none());
    }

    #[test]
    fn test_dom_key_names() {
        assert_eq!(Key::from_dom("ArrowLeft"), Some(Key::ArrowLeft));
        assert_eq!(Key::from_dom("Esc"), Some(Key::Escape));
        assert_eq!(Key::from_dom("a"), None);
    }
}
