use crate::config::AnnotatorConfig;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserInputState {
    #[default]
    Idle,
    Drawing,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Repaint {
    None,
    Full,
    /// Newest freehand segment, drawn over the existing pixels.
    Segment { from: Point, to: Point },
    Dot { at: Point },
}

impl Repaint {
    pub fn is_needed(&self) -> bool {
        !matches!(self, Repaint::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureLimits {
    pub min_shape_size: f64,
    pub hit_tolerance_floor: f64,
    pub nudge_step: f64,
}

impl From<&AnnotatorConfig> for GestureLimits {
    fn from(config: &AnnotatorConfig) -> Self {
        Self {
            min_shape_size: config.min_shape_size,
            hit_tolerance_floor: config.hit_tolerance_floor,
            nudge_step: config.nudge_step,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputState {
    pub state: UserInputState,
    pub limits: GestureLimits,
    pub last_pos: Option<Point>,
    pub drag_start: Option<Point>,
    pub current_stroke: Vec<Point>,
    /// Pointer position minus the dragged shape's origin at grab time.
    pub grab_offset: Option<(f64, f64)>,
}

impl InputState {
    pub fn new(limits: GestureLimits) -> Self {
        Self {
            state: UserInputState::Idle,
            limits,
            last_pos: None,
            drag_start: None,
            current_stroke: Vec::new(),
            grab_offset: None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.state == UserInputState::Drawing
    }

    pub fn is_dragging(&self) -> bool {
        self.state == UserInputState::Dragging
    }

    pub fn reset(&mut self) {
        self.state = UserInputState::Idle;
        self.drag_start = None;
        self.current_stroke.clear();
        self.grab_offset = None;
    }
}
