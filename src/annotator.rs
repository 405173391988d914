use crate::config::AnnotatorConfig;
use crate::drawing::{Tool, ToolSettings};
use crate::event_handler::Key;
use crate::geometry::Point;
use crate::persistence;
use crate::render::{self, Painter, SceneStyle};
use crate::shape_model::ShapeModel;
use crate::state::{GestureLimits, InputState, Repaint};

pub struct Annotator {
    config: AnnotatorConfig,
    scene: SceneStyle,
    model: ShapeModel,
    input: InputState,
    tool: Tool,
    settings: ToolSettings,
}

impl Annotator {
    pub fn new(config: AnnotatorConfig) -> Self {
        Self {
            scene: SceneStyle::from(&config),
            input: InputState::new(GestureLimits::from(&config)),
            settings: config.defaults.clone(),
            model: ShapeModel::new(),
            tool: Tool::default(),
            config,
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn model(&self) -> &ShapeModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut ShapeModel {
        &mut self.model
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switches tools. A gesture still in progress is ended first, as if the
    /// pointer had been released; the selection is left alone.
    pub fn set_tool(&mut self, tool: Tool) -> Repaint {
        let repaint = self
            .input
            .pointer_leave(&mut self.model, self.tool, &self.settings);
        self.tool = tool;
        repaint
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ToolSettings) {
        self.settings = settings.clamped();
    }

    pub fn pointer_down(&mut self, pos: Point) -> Repaint {
        self.input
            .pointer_down(&mut self.model, pos, self.tool, &self.settings)
    }

    pub fn pointer_move(&mut self, pos: Point) -> Repaint {
        self.input
            .pointer_move(&mut self.model, pos, self.tool, &self.settings)
    }

    pub fn pointer_up(&mut self, pos: Point) -> Repaint {
        self.input
            .pointer_up(&mut self.model, pos, self.tool, &self.settings)
    }

    pub fn pointer_leave(&mut self) -> Repaint {
        self.input
            .pointer_leave(&mut self.model, self.tool, &self.settings)
    }

    pub fn key_down(&mut self, key: Key) -> Repaint {
        self.input.key_down(&mut self.model, key)
    }

    pub fn undo_last(&mut self) -> Repaint {
        match self.model.undo_last() {
            Some(_) => Repaint::Full,
            None => Repaint::None,
        }
    }

    pub fn clear_all(&mut self) -> Repaint {
        self.input.reset();
        self.model.clear_all();
        Repaint::Full
    }

    pub fn export_json(&self) -> anyhow::Result<String> {
        persistence::serialize(self.model.shapes())
    }

    /// Replaces the whole collection. On error nothing changes.
    pub fn import_json(&mut self, json: &str) -> anyhow::Result<usize> {
        let shapes = persistence::deserialize(json)
            .inspect_err(|e| log::error!("Import failed: {:#}", e))?;
        let count = shapes.len();
        self.input.reset();
        self.model.replace_all(shapes);
        log::info!("Imported {} shapes", count);
        Ok(count)
    }

    pub fn render<P: Painter + ?Sized>(&self, painter: &mut P) {
        let preview = self.input.preview(self.tool);
        let style = self.settings.style();
        render::render_scene(
            painter,
            &self.model,
            preview.as_ref().map(|kind| (kind, &style)),
            &self.scene,
        );
    }

    // For surfaces that keep their pixels between frames.
    pub fn apply<P: Painter + ?Sized>(&self, painter: &mut P, repaint: Repaint) {
        match repaint {
            Repaint::None => {}
            Repaint::Full => self.render(painter),
            hint => render::paint_incremental(painter, hint, &self.settings.style()),
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(AnnotatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::ShapeKind;

    #[test]
    fn test_failed_import_keeps_collection() {
        let mut annotator = Annotator::default();
        annotator.set_tool(Tool::Circle);
        annotator.pointer_down(Point::new(50.0, 50.0));
        annotator.pointer_up(Point::new(80.0, 50.0));
        assert_eq!(annotator.model().len(), 1);

        assert!(annotator.import_json("{ definitely not json").is_err());
        assert_eq!(annotator.model().len(), 1);
    }

    #[test]
    fn test_import_replaces_instead_of_merging() {
        let mut annotator = Annotator::default();
        annotator.set_tool(Tool::Rectangle);
        annotator.pointer_down(Point::new(0.0, 0.0));
        annotator.pointer_up(Point::new(40.0, 40.0));
        let exported = annotator.export_json().unwrap();

        annotator.pointer_down(Point::new(100.0, 100.0));
        annotator.pointer_up(Point::new(140.0, 140.0));
        assert_eq!(annotator.model().len(), 2);

        assert_eq!(annotator.import_json(&exported).unwrap(), 1);
        assert_eq!(
            annotator.model().shapes()[0].kind(),
            &ShapeKind::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 40.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn test_switching_tool_mid_draw_commits() {
        let mut annotator = Annotator::default();
        annotator.set_tool(Tool::Rectangle);
        annotator.pointer_down(Point::new(0.0, 0.0));
        annotator.pointer_move(Point::new(20.0, 20.0));
        annotator.set_tool(Tool::Select);

        assert_eq!(annotator.model().len(), 1);
        assert!(!annotator.input().is_drawing());
    }

    #[test]
    fn test_settings_reach_commit() {
        let mut annotator = Annotator::default();
        annotator.set_settings(ToolSettings::new("#123456", 0.05, 12));
        annotator.set_tool(Tool::Circle);
        annotator.pointer_down(Point::new(0.0, 0.0));
        annotator.pointer_up(Point::new(10.0, 0.0));

        let style = &annotator.model().shapes()[0].style;
        assert_eq!(style.color, "#123456");
        assert_eq!(style.opacity, 0.1);
        assert_eq!(style.stroke_width, 10);
    }
}
