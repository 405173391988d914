pub mod annotator;
pub mod color;
pub mod config;
pub mod drawing;
pub mod event_handler;
pub mod geometry;
pub mod hit_test;
pub mod overlay;
pub mod persistence;
pub mod render;
pub mod shape_model;
pub mod state;

#[cfg(not(target_arch = "wasm32"))]
mod app;
#[cfg(not(target_arch = "wasm32"))]
mod app_state;
#[cfg(not(target_arch = "wasm32"))]
mod canvas;
#[cfg(not(target_arch = "wasm32"))]
mod math;
#[cfg(not(target_arch = "wasm32"))]
mod renderer;
#[cfg(not(target_arch = "wasm32"))]
pub mod sheet;
#[cfg(not(target_arch = "wasm32"))]
pub mod tessellate;
#[cfg(not(target_arch = "wasm32"))]
pub mod vertex;

#[cfg(target_arch = "wasm32")]
mod web;

// Re-export the main public interface
pub use annotator::Annotator;
pub use config::AnnotatorConfig;
pub use drawing::{Shape, ShapeId, ShapeKind, Tool, ToolSettings};
pub use event_handler::Key;
pub use overlay::{OverlayHost, OverlayManager, Reposition};
pub use render::Painter;
pub use shape_model::ShapeModel;
pub use state::Repaint;

#[cfg(not(target_arch = "wasm32"))]
pub use app::run;
#[cfg(target_arch = "wasm32")]
pub use web::WebAnnotator;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    // Fails only if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);
}
