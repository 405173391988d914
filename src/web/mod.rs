//! Browser host: a `position: fixed` canvas kept over a page element.

mod canvas2d;
mod dom;
mod files;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlInputElement, KeyboardEvent, PointerEvent};
use web_time::Instant;

use crate::annotator::Annotator;
use crate::config::AnnotatorConfig;
use crate::drawing::{Tool, ToolSettings};
use crate::event_handler::Key;
use crate::geometry::Point;
use crate::overlay::{OverlayManager, Reposition, ScrollAction};
use crate::persistence;
use crate::state::{Repaint, UserInputState};

use dom::DomHost;

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{e:#}"))
}

struct Session {
    annotator: Annotator,
    overlay: OverlayManager<DomHost>,
    scroll_timer: Option<i32>,
}

impl Session {
    fn repaint(&self, repaint: Repaint) {
        if !repaint.is_needed() || !self.overlay.is_attached() {
            return;
        }
        if let Some(mut painter) = self.overlay.host().painter() {
            self.annotator.apply(&mut painter, repaint);
        }
    }

    fn after_reposition(&self, reposition: Reposition) {
        if reposition.needs_repaint() {
            self.repaint(Repaint::Full);
        }
    }

    /// Viewport coordinates to overlay-local ones.
    fn local(&self, event: &PointerEvent) -> Option<Point> {
        let rect = self.overlay.rect()?;
        Some(Point::new(
            event.client_x() as f64 - rect.left,
            event.client_y() as f64 - rect.top,
        ))
    }
}

/// An event listener removed from its target when dropped.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn add(
        target: &EventTarget,
        kind: &'static str,
        capture: bool,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback_and_bool(
            kind,
            callback.as_ref().unchecked_ref(),
            capture,
        )?;
        Ok(Self {
            target: target.clone(),
            kind,
            capture,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

fn is_text_field(event: &Event) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

#[wasm_bindgen]
pub struct WebAnnotator {
    session: Rc<RefCell<Session>>,
    listeners: Vec<Listener>,
    scroll_flush: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl WebAnnotator {
    /// `config_json` is an optional `AnnotatorConfig` document.
    #[wasm_bindgen(constructor)]
    pub fn new(target_id: &str, config_json: Option<String>) -> Result<WebAnnotator, JsValue> {
        let config = match config_json {
            Some(json) => AnnotatorConfig::from_json(&json).map_err(to_js)?,
            None => AnnotatorConfig::default(),
        };
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document"))?;

        let throttle = std::time::Duration::from_millis(config.scroll_throttle_ms);
        let session = Session {
            overlay: OverlayManager::new(DomHost::new(document, target_id), throttle),
            annotator: Annotator::new(config),
            scroll_timer: None,
        };

        Ok(WebAnnotator {
            session: Rc::new(RefCell::new(session)),
            listeners: Vec::new(),
            scroll_flush: None,
        })
    }

    /// Mounts the overlay. Returns `false` if the target element is not in
    /// the document yet.
    pub fn attach(&mut self) -> Result<bool, JsValue> {
        if !self.session.borrow_mut().overlay.attach() {
            return Ok(false);
        }
        if self.listeners.is_empty() {
            self.install_listeners()?;
        }
        self.session.borrow().repaint(Repaint::Full);
        Ok(true)
    }

    /// Removes the overlay and its listeners. Shapes are kept for a later
    /// [`Self::attach`].
    pub fn detach(&mut self) {
        self.listeners.clear();
        let mut session = self.session.borrow_mut();
        if let (Some(timer), Some(window)) = (session.scroll_timer.take(), web_sys::window()) {
            window.clear_timeout_with_handle(timer);
        }
        self.scroll_flush = None;
        session.annotator.pointer_leave();
        session.overlay.detach();
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, name: &str) -> Result<(), JsValue> {
        let tool = Tool::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown tool: {name}")))?;
        let mut session = self.session.borrow_mut();
        let repaint = session.annotator.set_tool(tool);
        session.repaint(repaint);
        log::debug!("Tool set to {:?}", tool);
        Ok(())
    }

    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, color: &str) {
        if crate::color::parse_color(color).is_none() {
            log::warn!("Unrecognized color {:?}, shapes will paint black", color);
        }
        self.update_settings(|s| ToolSettings::new(color, s.opacity, s.stroke_width));
    }

    #[wasm_bindgen(js_name = setOpacity)]
    pub fn set_opacity(&mut self, opacity: f32) {
        self.update_settings(|s| ToolSettings::new(s.color.clone(), opacity, s.stroke_width));
    }

    #[wasm_bindgen(js_name = setStrokeWidth)]
    pub fn set_stroke_width(&mut self, width: u32) {
        self.update_settings(|s| ToolSettings::new(s.color.clone(), s.opacity, width));
    }

    pub fn undo(&mut self) {
        let mut session = self.session.borrow_mut();
        let repaint = session.annotator.undo_last();
        session.repaint(repaint);
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) {
        let mut session = self.session.borrow_mut();
        let repaint = session.annotator.clear_all();
        session.repaint(repaint);
    }

    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        self.session.borrow().annotator.export_json().map_err(to_js)
    }

    /// Replaces all shapes. Returns how many were imported.
    #[wasm_bindgen(js_name = importJson)]
    pub fn import_json(&mut self, json: &str) -> Result<u32, JsValue> {
        let mut session = self.session.borrow_mut();
        let count = session.annotator.import_json(json).map_err(to_js)?;
        session.repaint(Repaint::Full);
        Ok(count as u32)
    }

    #[wasm_bindgen(js_name = downloadJson)]
    pub fn download_json(&self) -> Result<(), JsValue> {
        let session = self.session.borrow();
        let json = session.annotator.export_json().map_err(to_js)?;
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document"))?;
        let name = persistence::export_file_name(persistence::now_millis());
        files::download_json(&document, &json, &name)
    }

    /// Imports the first file picked in `input`. Read or parse failures are
    /// logged and leave the shapes untouched.
    #[wasm_bindgen(js_name = importFile)]
    pub fn import_file(&self, input: &HtmlInputElement) -> Result<(), JsValue> {
        let session = self.session.clone();
        files::read_selected_file(input, move |text| {
            let text = match text {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Import failed: {:#}", e);
                    return;
                }
            };
            let mut session = session.borrow_mut();
            if session.annotator.import_json(&text).is_ok() {
                session.repaint(Repaint::Full);
            }
        })
    }

    #[wasm_bindgen(js_name = shapeCount)]
    pub fn shape_count(&self) -> u32 {
        self.session.borrow().annotator.model().len() as u32
    }
}

impl WebAnnotator {
    fn update_settings(&mut self, f: impl FnOnce(&ToolSettings) -> ToolSettings) {
        let mut session = self.session.borrow_mut();
        let settings = f(session.annotator.settings());
        session.annotator.set_settings(settings);
    }

    fn install_listeners(&mut self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let (canvas, target): (EventTarget, Option<EventTarget>) = {
            let session = self.session.borrow();
            let host = session.overlay.host();
            let canvas = host
                .canvas()
                .ok_or_else(|| JsValue::from_str("Overlay canvas missing"))?;
            (canvas.clone().into(), host.target().map(Into::into))
        };

        let pointer = |kind: &'static str,
                       session: Rc<RefCell<Session>>,
                       handle: fn(&mut Annotator, Point) -> Repaint|
         -> Result<Listener, JsValue> {
            Listener::add(&canvas, kind, false, move |event: Event| {
                let Some(event) = event.dyn_ref::<PointerEvent>() else {
                    return;
                };
                if kind == "pointerdown" {
                    if event.button() != 0 {
                        return;
                    }
                    event.prevent_default();
                }
                let mut session = session.borrow_mut();
                let Some(pos) = session.local(event) else {
                    return;
                };
                let repaint = handle(&mut session.annotator, pos);
                session.repaint(repaint);
            })
        };
        self.listeners
            .push(pointer("pointerdown", self.session.clone(), Annotator::pointer_down)?);
        self.listeners
            .push(pointer("pointermove", self.session.clone(), Annotator::pointer_move)?);
        self.listeners
            .push(pointer("pointerup", self.session.clone(), Annotator::pointer_up)?);

        let session = self.session.clone();
        self.listeners
            .push(Listener::add(&canvas, "pointerleave", false, move |_| {
                let mut session = session.borrow_mut();
                let repaint = session.annotator.pointer_leave();
                session.repaint(repaint);
            })?);

        // Releases outside the canvas still end the gesture.
        let session = self.session.clone();
        self.listeners
            .push(Listener::add(&window, "pointerup", false, move |_| {
                let mut session = session.borrow_mut();
                if session.annotator.input().state != UserInputState::Idle {
                    let repaint = session.annotator.pointer_leave();
                    session.repaint(repaint);
                }
            })?);

        let session = self.session.clone();
        self.listeners
            .push(Listener::add(&window, "keydown", false, move |event: Event| {
                if is_text_field(&event) {
                    return;
                }
                let Some(key) = event
                    .dyn_ref::<KeyboardEvent>()
                    .and_then(|e| Key::from_dom(&e.key()))
                else {
                    return;
                };
                let mut session = session.borrow_mut();
                let repaint = session.annotator.key_down(key);
                if repaint.is_needed() {
                    event.prevent_default();
                    session.repaint(repaint);
                }
            })?);

        let session = self.session.clone();
        self.listeners
            .push(Listener::add(&window, "resize", false, move |_| {
                let mut session = session.borrow_mut();
                let reposition = session.overlay.reposition();
                session.after_reposition(reposition);
            })?);

        let session = self.session.clone();
        let flush = Closure::wrap(Box::new(move || {
            let mut session = session.borrow_mut();
            session.scroll_timer = None;
            if let Some(reposition) = session.overlay.flush_scroll(Instant::now()) {
                session.after_reposition(reposition);
            }
        }) as Box<dyn FnMut()>);
        let flush_fn: js_sys::Function = flush.as_ref().unchecked_ref::<js_sys::Function>().clone();
        self.scroll_flush = Some(flush);

        // Capture phase so scrolling inside nested containers is seen too.
        let session = self.session.clone();
        let timer_window = window.clone();
        self.listeners
            .push(Listener::add(&window, "scroll", true, move |_| {
                let mut session = session.borrow_mut();
                match session.overlay.on_scroll(Instant::now()) {
                    ScrollAction::Repositioned(reposition) => session.after_reposition(reposition),
                    ScrollAction::Deferred { retry_in } => {
                        match timer_window.set_timeout_with_callback_and_timeout_and_arguments_0(
                            &flush_fn,
                            retry_in.as_millis() as i32,
                        ) {
                            Ok(handle) => session.scroll_timer = Some(handle),
                            Err(e) => log::warn!("Failed to schedule scroll flush: {:?}", e),
                        }
                    }
                    ScrollAction::Dropped => {}
                }
            })?);

        // Images report their real size only once loaded.
        if let Some(target) = target {
            let session = self.session.clone();
            self.listeners
                .push(Listener::add(&target, "load", false, move |_| {
                    let mut session = session.borrow_mut();
                    let reposition = session.overlay.reposition();
                    session.after_reposition(reposition);
                })?);
        }

        log::info!("Installed {} overlay listeners", self.listeners.len());
        Ok(())
    }
}

impl Drop for WebAnnotator {
    fn drop(&mut self) {
        self.detach();
    }
}
