use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::Window;

use crate::annotator::Annotator;
use crate::canvas::Uniforms;
use crate::config::AnnotatorConfig;
use crate::drawing::Tool;
use crate::event_handler::Key;
use crate::geometry::Point;
use crate::overlay::OverlayManager;
use crate::persistence;
use crate::sheet::{SHEET_COLOR, SheetHost};
use crate::tessellate::GpuPainter;
use crate::vertex::Vertex;

pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub render_pipeline: wgpu::RenderPipeline,
}

pub struct GeometryBuffers {
    pub vertex: Option<wgpu::Buffer>,
    pub index: Option<wgpu::Buffer>,
    pub count: u32,
}

pub struct State {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    pub gpu: GpuContext,
    pub uniforms: Uniforms,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub geometry: GeometryBuffers,

    pub annotator: Annotator,
    pub overlay: OverlayManager<SheetHost>,
    painter: GpuPainter,

    cursor: Option<Point>,
    pointer_inside: bool,
    modifiers: ModifiersState,
    import_path: Option<PathBuf>,
    last_export: Option<PathBuf>,
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Delete => Some(Key::Delete),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::ArrowUp => Some(Key::ArrowUp),
        KeyCode::ArrowDown => Some(Key::ArrowDown),
        KeyCode::ArrowLeft => Some(Key::ArrowLeft),
        KeyCode::ArrowRight => Some(Key::ArrowRight),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

fn tool_for_digit(code: KeyCode) -> Option<Tool> {
    match code {
        KeyCode::Digit1 => Some(Tool::Select),
        KeyCode::Digit2 => Some(Tool::Freehand),
        KeyCode::Digit3 => Some(Tool::Rectangle),
        KeyCode::Digit4 => Some(Tool::Circle),
        KeyCode::Digit5 => Some(Tool::Eraser),
        _ => None,
    }
}

impl State {
    pub async fn new(
        window: Arc<Window>,
        config: AnnotatorConfig,
        import_path: Option<PathBuf>,
    ) -> anyhow::Result<State> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to open graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        let mut uniforms = Uniforms::new();
        uniforms.update_projection((size.width as f32, size.height as f32));

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../data/shaders/draw_shader.wgsl").into(),
            ),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        // Shapes are translucent; no culling since tessellation winding varies.
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let throttle = Duration::from_millis(config.scroll_throttle_ms);
        let host = SheetHost::new((size.width as f64, size.height as f64));
        let mut overlay = OverlayManager::new(host, throttle);
        overlay.attach();

        let mut state = Self {
            window,
            size,
            gpu: GpuContext {
                surface,
                device,
                queue,
                config: surface_config,
                render_pipeline,
            },
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            geometry: GeometryBuffers {
                vertex: None,
                index: None,
                count: 0,
            },
            annotator: Annotator::new(config),
            overlay,
            painter: GpuPainter::new(),
            cursor: None,
            pointer_inside: false,
            modifiers: ModifiersState::empty(),
            import_path,
            last_export: None,
        };

        if state.import_path.is_some() {
            state.import_from_disk();
        }
        Ok(state)
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.gpu.config.width = new_size.width;
        self.gpu.config.height = new_size.height;
        self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);

        self.uniforms
            .update_projection((new_size.width as f32, new_size.height as f32));
        self.gpu.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms]),
        );

        self.overlay
            .host_mut()
            .set_window_size((new_size.width as f64, new_size.height as f64));
        if !self.overlay.attach() {
            return;
        }
        self.overlay.reposition();
    }

    /// Handles the event if it belongs to the annotator. Returns `false` to let
    /// the app handle it.
    pub fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Point::new(position.x, position.y);
                self.cursor = Some(pos);
                self.pointer_moved(pos);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.pointer_inside = false;
                self.annotator.pointer_leave();
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let local = self.cursor.and_then(|p| self.sheet_local(p));
                match (state, local) {
                    (ElementState::Pressed, Some(pos)) => {
                        self.annotator.pointer_down(pos);
                    }
                    (ElementState::Released, Some(pos)) => {
                        self.annotator.pointer_up(pos);
                    }
                    (ElementState::Released, None) => {
                        self.annotator.pointer_leave();
                    }
                    (ElementState::Pressed, None) => {}
                }
                true
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => self.key_pressed(*code),
            _ => false,
        }
    }

    fn sheet_local(&self, window_pos: Point) -> Option<Point> {
        let rect = self.overlay.rect()?;
        rect.contains(window_pos)
            .then(|| Point::new(window_pos.x - rect.left, window_pos.y - rect.top))
    }

    fn pointer_moved(&mut self, window_pos: Point) {
        match self.sheet_local(window_pos) {
            Some(pos) => {
                self.pointer_inside = true;
                self.annotator.pointer_move(pos);
            }
            None if self.pointer_inside => {
                self.pointer_inside = false;
                self.annotator.pointer_leave();
            }
            None => {}
        }
    }

    fn key_pressed(&mut self, code: KeyCode) -> bool {
        let command = self.modifiers.control_key() || self.modifiers.super_key();

        match code {
            KeyCode::KeyZ if command => {
                self.annotator.undo_last();
            }
            KeyCode::KeyS if command => self.export_to_disk(),
            KeyCode::KeyO if command => self.import_from_disk(),
            KeyCode::Delete if command && self.modifiers.shift_key() => {
                self.annotator.clear_all();
                log::info!("Cleared all shapes");
            }
            _ if command => return false,
            _ => {
                if let Some(tool) = tool_for_digit(code) {
                    self.annotator.set_tool(tool);
                    log::info!("Tool: {:?}", tool);
                } else if let Some(key) = map_key(code) {
                    self.annotator.key_down(key);
                } else {
                    return false;
                }
            }
        }
        true
    }

    fn export_to_disk(&mut self) {
        let path = PathBuf::from(persistence::export_file_name(persistence::now_millis()));
        let written = self.annotator.export_json().and_then(|json| {
            std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
        });

        match written {
            Ok(()) => {
                log::info!(
                    "Exported {} shapes to {}",
                    self.annotator.model().len(),
                    path.display()
                );
                self.last_export = Some(path);
            }
            Err(e) => log::error!("Export failed: {:#}", e),
        }
    }

    fn import_from_disk(&mut self) {
        let Some(path) = self.import_path.clone().or_else(|| self.last_export.clone()) else {
            log::warn!("Nothing to import: no file given and nothing exported yet");
            return;
        };

        match std::fs::read_to_string(&path) {
            Ok(json) => {
                // Parse failures are logged by the annotator.
                let _ = self.annotator.import_json(&json);
            }
            Err(e) => log::error!("Failed to read {}: {}", path.display(), e),
        }
    }

    /// Re-tessellates the whole scene; the surface is cleared every frame.
    pub fn update(&mut self) {
        let Some(sheet) = self.overlay.rect() else {
            self.geometry.count = 0;
            return;
        };
        self.painter.set_sheet(sheet, SHEET_COLOR);
        self.annotator.render(&mut self.painter);

        if self.painter.is_empty() {
            self.geometry.vertex = None;
            self.geometry.index = None;
            self.geometry.count = 0;
            return;
        }

        self.geometry.vertex = Some(self.gpu.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.painter.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));

        self.geometry.index = Some(self.gpu.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&self.painter.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));

        self.geometry.count = self.painter.indices.len() as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_shortcuts_cover_every_tool() {
        let tools: Vec<Tool> = [
            KeyCode::Digit1,
            KeyCode::Digit2,
            KeyCode::Digit3,
            KeyCode::Digit4,
            KeyCode::Digit5,
        ]
        .into_iter()
        .filter_map(tool_for_digit)
        .collect();
        assert_eq!(
            tools,
            vec![Tool::Select, Tool::Freehand, Tool::Rectangle, Tool::Circle, Tool::Eraser]
        );
        assert_eq!(tool_for_digit(KeyCode::Digit6), None);
    }

    #[test]
    fn test_editing_keys_map_to_annotator_keys() {
        assert_eq!(map_key(KeyCode::Backspace), Some(Key::Backspace));
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::ArrowLeft));
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Escape));
        assert_eq!(map_key(KeyCode::KeyA), None);
    }
}
