//! Editor application shell
//!
//! Owns the window, the wgpu backend, the imgui overlay and the loaded models,
//! and drives them from winit's event loop. Everything here reports failures
//! with `anyhow`; the library below it uses typed errors.

use anyhow::Context as _;
use cgmath::Vector3;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalSize, LogicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::EditorConfig,
    error::GfxError,
    gfx::{
        camera::{projection, Camera, CameraController},
        drawable::{Drawable, StaticBindingRegistry},
        drawables::{SolidSphere, TestPlane},
        GraphicsContext, RenderEngine,
    },
    scene::{EditSession, Model},
    ui::UiManager,
};

const IMPORT_FAILED_POPUP: &str = "Import failed";
const LIGHT_MARKER_POSITION: Vector3<f32> = Vector3::new(3.0, 4.0, 2.0);

pub struct EditorApp {
    event_loop: Option<EventLoop<()>>,
    state: EditorState,
}

/// Everything that lives for the duration of the event loop
struct EditorState {
    config: EditorConfig,
    pending_imports: Vec<PathBuf>,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    registry: StaticBindingRegistry,
    camera: Camera,
    controller: CameraController,
    models: Vec<Model>,
    selected_model: Option<usize>,
    session: EditSession,
    light_marker: Option<SolidSphere>,
    test_plane: Option<TestPlane>,
    import_errors: Vec<String>,
    import_path: String,
    last_frame: Instant,
}

/// Loop-independent part of the editor UI, borrowed for one frame
struct FrameUi<'a> {
    models: &'a mut [Model],
    selected_model: &'a mut Option<usize>,
    session: &'a mut EditSession,
    camera: &'a mut Camera,
    test_plane: Option<&'a mut TestPlane>,
    import_errors: &'a mut Vec<String>,
    import_path: &'a mut String,
}

impl EditorApp {
    /// Creates the event loop and initialises logging
    ///
    /// `RUST_LOG` overrides the default `info` filter.
    pub fn new(config: EditorConfig) -> anyhow::Result<Self> {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        Ok(Self {
            event_loop: Some(event_loop),
            state: EditorState {
                config,
                pending_imports: Vec::new(),
                window: None,
                render_engine: None,
                ui_manager: None,
                registry: StaticBindingRegistry::new(),
                camera: Camera::new(),
                controller: CameraController::new(),
                models: Vec::new(),
                selected_model: None,
                session: EditSession::default(),
                light_marker: None,
                test_plane: None,
                import_errors: Vec::new(),
                import_path: String::new(),
                last_frame: Instant::now(),
            },
        })
    }

    /// Queues a model to be imported once the GPU is ready
    pub fn add_model(&mut self, path: impl Into<PathBuf>) {
        self.state.pending_imports.push(path.into());
    }

    /// Runs the editor until the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.state)
            .context("Event loop terminated with an error")
    }
}

impl EditorState {
    fn init_graphics(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let PhysicalSize { width, height } = window.inner_size();
        let mut engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.vsync,
        ))?;
        engine.set_projection(projection(
            self.config.fov_y,
            engine.aspect_ratio(),
            self.config.z_near,
            self.config.z_far,
        ));

        let ui_manager = UiManager::new(
            engine.device(),
            engine.queue(),
            engine.surface_format(),
            &window,
            self.config.font_size,
        );

        let mut marker = SolidSphere::new(&mut engine, &mut self.registry, 0.5)?;
        marker.set_position(LIGHT_MARKER_POSITION);
        self.light_marker = Some(marker);

        if let Some((diffuse, normal)) = &self.config.test_plane_maps {
            match TestPlane::new(&mut engine, 6.0, diffuse, normal) {
                Ok(plane) => self.test_plane = Some(plane),
                Err(e) => log::warn!("Test plane disabled: {e}"),
            }
        }

        self.render_engine = Some(engine);
        self.ui_manager = Some(ui_manager);
        self.window = Some(window);
        Ok(())
    }

    /// Imports a model, or queues the failure for the "Import failed" popup
    fn import(&mut self, path: &Path) {
        let Some(engine) = self.render_engine.as_mut() else {
            self.pending_imports.push(path.to_path_buf());
            return;
        };
        let loaded = Model::load(engine, &mut self.registry, path, &self.config.import)
            .with_context(|| format!("Could not import {}", path.display()));
        match loaded {
            Ok(model) => {
                self.models.push(model);
                if self.selected_model.is_none() {
                    self.selected_model = Some(self.models.len() - 1);
                }
            }
            Err(e) => {
                log::error!("{e:#}");
                self.import_errors.push(format!("{e:#}"));
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.controller.update(&mut self.camera, dt);

        match self.render_frame() {
            Ok(Some(path)) => self.import(&path),
            Ok(None) => {}
            Err(e) => match e.downcast_ref::<GfxError>() {
                Some(GfxError::SurfaceLost) => log::warn!("Surface lost, reconfigured"),
                Some(GfxError::OutOfMemory) => {
                    log::error!("Out of GPU memory, exiting");
                    event_loop.exit();
                }
                _ => log::error!("Frame failed: {e:#}"),
            },
        }
    }

    /// Draws the scene and the UI; returns a model path the user asked to import
    fn render_frame(&mut self) -> anyhow::Result<Option<PathBuf>> {
        let (Some(engine), Some(ui_manager), Some(window)) = (
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
            self.window.as_ref(),
        ) else {
            return Ok(None);
        };

        engine.set_camera(self.camera.matrix());
        engine.begin_frame(self.config.clear_color)?;
        if let Some(marker) = &self.light_marker {
            marker.submit(engine)?;
        }
        if let Some(plane) = &self.test_plane {
            plane.submit(engine)?;
        }
        for (index, model) in self.models.iter_mut().enumerate() {
            let session = if self.selected_model == Some(index) {
                self.session
            } else {
                EditSession::default()
            };
            model.draw(engine, &session)?;
        }

        let mut frame_ui = FrameUi {
            models: &mut self.models,
            selected_model: &mut self.selected_model,
            session: &mut self.session,
            camera: &mut self.camera,
            test_plane: self.test_plane.as_mut(),
            import_errors: &mut self.import_errors,
            import_path: &mut self.import_path,
        };
        let mut built = Ok(None);
        ui_manager.update_logic(window, |ui| built = frame_ui.build(ui, engine));

        let mut overlay_drawn = false;
        let presented = engine.end_frame_with_overlay(|device, queue, encoder, view| {
            ui_manager.render_display_only(device, queue, encoder, view);
            overlay_drawn = true;
        });
        if !overlay_drawn {
            ui_manager.discard_frame();
        }
        presented?;
        built
    }
}

impl FrameUi<'_> {
    fn build(&mut self, ui: &imgui::Ui, ctx: &mut dyn GraphicsContext) -> anyhow::Result<Option<PathBuf>> {
        let mut requested = None;
        ui.window("Scene")
            .size([300.0, 260.0], imgui::Condition::FirstUseEver)
            .position([10.0, 420.0], imgui::Condition::FirstUseEver)
            .build(|| {
                for (index, model) in self.models.iter().enumerate() {
                    let selected = *self.selected_model == Some(index);
                    let label = format!("{}##scene{}", model.name(), model.id());
                    if ui.selectable_config(label).selected(selected).build() && !selected {
                        *self.selected_model = Some(index);
                        *self.session = EditSession::default();
                    }
                }
                ui.separator();
                ui.input_text("##import", self.import_path)
                    .hint("path/to/model.obj")
                    .build();
                ui.same_line();
                if ui.button("Import") && !self.import_path.trim().is_empty() {
                    requested = Some(PathBuf::from(self.import_path.trim()));
                }
            });

        if let Some(model) = self.selected_model.and_then(|i| self.models.get_mut(i)) {
            *self.session = model.show_window(ui, ctx, *self.session)?;
        }

        self.camera.spawn_control_window(ui);
        if let Some(plane) = self.test_plane.as_deref_mut() {
            plane.spawn_control_window(ui, ctx)?;
        }

        self.show_import_errors(ui);
        Ok(requested)
    }

    fn show_import_errors(&mut self, ui: &imgui::Ui) {
        let Some(message) = self.import_errors.first().cloned() else {
            return;
        };
        ui.open_popup(IMPORT_FAILED_POPUP);
        if let Some(_popup) = ui
            .modal_popup_config(IMPORT_FAILED_POPUP)
            .always_auto_resize(true)
            .begin_popup()
        {
            ui.text_wrapped(&message);
            ui.separator();
            if ui.button("OK") {
                self.import_errors.remove(0);
                ui.close_current_popup();
            }
        }
    }
}

impl ApplicationHandler for EditorState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_graphics(window) {
            log::error!("Failed to initialise graphics: {e:#}");
            event_loop.exit();
            return;
        }

        for path in std::mem::take(&mut self.pending_imports) {
            self.import(&path);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let captured = self
            .ui_manager
            .as_mut()
            .is_some_and(|ui| ui.handle_window_event(&window, window_id, &event));
        if captured {
            window.request_redraw();
            return;
        }

        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => self.handle_key(event_loop, &key_event),
            WindowEvent::MouseInput { button, state, .. } => {
                self.controller.process_mouse_button(button, state);
                window.set_cursor_visible(!self.controller.is_looking());
            }
            WindowEvent::Focused(false) => self.controller.release_all(),
            WindowEvent::DroppedFile(path) => self.import(&path),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.render_engine.as_mut() {
                    engine.resize(width, height);
                    engine.set_projection(projection(
                        self.config.fov_y,
                        engine.aspect_ratio(),
                        self.config.z_near,
                        self.config.z_far,
                    ));
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.ui_manager.as_ref().is_some_and(|ui| ui.wants_input()) {
            return;
        }
        self.controller.process_device_event(&event, &mut self.camera);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl EditorState {
    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state == ElementState::Pressed && event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
            if self.controller.is_looking() {
                self.controller.release_all();
            } else {
                event_loop.exit();
            }
            return;
        }
        self.controller.process_keyboard_event(event);
    }
}
