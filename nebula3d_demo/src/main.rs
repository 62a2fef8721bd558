//! Nebula3D demo: a spinning mesh rendered through the Vulkan backend
//!
//! Expects compiled shaders at `assets/shaders/unlit.vert.spv` and
//! `assets/shaders/unlit.frag.spv` relative to the working directory.
//!
//! This binary is the process boundary: unrecoverable renderer faults are
//! logged and converted into a clean exit here, never inside the engine
//! crates.

use nebula_3d_engine::glam::{Mat4, Vec3};
use nebula_3d_engine::gpu_data::CameraData;
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::scene::{RenderInstance, RenderScene};
use nebula_3d_engine::{engine_error, engine_info};
use nebula_3d_engine_renderer_vulkan::{MeshData, NebulaRenderer, RendererConfig, Vertex};
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// A unit cube around the origin (positions, flat normals, per-face UVs)
fn cube_mesh() -> MeshData {
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +Z
        ([0.0, 0.0, 1.0], [
            [-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5],
        ]),
        // -Z
        ([0.0, 0.0, -1.0], [
            [0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5],
        ]),
        // +X
        ([1.0, 0.0, 0.0], [
            [0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5],
        ]),
        // -X
        ([-1.0, 0.0, 0.0], [
            [-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5],
        ]),
        // +Y
        ([0.0, 1.0, 0.0], [
            [-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5],
        ]),
        // -Y
        ([0.0, -1.0, 0.0], [
            [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5],
        ]),
    ];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut mesh = MeshData::default();
    for (normal, corners) in faces {
        let base = mesh.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            mesh.vertices.push(Vertex {
                position: *corner,
                normal,
                uv: *uv,
            });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

struct DemoApp {
    ctx: Arc<EngineContext>,
    window: Option<Arc<Window>>,
    renderer: Option<NebulaRenderer>,
    scene: RenderScene,
    start: Instant,
}

impl DemoApp {
    fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            window: None,
            renderer: None,
            scene: RenderScene::new(),
            start: Instant::now(),
        }
    }

    /// Log the fault and convert it into a clean process exit
    fn fail(&mut self, event_loop: &ActiveEventLoop, what: &str, error: nebula_3d_engine::Error) {
        engine_error!(self.ctx, "nebula3d_demo", "{}: {}", what, error);
        if let Some(renderer) = self.renderer.take() {
            renderer.finalize();
        }
        event_loop.exit();
        std::process::exit(1);
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Nebula3D Demo")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
        ) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                engine_error!(self.ctx, "nebula3d_demo", "Failed to create window: {}", e);
                event_loop.exit();
                std::process::exit(1);
            }
        };

        let extent_window = Arc::clone(&window);
        let renderer = NebulaRenderer::init(
            Arc::clone(&self.ctx),
            window.as_ref(),
            Box::new(move || {
                let size = extent_window.inner_size();
                (size.width, size.height)
            }),
            RendererConfig::default(),
        );

        let mut renderer = match renderer {
            Ok(renderer) => renderer,
            Err(e) => return self.fail(event_loop, "Renderer initialization failed", e),
        };

        let upload = renderer
            .store_mut()
            .create_mesh_from_data("cube", &cube_mesh())
            .map(|_| ());
        if let Err(e) = upload {
            self.renderer = Some(renderer);
            return self.fail(event_loop, "Mesh upload failed", e);
        }

        self.scene
            .add_instance(RenderInstance::new("cube", "default", Mat4::IDENTITY));

        engine_info!(self.ctx, "nebula3d_demo", "Demo ready");
        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(renderer) = self.renderer.take() {
                    renderer.finalize();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let elapsed = self.start.elapsed().as_secs_f32();

                // Orbit the camera around the cube
                let eye = Vec3::new(elapsed.cos() * 3.0, 1.5, elapsed.sin() * 3.0);
                let (width, height) = self
                    .window
                    .as_ref()
                    .map(|w| {
                        let size = w.inner_size();
                        (size.width.max(1), size.height.max(1))
                    })
                    .unwrap_or((1280, 720));
                self.scene.set_camera(CameraData::new(
                    Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y),
                    Mat4::perspective_rh(
                        60_f32.to_radians(),
                        width as f32 / height as f32,
                        0.1,
                        100.0,
                    ),
                    eye,
                ));

                if let Some(spin) = self.scene.instances_mut().first_mut() {
                    spin.transform = Mat4::from_rotation_y(elapsed * 0.7);
                }

                if let Some(renderer) = self.renderer.as_mut() {
                    if let Err(e) = renderer.render(&self.scene) {
                        return self.fail(event_loop, "Frame submission failed", e);
                    }
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    let ctx = Arc::new(EngineContext::new());

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!(ctx, "nebula3d_demo", "Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::new(ctx);
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!(app.ctx, "nebula3d_demo", "Event loop error: {}", e);
        std::process::exit(1);
    }
}
