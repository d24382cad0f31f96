/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use cgmath::{Matrix4, SquareMatrix};
use log::{info, trace, warn};
use winit::event::{DeviceEvent, KeyEvent, WindowEvent};

use crate::cameras::{FreeFlyCamera, InteractiveCamera, PerspectiveProjection};
use crate::draw_context::{DrawContext, Drawable};
use crate::primitives::{BIND_GROUP_MATERIAL, SceneUniforms, quad, triangle};
use crate::render_loop::{LaunchContext, RenderContext, RenderLoopHandler};
use crate::texture::Texture2D;

/// Render loop handler owning the camera and the single drawable of a variant.
pub struct Playground {
    camera: InteractiveCamera,
    uniforms: SceneUniforms,
    drawable: Drawable,
}

impl Playground {
    pub fn new(LaunchContext { draw_context, config }: LaunchContext) -> anyhow::Result<Self> {
        let variant = config.variant;
        info!("Starting {variant:?} playground");
        let mut camera = InteractiveCamera::new(
            FreeFlyCamera::new(config.camera_options()),
            PerspectiveProjection::default(),
        );
        camera.update_screen_size(&draw_context.surface_dimensions());
        let uniforms = SceneUniforms::new(
            draw_context,
            Matrix4::identity(),
            variant.is_lighting_ready(),
        );
        let texture = variant
            .is_textured()
            .then(|| Texture2D::load_or_placeholder(draw_context, config.texture.as_deref()))
            .transpose()?;
        let mut binding_slots = uniforms.binding_slots();
        let mesh = match &texture {
            Some(texture) => {
                binding_slots.extend(texture.binding_slots(BIND_GROUP_MATERIAL));
                quad::textured_quad_mesh(variant.is_lighting_ready())
            }
            None => triangle::triangle_mesh(),
        };
        let build = |source: &str| {
            draw_context.validated(|| {
                let shader = draw_context.create_shader_module(source);
                Drawable::new(draw_context, &shader, &mesh, &binding_slots)
            })
        };
        let drawable = match config.shader_override() {
            Some(source) => build(&source).or_else(|err| {
                warn!("Shader override rejected, using built-in one: {err:#}");
                build(variant.builtin_shader())
            })?,
            None => build(variant.builtin_shader())?,
        };
        Ok(Self {
            camera,
            uniforms,
            drawable,
        })
    }

    pub fn boxed(context: LaunchContext) -> anyhow::Result<Box<dyn RenderLoopHandler>> {
        Ok(Box::new(Self::new(context)?))
    }
}

impl RenderLoopHandler for Playground {
    fn on_mouse_event(&mut self, event: &DeviceEvent) {
        self.camera.mouse_event_listener(event);
    }

    fn on_keyboard_event(&mut self, event: &KeyEvent) {
        self.camera.keyboard_event_listener(event);
    }

    fn on_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Focused(false) => self.camera.deactivate(),
            WindowEvent::MouseWheel { delta, .. } => self.camera.scroll_event_listener(delta),
            _ => {}
        }
    }

    fn on_resize(&mut self, draw_context: &DrawContext) {
        self.camera
            .update_screen_size(&draw_context.surface_dimensions());
    }

    fn on_update(&mut self, render_context: &RenderContext) {
        self.camera
            .update_control(render_context.time_info.delta_seconds());
        let camera = self.camera.camera();
        self.uniforms.write_camera(
            self.camera.projection_matrix(),
            self.camera.view_matrix(),
            camera.position(),
        );
        trace!(
            "position: {:?}, yaw: {}, pitch: {}, zoom: {}",
            camera.position(),
            camera.yaw(),
            camera.pitch(),
            camera.zoom()
        );
    }

    fn on_render(
        &mut self,
        _render_context: &RenderContext,
        render_pass: &mut wgpu::RenderPass<'_>,
    ) {
        self.drawable.draw(render_pass);
    }
}
