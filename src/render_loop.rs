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

use web_time::{Duration, Instant};
use winit::event::{DeviceEvent, KeyEvent, WindowEvent};

use crate::config::PlaygroundConfig;
use crate::draw_context::DrawContext;

pub struct TimeInfo {
    pub init_start: Instant,
    pub last_frame: Instant,
    pub frame_delta: Duration,
}

impl Default for TimeInfo {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            init_start: now,
            last_frame: now,
            frame_delta: Duration::ZERO,
        }
    }
}

impl TimeInfo {
    /// Starts a new frame, measuring the time elapsed since the previous one.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.frame_delta = now.duration_since(self.last_frame);
        self.last_frame = now;
    }
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.frame_delta.as_secs_f32()
    }
}

pub struct RenderContext<'a> {
    pub time_info: &'a TimeInfo,
    pub draw_context: &'a DrawContext,
}

pub struct LaunchContext<'a> {
    pub draw_context: &'a mut DrawContext,
    pub config: &'a PlaygroundConfig,
}

/// Per-frame callbacks, all invoked on the event loop thread.
///
/// Input callbacks run while events are polled, before `on_update` and
/// `on_render` of the next frame.
pub trait RenderLoopHandler {
    fn on_mouse_event(&mut self, _event: &DeviceEvent) {}
    fn on_keyboard_event(&mut self, _event: &KeyEvent) {}
    fn on_window_event(&mut self, _event: &WindowEvent) {}
    fn on_resize(&mut self, _draw_context: &DrawContext) {}
    fn on_update(&mut self, _render_context: &RenderContext) {}
    fn on_render(
        &mut self,
        render_context: &RenderContext,
        render_pass: &mut wgpu::RenderPass<'_>,
    );
}

pub type RenderLoopBuilder =
    dyn Fn(LaunchContext) -> anyhow::Result<Box<dyn RenderLoopHandler>>;
