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

use std::sync::Arc;

use log::{debug, error, info, warn};
use pollster::FutureExt;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::PlaygroundConfig;
use crate::draw_context::{Dimensions, DrawContext};
use crate::render_loop::{LaunchContext, RenderContext, RenderLoopBuilder, RenderLoopHandler, TimeInfo};

struct RunningState {
    draw_context: DrawContext,
    handler: Box<dyn RenderLoopHandler>,
    time_info: TimeInfo,
}

impl RunningState {
    fn redraw(&mut self) -> anyhow::Result<()> {
        self.time_info.tick();
        let render_context = RenderContext {
            time_info: &self.time_info,
            draw_context: &self.draw_context,
        };
        self.handler.on_update(&render_context);
        let handler = &mut self.handler;
        self.draw_context
            .draw_frame(|pass| handler.on_render(&render_context, pass))
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.draw_context.window {
            window.request_redraw();
        }
    }
}

struct App {
    config: PlaygroundConfig,
    builder: Box<RenderLoopBuilder>,
    state: Option<RunningState>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn init_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<RunningState> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        grab_cursor(&window);
        let size = window.inner_size();
        let mut draw_context = DrawContext::new(
            Some(Arc::clone(&window)),
            Dimensions {
                width: size.width,
                height: size.height,
            },
            self.config.backend.backends(),
        )
        .block_on()?;
        let handler = (self.builder)(LaunchContext {
            draw_context: &mut draw_context,
            config: &self.config,
        })?;
        Ok(RunningState {
            draw_context,
            handler,
            time_info: TimeInfo::default(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("Could not grab cursor: {err}");
    }
    window.set_cursor_visible(false);
}

fn release_cursor(window: &Window) {
    if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
        warn!("Could not release cursor: {err}");
    }
    window.set_cursor_visible(true);
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init_state(event_loop) {
            Ok(state) => {
                state.request_redraw();
                self.state = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match &event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                    && key_event.state == ElementState::Pressed
                {
                    info!("Escape pressed, exiting");
                    event_loop.exit();
                } else {
                    state.handler.on_keyboard_event(key_event);
                }
            }
            WindowEvent::Resized(size) => {
                debug!("Resized to {}x{}", size.width, size.height);
                state.draw_context.resize(Dimensions {
                    width: size.width,
                    height: size.height,
                });
                state.handler.on_resize(&state.draw_context);
            }
            WindowEvent::Focused(focused) => {
                if let Some(window) = &state.draw_context.window {
                    if *focused {
                        grab_cursor(window);
                    } else {
                        release_cursor(window);
                    }
                }
                state.handler.on_window_event(&event);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.redraw() {
                    let recoverable = matches!(
                        err.downcast_ref::<wgpu::SurfaceError>(),
                        Some(
                            wgpu::SurfaceError::Lost
                                | wgpu::SurfaceError::Outdated
                                | wgpu::SurfaceError::Timeout
                        )
                    );
                    if recoverable {
                        warn!("Skipping frame: {err}");
                        let dimensions = state.draw_context.surface_dimensions();
                        state.draw_context.resize(dimensions);
                    } else {
                        self.fail(event_loop, err);
                    }
                }
            }
            _ => state.handler.on_window_event(&event),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = self.state.as_mut() {
            state.handler.on_mouse_event(&event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.request_redraw();
        }
    }
}

pub fn run_event_loop(config: PlaygroundConfig, builder: Box<RenderLoopBuilder>) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App {
        config,
        builder,
        state: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;
    app.failure.map_or(Ok(()), Err)
}
