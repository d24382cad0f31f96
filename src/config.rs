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

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::warn;

use crate::Dimensions;
use crate::cameras::CameraOptions;

const TRIANGLE_SHADER: &str = include_str!("shaders/triangle.wgsl");
const TEXTURED_QUAD_SHADER: &str = include_str!("shaders/textured_quad.wgsl");
const LIGHTING_READY_SHADER: &str = include_str!("shaders/lighting_ready.wgsl");

/// Which geometry and shader set the playground renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Variant {
    /// A single flat-coloured triangle.
    Triangle,
    /// An indexed quad sampling a texture.
    #[default]
    TexturedQuad,
    /// The textured quad with normals, normal matrix and camera position bound.
    LightingReady,
}

impl Variant {
    #[must_use]
    pub fn builtin_shader(self) -> &'static str {
        match self {
            Self::Triangle => TRIANGLE_SHADER,
            Self::TexturedQuad => TEXTURED_QUAD_SHADER,
            Self::LightingReady => LIGHTING_READY_SHADER,
        }
    }
    #[must_use]
    pub fn is_textured(self) -> bool {
        !matches!(self, Self::Triangle)
    }
    #[must_use]
    pub fn is_lighting_ready(self) -> bool {
        matches!(self, Self::LightingReady)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendChoice {
    #[default]
    All,
    /// OpenGL core profile (or GLES/EGL, depending on the platform).
    Gl,
    Vulkan,
    Metal,
    Dx12,
}

impl BackendChoice {
    #[must_use]
    pub fn backends(self) -> wgpu::Backends {
        match self {
            Self::All => wgpu::Backends::all(),
            Self::Gl => wgpu::Backends::GL,
            Self::Vulkan => wgpu::Backends::VULKAN,
            Self::Metal => wgpu::Backends::METAL,
            Self::Dx12 => wgpu::Backends::DX12,
        }
    }
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "freefly-playground")]
#[command(about = "Free-fly camera rendering playground", long_about = None)]
pub struct PlaygroundConfig {
    #[arg(long, value_enum, default_value_t = Variant::TexturedQuad)]
    pub variant: Variant,

    #[arg(long, default_value_t = PlaygroundConfig::DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    #[arg(long, default_value_t = PlaygroundConfig::DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    #[arg(long, default_value = PlaygroundConfig::DEFAULT_TITLE)]
    pub title: String,

    /// Image sampled by the textured variants; a checkerboard is used otherwise
    #[arg(long)]
    pub texture: Option<PathBuf>,

    /// WGSL file replacing the built-in shader of the variant, with `vtx_main` and `frg_main` entry points
    #[arg(long)]
    pub shader: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = BackendChoice::All)]
    pub backend: BackendChoice,

    /// Camera movement speed, in units per second
    #[arg(long, default_value_t = CameraOptions::default().movement_speed)]
    pub speed: f32,

    /// Mouse sensitivity, in degrees per pixel
    #[arg(long, default_value_t = CameraOptions::default().mouse_sensitivity)]
    pub sensitivity: f32,

    /// Render a single frame offscreen and exit
    #[arg(long)]
    pub headless: bool,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        let camera = CameraOptions::default();
        Self {
            variant: Variant::default(),
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            title: Self::DEFAULT_TITLE.to_owned(),
            texture: None,
            shader: None,
            backend: BackendChoice::default(),
            speed: camera.movement_speed,
            sensitivity: camera.mouse_sensitivity,
            headless: false,
        }
    }
}

impl PlaygroundConfig {
    pub const DEFAULT_WIDTH: u32 = 800;
    pub const DEFAULT_HEIGHT: u32 = 600;
    pub const DEFAULT_TITLE: &'static str = "freefly playground";

    #[must_use]
    pub fn camera_options(&self) -> CameraOptions {
        CameraOptions {
            movement_speed: self.speed,
            mouse_sensitivity: self.sensitivity,
            ..CameraOptions::default()
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Content of the `--shader` file, `None` when unset or unreadable.
    #[must_use]
    pub fn shader_override(&self) -> Option<String> {
        let path = self.shader.as_ref()?;
        std::fs::read_to_string(path)
            .inspect_err(|err| {
                warn!(
                    "Shader {} failed to load, using built-in one: {err}",
                    path.display()
                );
            })
            .ok()
    }
}
