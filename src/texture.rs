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

use std::path::Path;

use anyhow::{Context, bail};
use image::{Rgba, RgbaImage};
use log::{info, warn};

use crate::draw_context::{AsBindingResource, BindingSlot, Dimensions, DrawContext};

const PLACEHOLDER_SIZE: u32 = 256;
const PLACEHOLDER_CELL: u32 = 32;
const PLACEHOLDER_LIGHT: Rgba<u8> = Rgba([230, 230, 230, 255]);
const PLACEHOLDER_DARK: Rgba<u8> = Rgba([60, 90, 160, 255]);

/// Sampled RGBA texture living for the whole process.
pub struct Texture2D {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    dimensions: Dimensions,
}

impl Texture2D {
    pub fn from_path(context: &DrawContext, path: &Path) -> anyhow::Result<Self> {
        let image = decode_image(path)?;
        Self::from_image(context, &image)
            .with_context(|| format!("Could not upload {}", path.display()))
    }

    pub fn placeholder(context: &DrawContext) -> anyhow::Result<Self> {
        Self::from_image(
            context,
            &checkerboard_image(PLACEHOLDER_SIZE, PLACEHOLDER_CELL),
        )
    }

    /// Falls back to the placeholder when no path is given or loading fails.
    pub fn load_or_placeholder(context: &DrawContext, path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Self::placeholder(context);
        };
        match Self::from_path(context, path) {
            Ok(texture) => {
                info!(
                    "Loaded texture {} ({}x{})",
                    path.display(),
                    texture.dimensions().width,
                    texture.dimensions().height
                );
                Ok(texture)
            }
            Err(err) => {
                warn!("Texture failed to load: {err:#}");
                Self::placeholder(context)
            }
        }
    }

    pub fn from_image(context: &DrawContext, image: &RgbaImage) -> anyhow::Result<Self> {
        let (width, height) = image.dimensions();
        check_texture_size(width, height, context.max_texture_dimension())?;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Texture 2D"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture 2D Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Ok(Self {
            view,
            sampler,
            dimensions: Dimensions { width, height },
        })
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Texture view at binding 0 and sampler at binding 1 of `bind_group`.
    #[must_use]
    pub fn binding_slots(&self, bind_group: u32) -> [BindingSlot<'_>; 2] {
        [
            BindingSlot {
                bind_group,
                binding: 0,
                resource: &self.view,
            },
            BindingSlot {
                bind_group,
                binding: 1,
                resource: &self.sampler,
            },
        ]
    }
}

/// Rejects sizes the device cannot allocate as a 2D texture.
pub fn check_texture_size(width: u32, height: u32, max_dimension: u32) -> anyhow::Result<()> {
    if width == 0 || height == 0 {
        bail!("Texture size {width}x{height} is empty");
    }
    if width > max_dimension || height > max_dimension {
        bail!("Texture size {width}x{height} exceeds the device limit of {max_dimension}");
    }
    Ok(())
}

pub fn decode_image(path: &Path) -> anyhow::Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("Could not decode {}", path.display()))?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        bail!("Image {} is empty", path.display());
    }
    Ok(image)
}

#[must_use]
pub fn checkerboard_image(size: u32, cell: u32) -> RgbaImage {
    let cell = cell.max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            PLACEHOLDER_LIGHT
        } else {
            PLACEHOLDER_DARK
        }
    })
}

impl AsBindingResource for wgpu::TextureView {
    fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::TextureView(self)
    }
    fn binding_type(&self) -> wgpu::BindingType {
        wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        }
    }
}

impl AsBindingResource for wgpu::Sampler {
    fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Sampler(self)
    }
    fn binding_type(&self) -> wgpu::BindingType {
        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
    }
}
