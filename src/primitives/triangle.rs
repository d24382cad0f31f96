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

use crate::draw_context::{Mesh, VertexStream};

#[rustfmt::skip]
pub const TRIANGLE_GEOMETRY: &[[f32; 3]] = &[
    [ 0.5,  0.5, 0.0], // top right
    [ 0.5, -0.5, 0.0], // bottom right
    [-0.5,  0.5, 0.0], // top left
];

#[must_use]
pub fn triangle_mesh() -> Mesh<'static> {
    Mesh {
        streams: vec![VertexStream::new(
            0,
            wgpu::VertexFormat::Float32x3,
            TRIANGLE_GEOMETRY,
        )],
        indices: None,
    }
}
