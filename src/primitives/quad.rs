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
pub const QUAD_GEOMETRY: &[[f32; 3]] = &[
    [ 0.5,  0.5, 0.0], // top right
    [ 0.5, -0.5, 0.0], // bottom right
    [-0.5, -0.5, 0.0], // bottom left
    [-0.5,  0.5, 0.0], // top left
];

// Texture rows start at the top, so v grows downwards.
#[rustfmt::skip]
pub const QUAD_TEX_COORDS: &[[f32; 2]] = &[
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [0.0, 0.0],
];

pub const QUAD_NORMALS: &[[f32; 3]] = &[[0.0, 0.0, 1.0]; 4];

#[rustfmt::skip]
pub const QUAD_INDICES: &[u16] = &[
    0, 1, 3,
    1, 2, 3,
];

/// Indexed quad with UVs at location 1 and, optionally, normals at location 2.
#[must_use]
pub fn textured_quad_mesh(with_normals: bool) -> Mesh<'static> {
    let mut streams = vec![
        VertexStream::new(0, wgpu::VertexFormat::Float32x3, QUAD_GEOMETRY),
        VertexStream::new(1, wgpu::VertexFormat::Float32x2, QUAD_TEX_COORDS),
    ];
    if with_normals {
        streams.push(VertexStream::new(
            2,
            wgpu::VertexFormat::Float32x3,
            QUAD_NORMALS,
        ));
    }
    Mesh {
        streams,
        indices: Some(QUAD_INDICES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_cover_every_vertex() {
        assert_eq!(QUAD_GEOMETRY.len(), QUAD_TEX_COORDS.len());
        assert_eq!(QUAD_GEOMETRY.len(), QUAD_NORMALS.len());
    }

    #[test]
    fn indices_form_two_triangles_in_bounds() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(
            QUAD_INDICES
                .iter()
                .all(|&i| usize::from(i) < QUAD_GEOMETRY.len())
        );
    }

    #[test]
    fn tex_coords_stay_in_unit_square() {
        assert!(
            QUAD_TEX_COORDS
                .iter()
                .flatten()
                .all(|c| (0.0..=1.0).contains(c))
        );
    }

    #[test]
    fn mesh_is_drawn_through_indices() -> anyhow::Result<()> {
        assert_eq!(textured_quad_mesh(false).streams.len(), 2);
        let mesh = textured_quad_mesh(true);
        assert_eq!(mesh.streams.len(), 3);
        assert_eq!(mesh.draw_count()?, 6);
        Ok(())
    }
}
