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

pub mod quad;
pub mod triangle;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Point3, SquareMatrix};

use crate::draw_context::{BindingSlot, DrawContext, Uniform};

pub const BIND_GROUP_SCENE: u32 = 0;
pub const BIND_GROUP_MATERIAL: u32 = 1;

/// Normal matrix of `model`: inverse transpose of its rotation part.
///
/// Falls back to identity when the model matrix is singular.
#[must_use]
pub fn normal_matrix(model: Matrix4<f32>) -> Matrix3<f32> {
    let rotation = Matrix3::from_cols(
        model.x.truncate().normalize(),
        model.y.truncate().normalize(),
        model.z.truncate().normalize(),
    );
    rotation
        .invert()
        .map_or_else(Matrix3::identity, |inverse| inverse.transpose())
}

/// Uniforms shared by every variant in bind group 0.
///
/// `normal_matrix` and `camera_position` are only present for shaders that
/// prepare lighting.
pub struct SceneUniforms {
    pub projection: Uniform<[[f32; 4]; 4]>,
    pub view: Uniform<[[f32; 4]; 4]>,
    pub model: Uniform<[[f32; 4]; 4]>,
    pub normal_matrix: Option<Uniform<[[f32; 3]; 3]>>,
    pub camera_position: Option<Uniform<[f32; 3]>>,
}

impl SceneUniforms {
    pub fn new(context: &DrawContext, model: Matrix4<f32>, lighting_ready: bool) -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::identity().into();
        Self {
            projection: Uniform::new(context, identity),
            view: Uniform::new(context, identity),
            model: Uniform::new(context, model.into()),
            normal_matrix: lighting_ready
                .then(|| Uniform::new(context, normal_matrix(model).into())),
            camera_position: lighting_ready.then(|| Uniform::new(context, [0.0; 3])),
        }
    }

    pub fn binding_slots(&self) -> Vec<BindingSlot<'_>> {
        let mut slots = vec![
            BindingSlot {
                bind_group: BIND_GROUP_SCENE,
                binding: 0,
                resource: &self.projection,
            },
            BindingSlot {
                bind_group: BIND_GROUP_SCENE,
                binding: 1,
                resource: &self.view,
            },
            BindingSlot {
                bind_group: BIND_GROUP_SCENE,
                binding: 2,
                resource: &self.model,
            },
        ];
        if let Some(normal_matrix) = &self.normal_matrix {
            slots.push(BindingSlot {
                bind_group: BIND_GROUP_SCENE,
                binding: 3,
                resource: normal_matrix,
            });
        }
        if let Some(camera_position) = &self.camera_position {
            slots.push(BindingSlot {
                bind_group: BIND_GROUP_SCENE,
                binding: 4,
                resource: camera_position,
            });
        }
        slots
    }

    pub fn write_camera(&mut self, projection: Matrix4<f32>, view: Matrix4<f32>, eye: Point3<f32>) {
        self.projection.write_uniform(projection.into());
        self.view.write_uniform(view.into());
        if let Some(camera_position) = &mut self.camera_position {
            camera_position.write_uniform(eye.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, vec3};

    #[test]
    fn normal_matrix_of_translation_is_identity() {
        let model = Matrix4::from_translation(vec3(3.0, -2.0, 7.0));
        assert_eq!(normal_matrix(model), Matrix3::identity());
    }

    #[test]
    fn normal_matrix_ignores_uniform_scale() {
        let rotation = Matrix4::from_angle_y(Deg(30.0));
        let scaled = rotation * Matrix4::from_scale(4.0);
        let expected = normal_matrix(rotation);
        let actual = normal_matrix(scaled);
        for (a, e) in [actual.x, actual.y, actual.z]
            .into_iter()
            .zip([expected.x, expected.y, expected.z])
        {
            assert!((a - e).magnitude() < 1e-5);
        }
    }
}
