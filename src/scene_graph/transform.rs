use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

use crate::animation::property::{Axis, PropertyPath, TransformProperty};

/// Local transform of a scene object. Rotation is stored as XYZ Euler angles in
/// radians so individual axes can be animated independently.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,
    scale: Vec3,

    local_matrix: RefCell<Mat4>,
    world_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
    has_changed_since_last_update: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            world_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
            has_changed_since_last_update: Cell::new(true),
        }
    }

    pub fn get_local_matrix(&self) -> Ref<Mat4> {
        if self.local_dirty.get() {
            let matrix = Mat4::from_scale_rotation_translation(
                self.scale,
                self.quaternion(),
                self.translation,
            );

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
            self.invalidate_world();
        }

        self.local_matrix.borrow()
    }

    pub fn get_world_matrix(&self) -> Ref<Mat4> {
        self.world_matrix.borrow()
    }

    pub fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.replace(world_matrix);
        self.world_dirty.set(false);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.invalidate_local();
    }

    pub fn set_rotation_quat(&mut self, rotation: Quat) {
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.set_rotation(Vec3::new(x, y, z));
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate_local();
    }

    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.translation = translation;
        self.rotation = Vec3::new(x, y, z);
        self.scale = scale;
        self.invalidate_local();
    }

    /// Reads one animatable scalar.
    pub fn get(&self, path: PropertyPath) -> f32 {
        let vector = match path.property {
            TransformProperty::Position => self.translation,
            TransformProperty::Rotation => self.rotation,
            TransformProperty::Scale => self.scale,
        };

        match path.axis {
            Axis::X => vector.x,
            Axis::Y => vector.y,
            Axis::Z => vector.z,
        }
    }

    /// Writes one animatable scalar, leaving the other axes untouched.
    pub fn set(&mut self, path: PropertyPath, value: f32) {
        let vector = match path.property {
            TransformProperty::Position => &mut self.translation,
            TransformProperty::Rotation => &mut self.rotation,
            TransformProperty::Scale => &mut self.scale,
        };

        match path.axis {
            Axis::X => vector.x = value,
            Axis::Y => vector.y = value,
            Axis::Z => vector.z = value,
        }

        self.invalidate_local();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn quaternion(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn reset_flags(&self) {
        self.has_changed_since_last_update.set(false);
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed_since_last_update.get()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_one_axis_keeps_the_others() {
        let mut transform = Transform::from_translation(Vec3::new(-6.0, 0.1, 0.0));
        transform.set(PropertyPath::new(TransformProperty::Position, Axis::X), 0.8);

        assert_eq!(transform.translation(), Vec3::new(0.8, 0.1, 0.0));
        assert_eq!(
            transform.get(PropertyPath::new(TransformProperty::Position, Axis::Y)),
            0.1
        );
    }

    #[test]
    fn local_matrix_follows_property_writes() {
        let mut transform = Transform::default();
        let _ = transform.get_local_matrix();
        transform.set(PropertyPath::new(TransformProperty::Position, Axis::Z), 2.0);

        let matrix = *transform.get_local_matrix();
        assert_eq!(matrix.w_axis.z, 2.0);
        assert!(transform.is_world_dirty());
    }

    #[test]
    fn quaternion_round_trips_through_euler_angles() {
        let mut transform = Transform::default();
        let rotation = Quat::from_rotation_y(1.2);
        transform.set_rotation_quat(rotation);

        assert!(transform.quaternion().abs_diff_eq(rotation, 1e-5));
    }
}
