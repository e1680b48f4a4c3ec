//! Trailing follow camera

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub eye: Vec3,
    pub look_at: Vec3,
}

impl CameraRig {
    /// A camera already in place behind `anchor`
    pub fn snapped(anchor: Vec3, tuning: &Tuning) -> Self {
        let mut rig = Self {
            eye: Vec3::ZERO,
            look_at: Vec3::ZERO,
        };
        rig.snap(anchor, tuning);
        rig
    }

    /// Jump straight to the desired viewpoint (no lerp from a stale spot)
    pub fn snap(&mut self, anchor: Vec3, tuning: &Tuning) {
        self.eye = anchor + tuning.camera_offset;
        self.look_at = look_target(anchor, tuning);
    }

    /// Ease toward the viewpoint for `anchor`
    pub fn update(&mut self, anchor: Vec3, dt: f32, tuning: &Tuning) {
        let desired = anchor + tuning.camera_offset;
        let t = 1.0 - tuning.camera_smoothing.powf(dt * 60.0);
        self.eye = self.eye.lerp(desired, t);
        self.look_at = look_target(anchor, tuning);
    }
}

fn look_target(anchor: Vec3, tuning: &Tuning) -> Vec3 {
    anchor + Vec3::new(0.0, tuning.camera_look_up, tuning.camera_look_ahead)
}
