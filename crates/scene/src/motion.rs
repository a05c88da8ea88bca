use glam::Vec3;
use scenekit_common::{NodeId, Transform};
use serde::{Deserialize, Serialize};

/// Motion expressed as a pure function of elapsed time.
///
/// `sample` never reads the previous frame, so a given `t` always yields the
/// same transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Motion {
    /// `rotation = base + rates * t`, radians per second per axis.
    Spin { rates: Vec3 },
    /// Circle in the XY plane: `x = cos(speed t) * radius`, `y = sin(speed t) * radius`.
    Circle { radius: f32, speed: f32 },
}

impl Motion {
    pub fn spin_y(rate: f32) -> Self {
        Self::Spin {
            rates: Vec3::new(0.0, rate, 0.0),
        }
    }

    pub fn sample(&self, base: &Transform, t: f64) -> Transform {
        let t = t.max(0.0) as f32;
        match *self {
            Self::Spin { rates } => Transform {
                rotation: base.rotation + rates * t,
                ..*base
            },
            Self::Circle { radius, speed } => Transform {
                position: Vec3::new(
                    (speed * t).cos() * radius,
                    (speed * t).sin() * radius,
                    base.position.z,
                ),
                ..*base
            },
        }
    }
}

/// Animated transform channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenProperty {
    RotationX,
    RotationY,
    RotationZ,
    PositionY,
}

impl TweenProperty {
    pub fn read(&self, t: &Transform) -> f32 {
        match self {
            Self::RotationX => t.rotation.x,
            Self::RotationY => t.rotation.y,
            Self::RotationZ => t.rotation.z,
            Self::PositionY => t.position.y,
        }
    }

    pub fn write(&self, t: &mut Transform, value: f32) {
        match self {
            Self::RotationX => t.rotation.x = value,
            Self::RotationY => t.rotation.y = value,
            Self::RotationZ => t.rotation.z = value,
            Self::PositionY => t.position.y = value,
        }
    }
}

/// Interpolates one property of one node from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub node: NodeId,
    pub property: TweenProperty,
    pub from: f32,
    pub to: f32,
    pub start: f64,
    pub duration: f64,
}

impl Tween {
    /// Progress in `[0, 1]` with power-1 ease-out applied.
    pub fn progress(&self, t: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let p = ((t - self.start) / self.duration).clamp(0.0, 1.0) as f32;
        1.0 - (1.0 - p) * (1.0 - p)
    }

    pub fn value_at(&self, t: f64) -> f32 {
        self.from + (self.to - self.from) * self.progress(t)
    }

    pub fn is_finished(&self, t: f64) -> bool {
        t >= self.start + self.duration
    }
}
