//! Axis-aligned boxes and the swept slab test

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// How the slab test treats an axis the segment does not move along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParallelAxisPolicy {
    /// Starting outside the slab on a motionless axis means no hit
    #[default]
    RejectOutside,
    /// A motionless axis never constrains the hit interval
    ///
    /// Conservative: a segment passing beside a box can still be reported
    /// as hitting it.
    AlwaysOverlap,
}

/// Result of sweeping a segment against a box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Segment parameter where the segment enters the box (may be negative
    /// when the start point is already inside)
    pub t_entry: f32,
    /// Segment parameter where the segment leaves the box
    pub t_exit: f32,
    /// Unit normal of the entered face, opposing the motion
    pub normal: Vec3,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The unit box `[position, position + (1, 1, 1)]`
    pub fn unit_at(position: Vec3) -> Self {
        Self::new(position, position + Vec3::new(1.0, 1.0, 1.0))
    }

    /// Whether `point` lies inside or on the box
    pub fn contains(&self, point: &Vec3) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Sweep the segment `origin .. origin + delta` against this box
    ///
    /// Axes with `|delta| <= parallel_epsilon` are handled per `policy`.
    /// A hit needs `t_entry <= t_exit`, `t_exit >= 0` and `t_entry <= 1`.
    /// A segment that moves on no axis never reports a hit.
    pub fn sweep(
        &self,
        origin: &Vec3,
        delta: &Vec3,
        policy: ParallelAxisPolicy,
        parallel_epsilon: f32,
    ) -> Option<SweepHit> {
        let mut t_entry = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut entry_axis = None;

        for axis in 0..3 {
            let d = delta[axis];
            let p = origin[axis];

            if d.abs() <= parallel_epsilon {
                let outside = p < self.min[axis] || p > self.max[axis];
                if outside && policy == ParallelAxisPolicy::RejectOutside {
                    return None;
                }
                continue;
            }

            let mut t1 = (self.min[axis] - p) / d;
            let mut t2 = (self.max[axis] - p) / d;
            if d < 0.0 {
                std::mem::swap(&mut t1, &mut t2);
            }

            if t1 > t_entry {
                t_entry = t1;
                entry_axis = Some(axis);
            }
            t_exit = t_exit.min(t2);
        }

        let axis = entry_axis?;
        if t_entry > t_exit || t_exit < 0.0 || t_entry > 1.0 {
            return None;
        }

        let mut normal = Vec3::zeros();
        normal[axis] = -delta[axis].signum();
        Some(SweepHit { t_entry, t_exit, normal })
    }
}
