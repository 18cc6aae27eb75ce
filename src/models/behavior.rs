use super::Trajectory;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div};

/// Auxiliary statistics derived from a recorded trajectory.
///
/// Measurements add and divide componentwise so several trials can be averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMeasurements {
    pub displacement: f64,
    pub displacement_velocity: f64,
    pub path_length: f64,
    pub elapsed: f64,
    pub average_height: f64,
}

impl BehaviorMeasurements {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let elapsed = trajectory.elapsed();
        let displacement = trajectory.displacement().planar_norm();
        let samples = trajectory.samples();
        let average_height = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.position.z).sum::<f64>() / samples.len() as f64
        };

        Self {
            displacement,
            displacement_velocity: if elapsed > 0.0 {
                displacement / elapsed
            } else {
                0.0
            },
            path_length: trajectory.path_length(),
            elapsed,
            average_height,
        }
    }
}

impl Add for BehaviorMeasurements {
    type Output = BehaviorMeasurements;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            displacement: self.displacement + rhs.displacement,
            displacement_velocity: self.displacement_velocity + rhs.displacement_velocity,
            path_length: self.path_length + rhs.path_length,
            elapsed: self.elapsed + rhs.elapsed,
            average_height: self.average_height + rhs.average_height,
        }
    }
}

impl Div<f64> for BehaviorMeasurements {
    type Output = BehaviorMeasurements;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            displacement: self.displacement / rhs,
            displacement_velocity: self.displacement_velocity / rhs,
            path_length: self.path_length / rhs,
            elapsed: self.elapsed / rhs,
            average_height: self.average_height / rhs,
        }
    }
}
