use super::Vector3;
use serde::{Deserialize, Serialize};

/// Simulated time as reported by the simulator, split into seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTime {
    pub sec: i64,
    pub nsec: i32,
}

impl SimTime {
    pub fn new(sec: i64, nsec: i32) -> Self {
        Self { sec, nsec }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 * 1e-9
    }

    /// Seconds elapsed between `earlier` and `self`.
    pub fn seconds_since(&self, earlier: &SimTime) -> f64 {
        (self.sec - earlier.sec) as f64 + (self.nsec - earlier.nsec) as f64 * 1e-9
    }
}

/// One timestamped position sample of a robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSample {
    pub time: SimTime,
    pub position: Vector3,
}

impl StateSample {
    pub fn new(time: SimTime, position: Vector3) -> Self {
        Self { time, position }
    }
}

/// Samples recorded for a single remote evaluation, ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<StateSample>,
}

impl Trajectory {
    pub fn new(samples: Vec<StateSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[StateSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&StateSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&StateSample> {
        self.samples.last()
    }

    /// Simulated seconds between the first and the last sample.
    pub fn elapsed(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.time.seconds_since(&first.time),
            _ => 0.0,
        }
    }

    /// Planar vector from the first to the last sample.
    pub fn displacement(&self) -> Vector3 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => {
                let d = last.position - first.position;
                Vector3::new(d.x, d.y, 0.0)
            }
            _ => Vector3::zero(),
        }
    }

    /// Length of the travelled planar path, summed over consecutive samples.
    pub fn path_length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|pair| (pair[1].position - pair[0].position).planar_norm())
            .sum()
    }

    /// A trajectory is usable when it spans a positive amount of simulated time.
    pub fn is_usable(&self) -> bool {
        self.elapsed() > 0.0
    }
}
