//! Bounded per-body position history, used only for fading-trail rendering.

use std::collections::VecDeque;

use nalgebra::Vector3;

/// Default number of past positions kept per body.
pub const TRAIL_CAPACITY: usize = 15;

/// Oldest-first history of at most `capacity` positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    points: VecDeque<Vector3<f64>>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append the newest position, evicting the oldest once over capacity.
    pub fn push(&mut self, position: Vector3<f64>) {
        self.points.push_back(position);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Vector3<f64>> + '_ {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Vector3<f64>> {
        self.points.iter().copied().collect()
    }
}

/// One trail per body, index-aligned with the body store.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailBuffer {
    trails: Vec<Trail>,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(bodies: usize, capacity: usize) -> Self {
        Self {
            trails: (0..bodies).map(|_| Trail::new(capacity)).collect(),
            capacity,
        }
    }

    /// Push each body's current position onto its own trail.
    pub fn record<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vector3<f64>>,
    {
        for (trail, p) in self.trails.iter_mut().zip(positions) {
            trail.push(p);
        }
    }

    /// Start an empty trail for a newly added body.
    pub fn extend_one(&mut self) {
        self.trails.push(Trail::new(self.capacity));
    }

    pub fn get(&self, i: usize) -> Option<&Trail> { self.trails.get(i) }
    pub fn len(&self) -> usize { self.trails.len() }
    pub fn is_empty(&self) -> bool { self.trails.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, Trail> { self.trails.iter() }
}

/// Render hint for one trail sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub alpha: f32,
    pub radius: f64,
}

/// Opacity and radius of trail sample `index` out of `len`; older samples
/// (small index) are fainter and thinner.
pub fn trail_sample_style(index: usize, len: usize, body_radius: f64) -> TrailSample {
    if len == 0 {
        return TrailSample { alpha: 0.0, radius: 0.0 };
    }
    let t = index as f64 / len as f64;
    TrailSample {
        alpha: t as f32,
        radius: body_radius * 0.5 * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64) -> Vector3<f64> {
        Vector3::new(x, 0.0, 0.0)
    }

    #[test]
    fn trail_never_exceeds_capacity() {
        let mut trail = Trail::new(TRAIL_CAPACITY);
        for i in 0..100 {
            trail.push(p(i as f64));
            assert!(trail.len() <= TRAIL_CAPACITY);
        }
        assert_eq!(trail.len(), TRAIL_CAPACITY);
    }

    #[test]
    fn trail_evicts_oldest_first() {
        let mut trail = Trail::new(3);
        for i in 0..5 {
            trail.push(p(i as f64));
        }
        let xs: Vec<f64> = trail.iter().map(|v| v.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn buffer_records_per_body_and_extends() {
        let mut buffer = TrailBuffer::new(2, 4);
        buffer.record([p(1.0), p(2.0)]);
        buffer.extend_one();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get(0).unwrap().len(), 1);
        assert_eq!(buffer.get(1).unwrap().to_vec(), vec![p(2.0)]);
        assert!(buffer.get(2).unwrap().is_empty());
    }

    #[test]
    fn sample_style_fades_with_age() {
        let old = trail_sample_style(1, 15, 10.0);
        let new = trail_sample_style(14, 15, 10.0);
        assert!(old.alpha < new.alpha);
        assert!(old.radius < new.radius);
        assert_eq!(trail_sample_style(0, 0, 10.0).alpha, 0.0);
    }
}
