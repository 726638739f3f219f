//! Output feature points and the fixed-capacity list that collects them.
use crate::orientation::OrientationBin;
use serde::{Deserialize, Serialize};

/// A detected ChESS feature (sub-pixel).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Sub-pixel location in image coordinates (x, y); pixel centers sit at +0.5.
    pub xy: [f32; 2],
    /// Orientation bin, `None` until assigned or when it could not be estimated.
    pub orientation: Option<OrientationBin>,
    /// Slot of this feature in its [`FeatureList`].
    pub index: usize,
    /// Opaque value for downstream consumers; the detector never reads it.
    pub tag: Option<u64>,
}

/// Receiver of localized maxima.
///
/// The suppression stage calls [`allocate`](FeatureSink::allocate) once with
/// the exact number of surviving candidates, then
/// [`append`](FeatureSink::append) for each of them in discovery order.
pub trait FeatureSink {
    /// Prepare storage for exactly `capacity` points. `false` on failure.
    fn allocate(&mut self, capacity: usize) -> bool;
    /// Store one point. `false` if the declared capacity is exhausted.
    fn append(&mut self, xy: [f32; 2]) -> bool;
}

/// Append-only feature buffer with a capacity fixed at allocation time.
#[derive(Clone, Debug, Default)]
pub struct FeatureList {
    capacity: usize,
    points: Vec<Feature>,
}

impl FeatureList {
    /// An allocated, empty list.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut list = Self::default();
        list.allocate(capacity);
        list
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[Feature] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.points.iter()
    }

    /// Positions of all stored features, in insertion order.
    pub fn positions(&self) -> Vec<[f32; 2]> {
        self.points.iter().map(|f| f.xy).collect()
    }

    /// Attach a user tag to the feature in slot `index`.
    pub fn set_tag(&mut self, index: usize, tag: u64) -> bool {
        match self.points.get_mut(index) {
            Some(f) => {
                f.tag = Some(tag);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_orientation(&mut self, index: usize, bin: Option<OrientationBin>) {
        self.points[index].orientation = bin;
    }
}

impl FeatureSink for FeatureList {
    fn allocate(&mut self, capacity: usize) -> bool {
        self.points.clear();
        self.capacity = 0;
        if self.points.try_reserve_exact(capacity).is_err() {
            return false;
        }
        self.capacity = capacity;
        true
    }

    fn append(&mut self, xy: [f32; 2]) -> bool {
        if self.points.len() >= self.capacity {
            return false;
        }
        let index = self.points.len();
        self.points.push(Feature {
            xy,
            orientation: None,
            index,
            tag: None,
        });
        true
    }
}

impl<'a> IntoIterator for &'a FeatureList {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
