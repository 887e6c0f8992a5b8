//! Host-world datasets: named array collections grouped by association.

use super::{ArrayError, HostArray};

/// A collection of named arrays with last-write-wins semantics.
///
/// Arrays are keyed by name within the set; inserting an array whose name is
/// already present replaces the previous entry. Unnamed arrays are always
/// appended.
#[derive(Debug, Default)]
pub struct AttributeSet {
    arrays: Vec<HostArray>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an array, replacing any existing array with the same name.
    pub fn add_array(&mut self, array: HostArray) {
        if let Some(name) = array.name() {
            if let Some(slot) = self.arrays.iter_mut().find(|a| a.name() == Some(name)) {
                *slot = array;
                return;
            }
        }
        self.arrays.push(array);
    }

    /// Look an array up by name.
    pub fn array(&self, name: &str) -> Option<&HostArray> {
        self.arrays.iter().find(|a| a.name() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostArray> {
        self.arrays.iter()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

/// Geometry produced by the reverse conversion: a 3-component coordinate array.
#[derive(Debug, Clone)]
pub struct PointSet {
    points: HostArray,
}

impl PointSet {
    /// Wrap a coordinate array.
    ///
    /// # Errors
    /// Returns [`ArrayError::ComponentMismatch`] unless the array has exactly
    /// three components per tuple.
    pub fn try_new(points: HostArray) -> Result<Self, ArrayError> {
        if points.components() != 3 {
            return Err(ArrayError::ComponentMismatch {
                components: 3,
                len: points.components(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &HostArray {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.tuples()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A host dataset: point and cell attribute sets plus optional geometry.
#[derive(Debug, Default)]
pub struct HostDataset {
    points: Option<PointSet>,
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl HostDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.cell_data
    }

    pub fn points(&self) -> Option<&PointSet> {
        self.points.as_ref()
    }

    pub fn set_points(&mut self, points: PointSet) {
        self.points = Some(points);
    }
}
