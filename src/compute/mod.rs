//! Compute-world fields, datasets, and array handles.
//!
//! A [`Field`] pairs a name and an [`Association`] with a type-erased
//! [`ArrayHandle`]. The handle's logical value shape (scalar, fixed-width
//! vector, or nested vector) is fixed at construction; its physical backing is
//! one of the storage strategies in [`handle`].

use smol_str::SmolStr;

use crate::compute::handle::{ArrayHandle, HandleError};

pub mod handle;
pub mod portal;

/// Placeholder cell-set name attached to cell-associated fields.
///
/// The true topology name is not discoverable at this layer, so every cell
/// field carries this fixed name. Callers that need the real name must resolve
/// it through a different channel.
pub const DEFAULT_CELL_SET_NAME: &str = "cells";

/// What a field's values are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Points,
    Cells,
    Other,
}

/// Logical shape of one value in an array handle.
///
/// Vector and nested-vector widths are limited to 2-4 per axis; anything wider
/// is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A bare scalar.
    Scalar,
    /// A fixed-width vector, width 2-4.
    Vector(u8),
    /// A nested vector-of-vectors (outer, inner), each axis 2-4. Components
    /// flatten in row-major order, outer axis first.
    Matrix(u8, u8),
}

impl ValueShape {
    /// Build a vector shape, validating the width.
    pub fn vector(width: u8) -> Result<Self, HandleError> {
        if !(2..=4).contains(&width) {
            return Err(HandleError::UnsupportedWidth {
                width: width as usize,
            });
        }
        Ok(ValueShape::Vector(width))
    }

    /// Build a nested vector shape, validating both widths.
    pub fn matrix(outer: u8, inner: u8) -> Result<Self, HandleError> {
        if !(2..=4).contains(&outer) {
            return Err(HandleError::UnsupportedWidth {
                width: outer as usize,
            });
        }
        if !(2..=4).contains(&inner) {
            return Err(HandleError::UnsupportedWidth {
                width: inner as usize,
            });
        }
        Ok(ValueShape::Matrix(outer, inner))
    }

    /// Check that every axis width is inside the supported range.
    ///
    /// The variants are public, so a shape can be written literally with a
    /// width the `vector`/`matrix` constructors would refuse; handle
    /// construction calls this to close that hole.
    pub fn validate(&self) -> Result<(), HandleError> {
        match *self {
            ValueShape::Scalar => Ok(()),
            ValueShape::Vector(w) => Self::vector(w).map(|_| ()),
            ValueShape::Matrix(o, i) => Self::matrix(o, i).map(|_| ()),
        }
    }

    /// Flattened component count of one value.
    pub const fn component_count(&self) -> usize {
        match self {
            ValueShape::Scalar => 1,
            ValueShape::Vector(w) => *w as usize,
            ValueShape::Matrix(o, i) => (*o as usize) * (*i as usize),
        }
    }
}

/// A named, associated array inside a compute dataset.
#[derive(Debug)]
pub struct Field {
    name: SmolStr,
    association: Association,
    cell_set_name: Option<SmolStr>,
    handle: ArrayHandle,
}

impl Field {
    /// Create a field. Cell-associated fields pick up the placeholder
    /// [`DEFAULT_CELL_SET_NAME`].
    pub fn new(name: impl Into<SmolStr>, association: Association, handle: ArrayHandle) -> Self {
        let cell_set_name = match association {
            Association::Cells => Some(SmolStr::new_static(DEFAULT_CELL_SET_NAME)),
            _ => None,
        };
        Self {
            name: name.into(),
            association,
            cell_set_name,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn association(&self) -> Association {
        self.association
    }

    /// The dataset-scoped cell-set name, present only for cell fields.
    pub fn cell_set_name(&self) -> Option<&str> {
        self.cell_set_name.as_deref()
    }

    pub fn handle(&self) -> &ArrayHandle {
        &self.handle
    }

    /// Consume the field, yielding its handle.
    pub fn into_handle(self) -> ArrayHandle {
        self.handle
    }
}

/// A compute dataset: an ordered field collection plus optional coordinates.
///
/// The coordinate field is the distinguished geometry of the dataset. It is
/// converted through the same array machinery as ordinary fields but is
/// wrapped into a point set rather than inserted as an attribute.
#[derive(Debug, Default)]
pub struct ComputeDataset {
    fields: Vec<Field>,
    coordinates: Option<Field>,
}

impl ComputeDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn set_coordinates(&mut self, field: Field) {
        self.coordinates = Some(field);
    }

    pub fn coordinates(&self) -> Option<&Field> {
        self.coordinates.as_ref()
    }

    /// Split the dataset into its coordinate field and its attribute fields.
    pub fn into_parts(self) -> (Option<Field>, Vec<Field>) {
        (self.coordinates, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_widths_are_bounded() {
        assert!(ValueShape::vector(2).is_ok());
        assert!(ValueShape::vector(4).is_ok());
        for bad in [0u8, 1, 5, 9] {
            let err = match ValueShape::vector(bad) {
                Ok(_) => panic!("expected error for width {bad}"),
                Err(e) => e,
            };
            assert!(matches!(err, HandleError::UnsupportedWidth { .. }));
        }
    }

    #[test]
    fn matrix_flattens_row_major_counts() {
        let shape = ValueShape::matrix(3, 2).unwrap();
        assert_eq!(shape.component_count(), 6);
        assert!(ValueShape::matrix(5, 2).is_err());
        assert!(ValueShape::matrix(2, 5).is_err());
    }

    #[test]
    fn cell_fields_carry_the_placeholder_name() {
        let handle = ArrayHandle::from_vec(ValueShape::Scalar, vec![1.0f64]).unwrap();
        let field = Field::new("t", Association::Cells, handle);
        assert_eq!(field.cell_set_name(), Some(DEFAULT_CELL_SET_NAME));

        let handle = ArrayHandle::from_vec(ValueShape::Scalar, vec![1.0f64]).unwrap();
        let field = Field::new("t", Association::Points, handle);
        assert_eq!(field.cell_set_name(), None);
    }
}
