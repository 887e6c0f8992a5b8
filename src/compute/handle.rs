//! Type-erased array handles and their storage strategies.
//!
//! An [`ArrayHandle`] is logically a sequence of values of a fixed
//! [`ValueShape`]; physically it is backed by exactly one [`TypedStorage`]
//! strategy, discriminated at runtime:
//!
//! - [`TypedStorage::Owned`]: a contiguous owned buffer that supports a
//!   destructive "take" for ownership hand-off to the host world.
//! - [`TypedStorage::HostView`]: a zero-copy view over memory a
//!   [`HostArray`] already owns, tagged with that array's physical layout.
//! - [`TypedStorage::Virtual`]: a polymorphic or computed portal that must be
//!   resolved before concrete handling.
//!
//! The erased handle carries its element tag and shape; the typed form behind
//! it is recovered by a checked downcast keyed on the tag. Both halves of the
//! type/strategy dispatch are therefore closed: an unmatched combination is an
//! explicit error, never a silently skipped path.

use std::any::Any;

use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::compute::ValueShape;
use crate::compute::portal::Portal;
use crate::dtype::{Scalar, ScalarType};
use crate::host::{ArrayError, HostArray};

/// Errors returned by handle construction and value access.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The requested element type does not match the handle's runtime tag.
    #[error("element type mismatch: handle holds {actual}, requested {requested}")]
    TypeMismatch {
        actual: ScalarType,
        requested: ScalarType,
    },
    /// A vector or nested-vector width outside the supported 2-4 range.
    #[error("unsupported value width {width} (supported widths are 2-4)")]
    UnsupportedWidth { width: usize },
    /// The flat element count is not a multiple of the value shape's width.
    #[error("{len} elements do not divide into values of {components} components")]
    WrongElementCount { components: usize, len: usize },
    /// The owned buffer was already taken; the handle holds no data.
    #[error("owned storage is empty: its buffer was already taken")]
    Empty,
    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// Owned-basic storage: a contiguous buffer with a destructive take.
///
/// After [`OwnedBuffer::take`] the storage is observably empty; any further
/// data access fails with [`HandleError::Empty`] instead of reading freed or
/// stale memory.
#[derive(Debug)]
pub struct OwnedBuffer<T: Scalar> {
    values: Option<Vec<T>>,
}

impl<T: Scalar> OwnedBuffer<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values: Some(values),
        }
    }

    /// Yield the buffer, leaving the storage empty.
    pub fn take(&mut self) -> Option<Vec<T>> {
        self.values.take()
    }

    /// Whether the buffer has been taken.
    pub fn is_taken(&self) -> bool {
        self.values.is_none()
    }

    /// The flat element slice, if the buffer is still present.
    pub fn as_slice(&self) -> Option<&[T]> {
        self.values.as_deref()
    }
}

/// Storage strategy backing a typed handle.
pub(crate) enum TypedStorage<T: Scalar> {
    Owned(OwnedBuffer<T>),
    HostView(HostArray),
    Virtual(Box<dyn Portal<T>>),
}

impl<T: Scalar> std::fmt::Debug for TypedStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedStorage::Owned(b) => f.debug_tuple("Owned").field(b).finish(),
            TypedStorage::HostView(a) => f.debug_tuple("HostView").field(a).finish(),
            TypedStorage::Virtual(_) => f.debug_tuple("Virtual").finish(),
        }
    }
}

/// The typed form of an array handle.
#[derive(Debug)]
pub(crate) struct TypedHandle<T: Scalar> {
    pub(crate) shape: ValueShape,
    pub(crate) storage: TypedStorage<T>,
}

impl<T: Scalar> TypedHandle<T> {
    /// Logical number of values.
    fn len(&self) -> usize {
        match &self.storage {
            TypedStorage::Owned(buffer) => match buffer.as_slice() {
                Some(slice) => slice.len() / self.shape.component_count(),
                None => 0,
            },
            TypedStorage::HostView(array) => array.tuples(),
            TypedStorage::Virtual(portal) => portal.len(),
        }
    }
}

/// Object-safe face of [`TypedHandle`], keyed by the runtime element tag.
trait ErasedHandle: Send + Sync + std::fmt::Debug {
    fn scalar_type(&self) -> ScalarType;
    fn value_shape(&self) -> ValueShape;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Scalar> ErasedHandle for TypedHandle<T> {
    fn scalar_type(&self) -> ScalarType {
        T::TYPE
    }

    fn value_shape(&self) -> ValueShape {
        self.shape
    }

    fn len(&self) -> usize {
        TypedHandle::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A type-erased array handle.
///
/// The element type and storage strategy are known only at runtime; consumers
/// recover the typed form through the checked downcasts on this wrapper.
#[derive(Debug)]
pub struct ArrayHandle {
    inner: Box<dyn ErasedHandle>,
}

impl ArrayHandle {
    /// Create an owned-basic handle over a flat element vector.
    ///
    /// # Errors
    /// Returns [`HandleError::WrongElementCount`] if `values.len()` is not a
    /// multiple of the shape's component count.
    pub fn from_vec<T: Scalar>(shape: ValueShape, values: Vec<T>) -> Result<Self, HandleError> {
        Self::from_owned(shape, OwnedBuffer::new(values))
    }

    /// Create an owned-basic handle over an existing owned storage.
    pub fn from_owned<T: Scalar>(
        shape: ValueShape,
        buffer: OwnedBuffer<T>,
    ) -> Result<Self, HandleError> {
        shape.validate()?;
        if let Some(slice) = buffer.as_slice() {
            let components = shape.component_count();
            if slice.len() % components != 0 {
                return Err(HandleError::WrongElementCount {
                    components,
                    len: slice.len(),
                });
            }
        }
        Ok(Self::from_typed(TypedHandle {
            shape,
            storage: TypedStorage::Owned(buffer),
        }))
    }

    /// Create a handle over a virtual (polymorphic or computed) portal.
    pub fn from_portal<T: Scalar>(
        shape: ValueShape,
        portal: Box<dyn Portal<T>>,
    ) -> Result<Self, HandleError> {
        shape.validate()?;
        Ok(Self::from_typed(TypedHandle {
            shape,
            storage: TypedStorage::Virtual(portal),
        }))
    }

    /// Create a zero-copy view handle over host memory.
    ///
    /// The array is not copied; the handle shares its buffer and remembers its
    /// physical layout so the reverse conversion can alias it back.
    pub(crate) fn host_view<T: Scalar>(
        shape: ValueShape,
        array: HostArray,
    ) -> Result<Self, HandleError> {
        shape.validate()?;
        // Validates the tag, alignment and byte length up front.
        array.typed::<T>()?;
        if array.components() != shape.component_count() {
            return Err(HandleError::WrongElementCount {
                components: shape.component_count(),
                len: array.components(),
            });
        }
        Ok(Self::from_typed(TypedHandle {
            shape,
            storage: TypedStorage::<T>::HostView(array),
        }))
    }

    pub(crate) fn from_typed<T: Scalar>(handle: TypedHandle<T>) -> Self {
        Self {
            inner: Box::new(handle),
        }
    }

    /// Runtime element type tag.
    pub fn scalar_type(&self) -> ScalarType {
        self.inner.scalar_type()
    }

    /// Logical value shape.
    pub fn value_shape(&self) -> ValueShape {
        self.inner.value_shape()
    }

    /// Logical number of values.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read every value, flattened to components, through the handle's read
    /// portal.
    ///
    /// This never transfers ownership; it is the non-destructive counterpart
    /// of materialization, used for inspection and for storages that cannot
    /// relinquish a pointer.
    ///
    /// # Errors
    /// Returns [`HandleError::TypeMismatch`] when `T` is not the handle's
    /// element type, and [`HandleError::Empty`] when the owned buffer was
    /// already taken.
    pub fn read_all<T: Scalar>(&self) -> Result<Vec<T>, HandleError> {
        let typed = self
            .inner
            .as_any()
            .downcast_ref::<TypedHandle<T>>()
            .ok_or(HandleError::TypeMismatch {
                actual: self.scalar_type(),
                requested: T::TYPE,
            })?;
        let components = typed.shape.component_count();
        match &typed.storage {
            TypedStorage::Owned(buffer) => {
                buffer.as_slice().map(<[T]>::to_vec).ok_or(HandleError::Empty)
            }
            TypedStorage::HostView(array) => {
                let mut out = Vec::with_capacity(array.tuples() * components);
                let mut scratch: SmallVec<[T; 4]> = smallvec![T::default(); components];
                for tuple in 0..array.tuples() {
                    array.read_tuple(tuple, &mut scratch)?;
                    out.extend_from_slice(&scratch);
                }
                Ok(out)
            }
            TypedStorage::Virtual(portal) => {
                let mut out = vec![T::default(); portal.len() * components];
                for (value, chunk) in out.chunks_exact_mut(components).enumerate() {
                    portal.read(value, chunk);
                }
                Ok(out)
            }
        }
    }

    /// Recover the typed handle behind the erased one.
    ///
    /// Fails (returning `None`) only if `T` does not match the runtime tag.
    pub(crate) fn into_typed<T: Scalar>(self) -> Option<TypedHandle<T>> {
        self.inner
            .into_any()
            .downcast::<TypedHandle<T>>()
            .ok()
            .map(|boxed| *boxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::portal::UniformPoints;

    #[test]
    fn from_vec_rejects_indivisible_lengths() {
        let shape = ValueShape::vector(3).unwrap();
        let err = match ArrayHandle::from_vec(shape, vec![0.0f32; 7]) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, HandleError::WrongElementCount { .. }));
    }

    #[test]
    fn owned_handle_reports_shape_and_length() {
        let shape = ValueShape::vector(2).unwrap();
        let handle = ArrayHandle::from_vec(shape, vec![1i16, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(handle.scalar_type(), ScalarType::I16);
        assert_eq!(handle.value_shape(), shape);
        assert_eq!(handle.len(), 3);
        assert_eq!(handle.read_all::<i16>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn read_all_rejects_the_wrong_type() {
        let handle = ArrayHandle::from_vec(ValueShape::Scalar, vec![1u32, 2]).unwrap();
        let err = match handle.read_all::<f64>() {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        match err {
            HandleError::TypeMismatch { actual, requested } => {
                assert_eq!(actual, ScalarType::U32);
                assert_eq!(requested, ScalarType::F64);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn taken_buffer_is_observably_empty() {
        let mut buffer = OwnedBuffer::new(vec![1.0f64, 2.0]);
        assert!(!buffer.is_taken());
        let values = buffer.take().unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
        assert!(buffer.is_taken());
        assert!(buffer.take().is_none());

        let handle = ArrayHandle::from_owned(ValueShape::Scalar, buffer).unwrap();
        assert_eq!(handle.len(), 0);
        let err = match handle.read_all::<f64>() {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, HandleError::Empty));
    }

    #[test]
    fn virtual_handle_reads_through_the_portal() {
        let portal = UniformPoints::new([2, 1, 1], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let handle =
            ArrayHandle::from_portal(ValueShape::vector(3).unwrap(), Box::new(portal)).unwrap();
        assert_eq!(handle.len(), 2);
        let values = handle.read_all::<f64>().unwrap();
        assert_eq!(values, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn literal_shapes_with_bad_widths_are_rejected() {
        // The shape variants are public; a width the constructors refuse must
        // still be caught at handle construction.
        let err = match ArrayHandle::from_vec(ValueShape::Vector(7), vec![0.0f32; 7]) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, HandleError::UnsupportedWidth { width: 7 }));

        let portal: Box<dyn Portal<f64>> =
            Box::new(UniformPoints::new([1, 1, 1], [0.0; 3], [1.0; 3]));
        assert!(matches!(
            ArrayHandle::from_portal(ValueShape::Matrix(1, 3), portal),
            Err(HandleError::UnsupportedWidth { width: 1 })
        ));
    }
}
