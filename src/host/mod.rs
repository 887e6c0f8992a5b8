//! Host-world arrays.
//!
//! A [`HostArray`] is a named, runtime-typed, multi-component array backed by a
//! shared byte buffer. The element interpretation is controlled by a
//! [`ScalarType`] tag plus a physical [`Layout`], and typed access goes through
//! validated zero-copy reinterpretation of the bytes.
//!
//! ## Buffer model
//! The backing buffer is a `bytes::Bytes`. Cloning a `HostArray` is shallow:
//! it bumps the buffer's reference count and copies no elements, which is what
//! allows the compute world to hold views over host memory and hand them back
//! later without a copy. A buffer installed via [`HostArray::from_vec`] keeps
//! the original `Vec` as its owner, so the last holder to drop frees the
//! memory through the vector's own deallocator.
//!
//! ## Layouts
//! - [`Layout::Interleaved`] (AoS): component `c` of tuple `t` lives at flat
//!   index `t * components + c`.
//! - [`Layout::Planar`] (SoA): the same component lives at
//!   `c * tuples + t`.

use bytes::Bytes;
use smol_str::SmolStr;
use thiserror::Error;

use crate::dtype::{Scalar, ScalarType};

pub mod dataset;

/// Physical memory layout of a [`HostArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Array-of-structures: per-tuple components stored contiguously.
    Interleaved,
    /// Structure-of-arrays: each component stored in its own contiguous run.
    Planar,
}

/// Errors returned by [`HostArray`] construction and typed access.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// The requested element type does not match the array's runtime tag.
    #[error("element type mismatch: array holds {actual}, requested {requested}")]
    TypeMismatch {
        actual: ScalarType,
        requested: ScalarType,
    },
    /// The byte buffer pointer is not aligned for the element type.
    #[error("byte buffer is not aligned to {alignment} bytes")]
    Misaligned { alignment: usize },
    /// The byte buffer length doesn't match `tuples * components * size`.
    #[error("wrong byte length: expected {expected}, got {actual}")]
    WrongByteLen { expected: usize, actual: usize },
    /// The element count is not divisible by the component count.
    #[error("{len} elements do not divide into {components}-component tuples")]
    ComponentMismatch { components: usize, len: usize },
    /// A component count of zero is not representable.
    #[error("component count must be at least 1")]
    ZeroComponents,
    /// A tuple index past the end of the array.
    #[error("tuple index {index} out of bounds (tuples={tuples})")]
    IndexOutOfBounds { index: usize, tuples: usize },
    /// A size computation overflowed `usize`.
    #[error("array length overflow")]
    LengthOverflow,
}

/// Buffer owner that lets a typed `Vec` back a `Bytes` without a copy.
///
/// Dropping the last `Bytes` clone drops the vector, so deallocation always
/// goes through the allocator that produced the buffer.
struct ScalarVec<T: Scalar>(Vec<T>);

impl<T: Scalar> AsRef<[u8]> for ScalarVec<T> {
    fn as_ref(&self) -> &[u8] {
        // Safety: `Scalar` is sealed to padding-free numeric primitives, so
        // every byte of the element span is initialized.
        unsafe {
            std::slice::from_raw_parts(
                self.0.as_ptr() as *const u8,
                self.0.len() * std::mem::size_of::<T>(),
            )
        }
    }
}

/// A named, runtime-typed, multi-component array over shared bytes.
#[derive(Debug, Clone)]
pub struct HostArray {
    name: Option<SmolStr>,
    scalar: ScalarType,
    components: usize,
    tuples: usize,
    layout: Layout,
    data: Bytes,
}

impl HostArray {
    /// Install a typed vector as the array's buffer, without copying.
    ///
    /// The vector becomes the buffer owner; its heap pointer is preserved and
    /// its deallocator runs when the last buffer reference drops.
    ///
    /// # Errors
    /// Returns [`ArrayError`] if `components` is zero or `values.len()` is not
    /// a multiple of `components`.
    pub fn from_vec<T: Scalar>(
        name: Option<&str>,
        layout: Layout,
        components: usize,
        values: Vec<T>,
    ) -> Result<Self, ArrayError> {
        if components == 0 {
            return Err(ArrayError::ZeroComponents);
        }
        if values.len() % components != 0 {
            return Err(ArrayError::ComponentMismatch {
                components,
                len: values.len(),
            });
        }
        let tuples = values.len() / components;
        Ok(Self {
            name: name.map(SmolStr::new),
            scalar: T::TYPE,
            components,
            tuples,
            layout,
            data: Bytes::from_owner(ScalarVec(values)),
        })
    }

    /// The array's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<SmolStr>) {
        self.name = Some(name.into());
    }

    /// Runtime element type tag.
    pub const fn scalar_type(&self) -> ScalarType {
        self.scalar
    }

    pub const fn components(&self) -> usize {
        self.components
    }

    /// Logical length in tuples.
    pub const fn tuples(&self) -> usize {
        self.tuples
    }

    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Base pointer of the backing buffer.
    ///
    /// Two arrays alias the same memory exactly when their pointers are equal;
    /// the zero-copy paths are verified against this.
    pub fn buffer_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// View the backing buffer as a flat typed slice, in physical order.
    ///
    /// This is zero-copy: the bytes are reinterpreted in place after the type
    /// tag, alignment, and byte length are validated.
    ///
    /// # Errors
    /// Returns [`ArrayError`] if `T` does not match the runtime tag, the
    /// buffer is misaligned for `T`, or the byte length is inconsistent.
    pub fn typed<T: Scalar>(&self) -> Result<&[T], ArrayError> {
        if T::TYPE != self.scalar {
            return Err(ArrayError::TypeMismatch {
                actual: self.scalar,
                requested: T::TYPE,
            });
        }
        let align = std::mem::align_of::<T>();
        if (self.data.as_ptr() as usize) % align != 0 {
            return Err(ArrayError::Misaligned { alignment: align });
        }
        let elems = self
            .tuples
            .checked_mul(self.components)
            .ok_or(ArrayError::LengthOverflow)?;
        let expected = elems
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ArrayError::LengthOverflow)?;
        if self.data.len() != expected {
            return Err(ArrayError::WrongByteLen {
                expected,
                actual: self.data.len(),
            });
        }
        // Safety: tag, alignment and length were validated above.
        Ok(unsafe { std::slice::from_raw_parts(self.data.as_ptr() as *const T, elems) })
    }

    /// Read the components of one tuple into `out`, in component order.
    ///
    /// The physical layout is translated here: callers always receive the
    /// interleaved (tuple-major) component order regardless of how the buffer
    /// stores it.
    ///
    /// # Errors
    /// Returns [`ArrayError`] on a type mismatch, an out-of-bounds tuple
    /// index, or when `out.len()` differs from the component count.
    pub fn read_tuple<T: Scalar>(&self, tuple: usize, out: &mut [T]) -> Result<(), ArrayError> {
        if tuple >= self.tuples {
            return Err(ArrayError::IndexOutOfBounds {
                index: tuple,
                tuples: self.tuples,
            });
        }
        if out.len() != self.components {
            return Err(ArrayError::ComponentMismatch {
                components: self.components,
                len: out.len(),
            });
        }
        let slice = self.typed::<T>()?;
        match self.layout {
            Layout::Interleaved => {
                let start = tuple * self.components;
                out.copy_from_slice(&slice[start..start + self.components]);
            }
            Layout::Planar => {
                for (c, slot) in out.iter_mut().enumerate() {
                    *slot = slice[c * self.tuples + tuple];
                }
            }
        }
        Ok(())
    }

    /// View the array as a 2-D `ndarray`, zero-copy.
    ///
    /// The view's axes follow the physical layout: `(tuples, components)` for
    /// interleaved buffers and `(components, tuples)` for planar ones.
    pub fn as_ndarray<T: Scalar>(&self) -> Result<ndarray::ArrayView2<'_, T>, ArrayError> {
        let slice = self.typed::<T>()?;
        let shape = match self.layout {
            Layout::Interleaved => (self.tuples, self.components),
            Layout::Planar => (self.components, self.tuples),
        };
        match ndarray::ArrayView2::from_shape(shape, slice) {
            Ok(view) => Ok(view),
            Err(e) => panic!("invalid ndarray shape for validated array: {e}"),
        }
    }
}
