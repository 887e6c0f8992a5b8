//! Read portals and polymorphic storage resolution.
//!
//! A [`Portal`] is the read-by-index interface of a virtual storage: it can
//! always produce values one at a time, but may not be able to expose or
//! relinquish a raw pointer. Resolution ([`Portal::resolve`]) is the
//! type-and-strategy test that recognizes portals wrapping an
//! already-concrete strategy, so materialization can take a cheap path before
//! falling back to an element-wise copy.

use std::marker::PhantomData;

use crate::compute::handle::OwnedBuffer;
use crate::dtype::Scalar;
use crate::host::{ArrayError, HostArray};

/// Outcome of resolving a polymorphic storage.
pub enum Resolved<T: Scalar> {
    /// The portal wrapped a view over host memory; alias it.
    HostView(HostArray),
    /// The portal wrapped an owned buffer; its memory can be stolen.
    Owned(OwnedBuffer<T>),
    /// Nothing concrete behind the portal; values must be copied out.
    Opaque(Box<dyn Portal<T>>),
}

/// Read-by-index access to a sequence of fixed-shape values.
///
/// `read` writes the flattened components of one value into `out`, in
/// row-major order (outer axis first) for nested-vector shapes. The caller
/// sizes `out` to the handle's component count.
pub trait Portal<T: Scalar>: Send + Sync + 'static {
    /// Logical number of values.
    fn len(&self) -> usize;

    /// Read the flattened components of value `index` into `out`.
    fn read(&self, index: usize, out: &mut [T]);

    /// Resolve to a concrete storage strategy when one is behind the portal.
    ///
    /// Computed portals with nothing concrete behind them return
    /// `Resolved::Opaque(self)`, which routes materialization to the
    /// element-wise copy path.
    fn resolve(self: Box<Self>) -> Resolved<T>;
}

/// A portal over memory a [`HostArray`] owns.
///
/// Wrapping a host view in a portal erases which strategy backs the handle;
/// resolution recovers it so the reverse conversion can alias instead of copy.
pub struct HostViewPortal<T: Scalar> {
    array: HostArray,
    _marker: PhantomData<T>,
}

impl<T: Scalar> HostViewPortal<T> {
    /// Wrap a host array, validating that `T` matches its element tag.
    pub fn new(array: HostArray) -> Result<Self, ArrayError> {
        array.typed::<T>()?;
        Ok(Self {
            array,
            _marker: PhantomData,
        })
    }
}

impl<T: Scalar> Portal<T> for HostViewPortal<T> {
    fn len(&self) -> usize {
        self.array.tuples()
    }

    fn read(&self, index: usize, out: &mut [T]) {
        match self.array.read_tuple(index, out) {
            Ok(()) => {}
            Err(e) => panic!("host view portal read failed on a validated array: {e}"),
        }
    }

    fn resolve(self: Box<Self>) -> Resolved<T> {
        Resolved::HostView(self.array)
    }
}

/// A portal over an owned-basic buffer.
pub struct OwnedPortal<T: Scalar> {
    components: usize,
    buffer: OwnedBuffer<T>,
}

impl<T: Scalar> OwnedPortal<T> {
    pub fn new(components: usize, buffer: OwnedBuffer<T>) -> Self {
        Self { components, buffer }
    }
}

impl<T: Scalar> Portal<T> for OwnedPortal<T> {
    fn len(&self) -> usize {
        match self.buffer.as_slice() {
            Some(slice) => slice.len() / self.components,
            None => 0,
        }
    }

    fn read(&self, index: usize, out: &mut [T]) {
        match self.buffer.as_slice() {
            Some(slice) => {
                let start = index * self.components;
                out.copy_from_slice(&slice[start..start + self.components]);
            }
            None => panic!("owned portal read after its buffer was taken"),
        }
    }

    fn resolve(self: Box<Self>) -> Resolved<T> {
        Resolved::Owned(self.buffer)
    }
}

/// Implicit uniform-grid point coordinates: a computed storage.
///
/// Coordinates are derived from a grid origin and per-axis spacing; no buffer
/// exists to steal, so materialization always goes through the copy path.
/// Values are 3-component `f64` vectors in x-fastest order.
pub struct UniformPoints {
    dims: [usize; 3],
    origin: [f64; 3],
    spacing: [f64; 3],
}

impl UniformPoints {
    pub fn new(dims: [usize; 3], origin: [f64; 3], spacing: [f64; 3]) -> Self {
        Self {
            dims,
            origin,
            spacing,
        }
    }
}

impl Portal<f64> for UniformPoints {
    fn len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    fn read(&self, index: usize, out: &mut [f64]) {
        let i = index % self.dims[0];
        let j = (index / self.dims[0]) % self.dims[1];
        let k = index / (self.dims[0] * self.dims[1]);
        out[0] = self.origin[0] + i as f64 * self.spacing[0];
        out[1] = self.origin[1] + j as f64 * self.spacing[1];
        out[2] = self.origin[2] + k as f64 * self.spacing[2];
    }

    fn resolve(self: Box<Self>) -> Resolved<f64> {
        Resolved::Opaque(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Layout;

    #[test]
    fn uniform_points_enumerate_x_fastest() {
        let portal = UniformPoints::new([2, 2, 1], [1.0, 10.0, 100.0], [0.5, 2.0, 3.0]);
        assert_eq!(portal.len(), 4);
        let mut out = [0.0f64; 3];
        portal.read(0, &mut out);
        assert_eq!(out, [1.0, 10.0, 100.0]);
        portal.read(1, &mut out);
        assert_eq!(out, [1.5, 10.0, 100.0]);
        portal.read(3, &mut out);
        assert_eq!(out, [1.5, 12.0, 100.0]);
    }

    #[test]
    fn computed_portals_stay_opaque() {
        let portal: Box<dyn Portal<f64>> =
            Box::new(UniformPoints::new([2, 1, 1], [0.0; 3], [1.0; 3]));
        match portal.resolve() {
            Resolved::Opaque(portal) => assert_eq!(portal.len(), 2),
            _ => panic!("expected an opaque portal"),
        }
    }

    #[test]
    fn host_view_portal_resolves_to_its_array() {
        let array =
            HostArray::from_vec(Some("v"), Layout::Planar, 2, vec![1.0f32, 2.0, 3.0, 4.0])
                .unwrap();
        let ptr = array.buffer_ptr();
        let portal = Box::new(HostViewPortal::<f32>::new(array).unwrap());

        let mut out = [0.0f32; 2];
        portal.read(1, &mut out);
        assert_eq!(out, [2.0, 4.0]);

        match portal.resolve() {
            Resolved::HostView(array) => assert_eq!(array.buffer_ptr(), ptr),
            _ => panic!("expected a host view"),
        }
    }

    #[test]
    fn host_view_portal_rejects_mismatched_types() {
        let array = HostArray::from_vec(None, Layout::Interleaved, 1, vec![1i64, 2]).unwrap();
        assert!(HostViewPortal::<f64>::new(array).is_err());
    }

    #[test]
    fn owned_portal_resolves_to_its_buffer() {
        let portal = Box::new(OwnedPortal::new(1, OwnedBuffer::new(vec![7u8, 8, 9])));
        assert_eq!(portal.len(), 3);
        let mut out = [0u8; 1];
        portal.read(2, &mut out);
        assert_eq!(out, [9]);

        match portal.resolve() {
            Resolved::Owned(mut buffer) => assert_eq!(buffer.take().unwrap(), vec![7, 8, 9]),
            _ => panic!("expected an owned buffer"),
        }
    }
}
