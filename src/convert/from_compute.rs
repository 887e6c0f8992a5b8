//! Compute to host: materialize array handles into host arrays.
//!
//! Materialization conceptually moves the handle: whenever the backing
//! storage can relinquish its memory, ownership is transferred instead of
//! copied, and the storage is left observably empty. Resolution order, first
//! match wins:
//!
//! 1. virtual storage: resolve to a concrete strategy when one is behind the
//!    portal, otherwise fall through to the copy paths;
//! 2. host view (interleaved or planar): alias the original array, reference
//!    count increment only;
//! 3. owned-basic: destructive buffer hand-off, pointer preserved;
//! 4. opaque scalar values: element-wise copy through the read portal;
//! 5. opaque vector / nested-vector values: same, components written at
//!    flattened row-major indices.

use smallvec::{SmallVec, smallvec};

use crate::compute::handle::{ArrayHandle, HandleError, OwnedBuffer, TypedHandle, TypedStorage};
use crate::compute::portal::{Portal, Resolved};
use crate::compute::{Association, ComputeDataset, Field, ValueShape};
use crate::convert::ConvertError;
use crate::dtype::{Scalar, with_scalar_type};
use crate::host::dataset::{HostDataset, PointSet};
use crate::host::{ArrayError, HostArray, Layout};

/// Materialize a field into a host array named after the field.
///
/// Consumes the field: for owned-basic storage the backing buffer is stolen,
/// so the handle must not be reachable afterwards, and the move makes that a
/// compile-time guarantee.
///
/// # Errors
/// Returns [`ConvertError::UnresolvedStorage`] when no (type, strategy)
/// branch matches, and [`ConvertError::Handle`] when the owned buffer was
/// already taken.
pub fn convert_field(field: Field) -> Result<HostArray, ConvertError> {
    let name = field.name().to_owned();
    let mut array = materialize(field.into_handle())?;
    array.set_name(name);
    Ok(array)
}

/// Materialize a coordinate field into a point set.
///
/// Uses the same array machinery as [`convert_field`], but any failure is
/// promoted to [`ConvertError::Geometry`]: a dataset without geometry is not
/// usable, so this error is never swallowed at the orchestrator boundary.
pub fn convert_geometry(field: Field) -> Result<PointSet, ConvertError> {
    let array = convert_field(field).map_err(|e| ConvertError::Geometry {
        reason: e.to_string(),
    })?;
    PointSet::try_new(array).map_err(|e| ConvertError::Geometry {
        reason: e.to_string(),
    })
}

/// Materialize every field of a compute dataset into a host dataset.
///
/// The coordinate field converts first; its failure aborts the conversion.
/// Attribute fields convert independently: results are routed to point or
/// cell data by association, fields with an unrecognized association are
/// discarded, and a field that fails to materialize is logged and skipped
/// without affecting its siblings.
pub fn populate_host_dataset(
    input: ComputeDataset,
    output: &mut HostDataset,
) -> Result<(), ConvertError> {
    let (coordinates, fields) = input.into_parts();
    if let Some(coordinates) = coordinates {
        let points = convert_geometry(coordinates)?;
        output.set_points(points);
    }
    for field in fields {
        let name = field.name().to_owned();
        let association = field.association();
        match convert_field(field) {
            Ok(array) => match association {
                Association::Points => output.point_data_mut().add_array(array),
                Association::Cells => output.cell_data_mut().add_array(array),
                Association::Other => {
                    log::warn!("discarding field {name:?}: unrecognized association");
                }
            },
            Err(e) => log::warn!("skipping field {name:?}: {e}"),
        }
    }
    Ok(())
}

/// Materialize a handle into an unnamed host array.
fn materialize(handle: ArrayHandle) -> Result<HostArray, ConvertError> {
    let scalar = handle.scalar_type();
    with_scalar_type!(scalar, T => {
        match handle.into_typed::<T>() {
            Some(typed) => materialize_typed(typed),
            // The tag and the typed form disagree; nothing can handle this.
            None => Err(ConvertError::UnresolvedStorage { scalar }),
        }
    })
}

fn materialize_typed<T: Scalar>(handle: TypedHandle<T>) -> Result<HostArray, ConvertError> {
    let shape = handle.shape;
    match handle.storage {
        // Interleaved and planar views alias the same way: the destination is
        // the original array with its buffer reference count bumped.
        TypedStorage::HostView(array) => Ok(array),
        TypedStorage::Owned(buffer) => steal_buffer(shape, buffer),
        TypedStorage::Virtual(portal) => match portal.resolve() {
            Resolved::HostView(array) => {
                // The portal came from outside the crate; re-check that the
                // array actually matches the handle before aliasing it.
                array.typed::<T>()?;
                if array.components() != shape.component_count() {
                    return Err(ConvertError::UnresolvedStorage { scalar: T::TYPE });
                }
                Ok(array)
            }
            Resolved::Owned(buffer) => steal_buffer(shape, buffer),
            Resolved::Opaque(portal) => copy_each_value(shape, portal.as_ref()),
        },
    }
}

/// Destructive buffer hand-off from an owned-basic storage.
///
/// The buffer's heap pointer is installed into the new host array together
/// with its deallocator; no element is copied and the storage is left empty.
fn steal_buffer<T: Scalar>(
    shape: ValueShape,
    mut buffer: OwnedBuffer<T>,
) -> Result<HostArray, ConvertError> {
    let values = buffer.take().ok_or(HandleError::Empty)?;
    let array = HostArray::from_vec(None, Layout::Interleaved, shape.component_count(), values)?;
    Ok(array)
}

/// Element-wise copy through the read portal, for storages that cannot expose
/// or relinquish a raw pointer.
fn copy_each_value<T: Scalar>(
    shape: ValueShape,
    portal: &dyn Portal<T>,
) -> Result<HostArray, ConvertError> {
    let components = shape.component_count();
    let values = portal.len();
    let total = values
        .checked_mul(components)
        .ok_or(ArrayError::LengthOverflow)?;
    let mut out = vec![T::default(); total];
    match shape {
        ValueShape::Scalar => {
            for (index, slot) in out.iter_mut().enumerate() {
                portal.read(index, std::slice::from_mut(slot));
            }
        }
        ValueShape::Vector(_) | ValueShape::Matrix(..) => {
            let mut scratch: SmallVec<[T; 4]> = smallvec![T::default(); components];
            for (index, chunk) in out.chunks_exact_mut(components).enumerate() {
                portal.read(index, &mut scratch);
                chunk.copy_from_slice(&scratch);
            }
        }
    }
    let array = HostArray::from_vec(None, Layout::Interleaved, components, out)?;
    Ok(array)
}
