//! Host to compute: wrap host arrays into compute fields, zero-copy.

use crate::compute::handle::ArrayHandle;
use crate::compute::{Association, ComputeDataset, Field, ValueShape};
use crate::convert::{ConvertError, FieldFlags};
use crate::dtype::with_scalar_type;
use crate::host::HostArray;
use crate::host::dataset::HostDataset;

/// Wrap a host array into a compute field without moving its data.
///
/// The component count selects the value shape: 1 maps to a scalar, 2-4 to a
/// fixed-width vector. The field's handle is a layout-tagged view over the
/// array's existing buffer (reference count increment only), so the reverse
/// conversion can recognize and alias the same memory later.
///
/// Point fields take the array's name; cell fields additionally carry the
/// fixed placeholder cell-set name (see
/// [`crate::compute::DEFAULT_CELL_SET_NAME`]).
///
/// # Errors
/// Returns [`ConvertError::UnsupportedShape`] for component counts outside
/// 1-4; this is an explicit design limitation, not a truncation.
pub fn convert_array(array: &HostArray, association: Association) -> Result<Field, ConvertError> {
    let shape = match array.components() {
        1 => ValueShape::Scalar,
        w @ 2..=4 => ValueShape::vector(w as u8)?,
        components => return Err(ConvertError::UnsupportedShape { components }),
    };
    let handle = with_scalar_type!(array.scalar_type(), T => {
        ArrayHandle::host_view::<T>(shape, array.clone())?
    });
    let name = array.name().unwrap_or_default();
    Ok(Field::new(name, association, handle))
}

/// Convert every point and/or cell array of a host dataset into compute
/// fields, per `fields`.
///
/// Each array converts independently: an array the builder cannot handle is
/// logged and skipped without affecting its siblings.
pub fn populate_compute_dataset(
    input: &HostDataset,
    output: &mut ComputeDataset,
    fields: FieldFlags,
) {
    if fields.contains(FieldFlags::POINTS) {
        for array in input.point_data().iter() {
            match convert_array(array, Association::Points) {
                Ok(field) => output.add_field(field),
                Err(e) => log::warn!("skipping point array {:?}: {e}", array.name()),
            }
        }
    }
    if fields.contains(FieldFlags::CELLS) {
        for array in input.cell_data().iter() {
            match convert_array(array, Association::Cells) {
                Ok(field) => output.add_field(field),
                Err(e) => log::warn!("skipping cell array {:?}: {e}", array.name()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::DEFAULT_CELL_SET_NAME;
    use crate::host::Layout;

    #[test]
    fn component_counts_map_to_value_shapes() {
        for (components, shape) in [
            (1usize, ValueShape::Scalar),
            (2, ValueShape::Vector(2)),
            (3, ValueShape::Vector(3)),
            (4, ValueShape::Vector(4)),
        ] {
            let array = HostArray::from_vec(
                Some("a"),
                Layout::Interleaved,
                components,
                vec![0.0f32; components * 5],
            )
            .unwrap();
            let field = convert_array(&array, Association::Points).unwrap();
            assert_eq!(field.handle().value_shape(), shape);
            assert_eq!(field.handle().len(), 5);
        }
    }

    #[test]
    fn five_components_are_unsupported() {
        let array =
            HostArray::from_vec(Some("wide"), Layout::Interleaved, 5, vec![0.0f64; 10]).unwrap();
        let err = match convert_array(&array, Association::Points) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            ConvertError::UnsupportedShape { components: 5 }
        ));
    }

    #[test]
    fn field_naming_follows_the_association() {
        let array =
            HostArray::from_vec(Some("flux"), Layout::Interleaved, 1, vec![1u32, 2]).unwrap();

        let pfield = convert_array(&array, Association::Points).unwrap();
        assert_eq!(pfield.name(), "flux");
        assert_eq!(pfield.cell_set_name(), None);

        let cfield = convert_array(&array, Association::Cells).unwrap();
        assert_eq!(cfield.name(), "flux");
        assert_eq!(cfield.cell_set_name(), Some(DEFAULT_CELL_SET_NAME));
    }

    #[test]
    fn the_view_reads_back_the_source_values() {
        let array = HostArray::from_vec(
            Some("v"),
            Layout::Planar,
            2,
            vec![1.0f64, 2.0, 3.0, 10.0, 20.0, 30.0],
        )
        .unwrap();
        let field = convert_array(&array, Association::Points).unwrap();
        // The handle reads in tuple-major order regardless of the source layout.
        assert_eq!(
            field.handle().read_all::<f64>().unwrap(),
            vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]
        );
    }

    #[test]
    fn flags_select_associations_independently() {
        let mut host = HostDataset::new();
        host.point_data_mut().add_array(
            HostArray::from_vec(Some("p"), Layout::Interleaved, 1, vec![0.0f32; 4]).unwrap(),
        );
        host.cell_data_mut().add_array(
            HostArray::from_vec(Some("c"), Layout::Interleaved, 1, vec![0.0f32; 2]).unwrap(),
        );

        let mut compute = ComputeDataset::new();
        populate_compute_dataset(&host, &mut compute, FieldFlags::POINTS);
        assert_eq!(compute.len(), 1);
        assert_eq!(compute.fields()[0].name(), "p");

        let mut compute = ComputeDataset::new();
        populate_compute_dataset(&host, &mut compute, FieldFlags::POINTS | FieldFlags::CELLS);
        assert_eq!(compute.len(), 2);
    }
}
