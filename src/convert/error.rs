use thiserror::Error;

use crate::compute::handle::HandleError;
use crate::dtype::ScalarType;
use crate::host::ArrayError;

/// Errors produced by the conversion engine.
///
/// Per-field errors are contained at the orchestrator boundary (logged and
/// skipped); only [`ConvertError::Geometry`] is fatal to a whole dataset
/// conversion, because a dataset without geometry is unusable.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Component count outside the supported 1-4 range.
    #[error("unsupported component count {components} (supported range is 1-4)")]
    UnsupportedShape { components: usize },
    /// No (type, strategy) dispatch branch matched the handle.
    #[error("no conversion path for {scalar} values with this storage strategy")]
    UnresolvedStorage { scalar: ScalarType },
    /// The distinguished coordinate field failed to materialize.
    #[error("coordinate field could not be materialized: {reason}")]
    Geometry { reason: String },
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error(transparent)]
    Handle(#[from] HandleError),
}
