use std::collections::BTreeMap;

use strata_types::Dataset;
use thiserror::Error;

/// A transform script execution failed.
#[derive(Debug, Error)]
#[error("transform failed: {0}")]
pub struct TransformError(pub String);

/// Contract for the external transform-execution engine.
///
/// A transform may rewrite dataset fields and produce a new body. Callers
/// are responsible for re-applying user-supplied fields afterwards; the
/// engine sees the dataset as-is.
pub trait TransformEngine: Send + Sync {
    /// Run the dataset's declared transform over `body`, mutating the
    /// dataset in place and returning the new body bytes.
    fn exec(
        &self,
        dataset: &mut Dataset,
        body: &[u8],
        secrets: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, TransformError>;
}
