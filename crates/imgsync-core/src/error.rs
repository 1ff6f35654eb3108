use crate::{fetch::FetchError, key::KeyError, storage::StorageError, transform::TransformError};
use thiserror::Error;

/// Fault that ends reconciliation of a single row
///
/// The batch driver turns these into `ERROR: <reason>` results; they never
/// abort the batch.
#[derive(Error, Debug)]
pub enum RowFault {
    #[error("key derivation failed: {0}")]
    Key(#[from] KeyError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_name_the_failing_step() {
        let fault = RowFault::from(TransformError::Decode("bad header".into()));
        assert_eq!(fault.to_string(), "transform failed: could not decode image: bad header");

        let fault = RowFault::from(FetchError::Status {
            url: "https://x/a.png".into(),
            status: 404,
        });
        assert_eq!(fault.to_string(), "download of https://x/a.png returned HTTP 404");

        let fault = RowFault::from(StorageError::Put {
            key: "a.jpg".into(),
            reason: "access denied".into(),
        });
        assert_eq!(fault.to_string(), "upload of 'a.jpg' failed: access denied");
    }
}
