use thiserror::Error;

use crate::DestinationKey;

/// Caller contract violations. The store is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("provisional destination {0} cannot be selected")]
    ProvisionalSelection(DestinationKey),
    #[error("destination {0} is not in the store")]
    UnknownDestination(DestinationKey),
    #[error("destination {0} is not awaiting a permission grant")]
    NotResolvable(DestinationKey),
    #[error("could neither select nor fetch destination {0}")]
    FetchNotStarted(DestinationKey),
    #[error("cloud directory is already attached")]
    CloudAlreadyAttached,
}
