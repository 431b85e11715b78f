//! Error types for the data-binding core.

use thiserror::Error;

use super::provider::ProviderKind;

/// Errors reported by the data-binding core.
///
/// Every variant here is a caller-side usage error: the core performs no
/// retries and has no recovery action of its own. Failures inside
/// user-supplied fetch/count callbacks are not wrapped; they unwind through
/// the triggering call untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// An operation requiring a data provider was invoked before one was set.
    #[error("no data provider has been set")]
    NoProvider,

    /// A data view or operation was bound to a provider of the wrong
    /// category (e.g. a list view over a lazy callback provider).
    #[error("unsupported data provider: expected {expected:?}, got {actual:?}")]
    UnsupportedProvider {
        expected: ProviderKind,
        actual: ProviderKind,
    },

    /// An index outside the item set was requested.
    ///
    /// Reported when the item count is authoritative; with an unknown or
    /// estimated count, [`PastEnd`](DataError::PastEnd) is reported instead
    /// once a fetch proves no item exists at the index.
    #[error("index {index} out of range for item count {count}")]
    OutOfRange { index: usize, count: usize },

    /// A direct item fetch proved the item set ends at or before the index.
    ///
    /// The lazily sized counterpart of [`OutOfRange`](DataError::OutOfRange):
    /// no authoritative count exists, but the probe fetch came back empty.
    #[error("no item at index {index}: the item set ends before it")]
    PastEnd { index: usize },

    /// Paging was enabled on a component whose client widget cannot page.
    #[error("paging is not supported by this component")]
    PagingUnsupported,

    /// A value was set that is not part of the current dataset.
    #[error("item is not part of the current dataset")]
    UnknownItem,

    /// An exact count was requested from a callback provider that was
    /// created without a count callback.
    #[error("count callback not set; provide one or use an item count estimate")]
    MissingCountCallback,

    /// A sort referenced a column key that does not exist.
    #[error("unknown column key: {key}")]
    UnknownColumn { key: String },
}

/// A specialized Result type for data-binding operations.
pub type DataResult<T> = Result<T, DataError>;
