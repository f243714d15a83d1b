//! Error types for the persistent collections.
//!
//! Every error in this crate represents a caller contract violation: an
//! operation was invoked on a value that does not satisfy its precondition.
//! Errors are raised immediately at the violating call and are never
//! recovered internally; there are no fallback paths.

/// Represents a precondition violation on a persistent collection.
///
/// All variants are programmer-error conditions rather than recoverable
/// runtime failures. Callers are expected to validate indices and
/// non-emptiness up front, or to treat a returned error as fatal to the
/// operation.
///
/// # Examples
///
/// ```rust
/// use keepsake::{CollectionError, PersistentSequence};
///
/// let empty: PersistentSequence<i32> = PersistentSequence::empty();
/// assert_eq!(
///     empty.first(),
///     Err(CollectionError::EmptyCollection { operation: "first" })
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionError {
    /// The operation requires a non-empty collection but received the
    /// canonical empty value.
    EmptyCollection {
        /// The name of the operation that was invoked.
        operation: &'static str,
    },
    /// A positional argument lies outside the valid range for the
    /// collection, or a range's lower bound exceeds its upper bound.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
    },
    /// The canonical empty singleton was constructed a second time.
    ///
    /// The canonical empty value in this crate is a compile-time constant,
    /// so this condition is unreachable through the safe API; the variant
    /// documents the singleton contract.
    DoubleInitialization,
    /// A mutation was attempted through an iteration cursor.
    ///
    /// Cursors over persistent values are read-only; "mutation" always
    /// happens by building a new collection value instead.
    UnsupportedMutation {
        /// The name of the rejected cursor operation.
        operation: &'static str,
    },
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCollection { operation } => {
                write!(formatter, "{operation}: the collection is empty")
            }
            Self::IndexOutOfBounds { index } => {
                write!(formatter, "index {index} is out of range")
            }
            Self::DoubleInitialization => {
                write!(
                    formatter,
                    "the canonical empty collection is already initialized"
                )
            }
            Self::UnsupportedMutation { operation } => {
                write!(
                    formatter,
                    "{operation}: cursors cannot mutate a persistent collection"
                )
            }
        }
    }
}

impl std::error::Error for CollectionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collection_display() {
        let error = CollectionError::EmptyCollection { operation: "first" };
        assert_eq!(format!("{error}"), "first: the collection is empty");
    }

    #[test]
    fn test_index_out_of_bounds_display() {
        let error = CollectionError::IndexOutOfBounds { index: 7 };
        assert_eq!(format!("{error}"), "index 7 is out of range");
    }

    #[test]
    fn test_double_initialization_display() {
        let error = CollectionError::DoubleInitialization;
        assert_eq!(
            format!("{error}"),
            "the canonical empty collection is already initialized"
        );
    }

    #[test]
    fn test_unsupported_mutation_display() {
        let error = CollectionError::UnsupportedMutation { operation: "set" };
        assert_eq!(
            format!("{error}"),
            "set: cursors cannot mutate a persistent collection"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        let error: Box<dyn std::error::Error> =
            Box::new(CollectionError::EmptyCollection { operation: "rest" });
        assert!(error.to_string().contains("empty"));
    }
}
