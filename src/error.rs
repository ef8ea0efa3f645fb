
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the enumerators and samplers
///
/// None of these are fatal.  A failed sample leaves no state behind, and a failed
/// mutation leaves the enumerator exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No object of the requested size exists under the requested restriction, in a
    /// context where an object is required
    #[error("no permutation of size {size} exists: {reason}")]
    DomainInfeasible { size: usize, reason: &'static str },

    /// A rate or acceptance ratio stopped being a finite number
    #[error("numeric instability while sampling size {size}: {detail}")]
    NumericInstability { size: usize, detail: String },

    /// A restriction that can never apply to this enumerator
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),

    /// A sampler parameter outside its domain
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A rejection loop ran out of its configured trial budget
    #[error("no exact sample of size {size} after {trials} trials")]
    TrialLimitExceeded { size: usize, trials: usize },

    /// The operation needs `size!` to fit in a u64
    #[error("size {size} exceeds the supported maximum of {max}")]
    SizeTooLarge { size: usize, max: usize },
}
