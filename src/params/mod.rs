pub use options::*;
pub use priors::*;

mod options;
mod priors;
