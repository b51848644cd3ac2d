pub use coupled::*;
pub use model::*;

mod coupled;
mod model;
