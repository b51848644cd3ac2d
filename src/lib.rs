pub mod error;
pub mod params;
pub mod stats;
pub mod trans;
pub mod utils;

pub use error::{Error, Result};
pub use params::{BetaPrior, GammaPrior, Structure, TransitionOptions};
pub use stats::DirConcentration;
pub use trans::{ConcentrationResampler, CoupledTransitionModel, SweepStats, TransitionModel};
