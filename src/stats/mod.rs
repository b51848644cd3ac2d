pub use conc::*;
pub use crp::*;
pub use dp::*;

mod conc;
mod crp;
mod dp;
