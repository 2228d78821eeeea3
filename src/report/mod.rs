//! Report module - bin tables, run summaries and binning export

pub mod export;
pub mod summary;
pub mod table;

pub use export::*;
pub use summary::*;
pub use table::*;
