pub mod analysis;
pub mod chart;
pub mod ml;
pub mod quality;
pub mod signals;
pub mod source;

pub use analysis::*;
pub use chart::*;
pub use ml::*;
pub use quality::*;
pub use signals::*;
pub use source::*;
