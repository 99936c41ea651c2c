pub mod assets;
pub mod launch;
pub mod metrics;
pub mod plan;
pub mod report;
pub mod utils;

pub use utils::*;
