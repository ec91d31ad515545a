pub mod campaign;
pub mod stats;
pub mod subscription;
pub mod transaction;

pub use campaign::*;
pub use stats::*;
pub use subscription::*;
pub use transaction::*;
