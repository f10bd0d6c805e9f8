pub mod lake;
pub mod parameters;
pub mod system;
pub mod timeseries;
pub mod types;

pub use lake::*;
pub use parameters::*;
pub use system::*;
pub use timeseries::*;
pub use types::*;
