pub mod consultation;
pub mod ids;
pub mod patient;
pub mod professional;

pub use consultation::*;
pub use ids::*;
pub use patient::*;
pub use professional::*;
