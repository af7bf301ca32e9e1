pub mod run_result;
pub mod settings;
pub mod suite;

pub use run_result::*;
pub use settings::*;
pub use suite::*;
