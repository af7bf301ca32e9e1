pub mod run_result;
pub mod settings;
pub mod test_suite;

pub mod prelude;

pub use prelude::*;
