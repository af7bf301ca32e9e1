pub use super::run_result::Entity as RunResult;
pub use super::settings::Entity as Settings;
pub use super::test_suite::Entity as TestSuite;
