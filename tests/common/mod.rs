#![allow(dead_code)]

pub mod app;
pub mod factory;
pub mod storage;
pub mod target;

pub use app::{test_config, TestApp};
pub use factory::{Factory, TestAuth};
pub use storage::FlakyStorage;
pub use target::{unreachable_base_url, TargetApi};
