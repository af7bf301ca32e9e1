pub mod assertion;
pub mod auth;
pub mod scheduler;
pub mod step_executor;
pub mod suite_runner;

pub use auth::{AuthService, Claims};
pub use scheduler::{CleanupReport, FiringReport, ScheduledJobs, Scheduler};
pub use step_executor::{ExecutorConfig, StepExecutor};
pub use suite_runner::{RecordError, SuiteRunner};
