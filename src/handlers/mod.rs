pub mod common;
pub mod result;
pub mod run;

pub use common::PaginationParams;
pub use result::{delete_result, get_result, list_results, ListResultsParams, ResultListResponse};
pub use run::{run_suite, RunResponse};
