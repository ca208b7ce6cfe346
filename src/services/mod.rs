//! GitHub API service implementations.

mod fetcher;
mod organizations;
mod pull_requests;

pub use fetcher::*;
pub use organizations::*;
pub use pull_requests::*;
