pub mod data_fetcher;
pub mod metrics;
pub mod pipeline;
pub mod teams;

pub use data_fetcher::*;
pub use metrics::*;
pub use pipeline::*;
pub use teams::*;
