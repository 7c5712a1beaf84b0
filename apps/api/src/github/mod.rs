//! GitHub integration: REST client, repository analysis and the profile sync job.

pub mod analysis;
pub mod client;
pub mod sync;
