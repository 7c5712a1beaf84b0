//! LeetCode integration: GraphQL client and the coding-log sync job.

pub mod client;
pub mod sync;
