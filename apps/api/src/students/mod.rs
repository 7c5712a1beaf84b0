//! Student profiles, submissions, syncs, job recommendations and roadmaps.

pub mod handlers;
pub mod profile;
pub mod repo;
pub mod roadmaps;
