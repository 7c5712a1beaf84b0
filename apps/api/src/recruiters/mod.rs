//! Recruiter job postings, matched talent pools and talent search.

pub mod handlers;
pub mod talent;
