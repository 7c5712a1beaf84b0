//! Mock interviews generated and evaluated by the LLM.

pub mod handlers;
pub mod prompts;
pub mod session;
