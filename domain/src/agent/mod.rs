//! Agent domain.
//!
//! - [`agent_type::AgentType`] — the closed set of routable agents

pub mod agent_type;
