// Core moderation module - language enforcement decision logic.
// Following the same pattern as the translation module.

pub mod action_orchestrator;
pub mod fuzzy_matcher;
pub mod lexical_filter;
pub mod moderation_models;
pub mod moderation_service;
pub mod mute_scheduler;

pub use action_orchestrator::*;
pub use moderation_models::*;
pub use moderation_service::*;
