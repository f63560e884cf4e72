// Core translation module - provider port, fallback chain and language names.

pub mod languages;
pub mod translation_models;
pub mod translator_service;

pub use translation_models::*;
pub use translator_service::*;
