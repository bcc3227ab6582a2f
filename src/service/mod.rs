pub mod billing;
pub mod chat_service;
pub mod clock;
pub mod error;
pub mod job_service;
pub mod rating;
pub mod side_effects;
