pub mod agent;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod registry;
