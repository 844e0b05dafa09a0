pub mod base;
pub mod configs;
pub mod mock;
pub mod openai;
pub(crate) mod stream;
pub mod utils;
