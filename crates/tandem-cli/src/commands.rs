pub mod notes;
pub mod run;
pub mod session;
