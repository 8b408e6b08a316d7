pub mod env;
pub mod files;
pub mod git;
