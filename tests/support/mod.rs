pub mod env;
pub mod signals;
