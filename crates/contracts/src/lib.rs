pub mod alloy;
pub mod artifact;
