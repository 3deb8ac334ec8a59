pub mod resolve;
pub mod validate;
