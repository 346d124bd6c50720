pub mod catalog;
pub mod request;
pub mod status;
pub mod wire;
