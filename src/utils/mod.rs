pub mod crypto;
pub mod logging;
pub mod request;
