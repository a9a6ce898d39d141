pub mod caption;
pub mod health;
pub mod session;
pub mod transcode;
pub mod translate;
