pub mod credentials;
pub mod extractor;
pub mod handlers;
pub mod password;
pub mod token;
