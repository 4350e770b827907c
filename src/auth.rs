pub mod middleware;
pub mod models;
pub mod token;
pub mod verifier;
