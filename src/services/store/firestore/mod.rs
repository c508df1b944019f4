mod client;
pub mod token;
pub mod value;

pub use client::{FirestoreStore, ServiceAccountKey};
