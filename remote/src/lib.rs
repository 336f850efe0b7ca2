pub mod client;
pub mod error;

pub use client::SlideServiceClient;
pub use error::RemoteError;
