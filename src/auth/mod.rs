//! OAuth 2.0 device-code login against the Caddey identity provider.

pub mod client;
pub mod device_code;
pub mod error;
pub mod sleep;
pub mod token;

pub use client::DeviceAuthClient;
pub use device_code::{DeviceCodePoll, DeviceCodeSession, PollState};
pub use error::AuthError;
pub use sleep::{Sleeper, TokioSleeper};
pub use token::AccessToken;
