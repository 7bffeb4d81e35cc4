pub mod claims;
pub mod clock;
pub mod codec;
pub mod config;
pub mod errors;

pub use claims::Audience;
pub use claims::Claims;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use codec::TokenCodec;
pub use config::TokenConfig;
pub use errors::JwtError;
