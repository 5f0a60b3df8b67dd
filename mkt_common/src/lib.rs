mod amount;

pub mod helpers;
mod secret;

pub use amount::{Amount, AmountConversionError};
pub use secret::Secret;
