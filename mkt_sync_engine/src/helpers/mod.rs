mod locks;

pub use locks::{lock, read, write};
