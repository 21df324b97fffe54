pub mod session;

pub use session::{Feeling, SessionRecord};
