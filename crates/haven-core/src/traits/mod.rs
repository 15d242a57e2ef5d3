//! Cross-cutting trait seams shared by the Haven crates.

pub mod clock;
pub mod mailer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use mailer::{EmailMessage, Mailer};
