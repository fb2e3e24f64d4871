pub mod filter;
pub mod page_window;
pub mod poller;
pub mod recommendations;
pub mod stats;

pub use crate::domain::model::{Reservation, ReservationQuery, Session};
pub use crate::domain::ports::{IdentityProvider, Notifier, ReservationSource};
pub use crate::utils::error::Result;
