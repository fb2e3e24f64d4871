use crate::domain::model::{NewReservation, Reservation, ReservationQuery};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hands out a bearer credential. Called before every request, so
/// implementations are expected to refresh rather than cache forever.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

#[async_trait]
pub trait ReservationSource: Send + Sync {
    async fn fetch_reservations(
        &self,
        token: &str,
        query: &ReservationQuery,
    ) -> Result<Vec<Reservation>>;

    async fn create_reservation(&self, token: &str, reservation: &NewReservation) -> Result<()>;

    async fn seed_reservations(&self, token: &str) -> Result<serde_json::Value>;

    async fn seed_users(&self, token: &str) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient, non-blocking message for whoever is watching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
