use crate::domain::model::{Reservation, ReservationStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub active_reservations: usize,
    pub total_passengers: usize,
    /// Departures within the next 24 hours, plus any already past.
    pub pending_operations: usize,
}

impl DashboardStats {
    pub fn from_reservations(reservations: &[Reservation], now: DateTime<Utc>) -> Self {
        let horizon = Duration::hours(24);

        reservations
            .iter()
            .fold(DashboardStats::default(), |mut stats, reservation| {
                if reservation.status == ReservationStatus::Active {
                    stats.active_reservations += 1;
                }
                stats.total_passengers += reservation.passenger_count();
                if reservation.departure_date - now < horizon {
                    stats.pending_operations += 1;
                }
                stats
            })
    }
}
