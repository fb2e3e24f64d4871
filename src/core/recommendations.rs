//! Rule-based advice for a single reservation.
//!
//! Every recommendation is a fixed template picked by a handful of
//! buckets (occupancy, season, group size, route, lead time). Nothing is
//! learned and nothing leaves the process.

use crate::domain::model::Reservation;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Seats assumed per reservation when computing occupancy.
pub const SEAT_CAPACITY: usize = 3;

/// Flight-number prefix of the home carrier; anything else is international.
pub const DOMESTIC_PREFIX: &str = "TK";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Suggestion,
    Analysis,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Emerald,
    Amber,
    Violet,
    Blue,
    Rose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecommendationKind {
    Occupancy,
    Season,
    CustomerProfile,
    Operational,
    Pricing,
}

impl RecommendationKind {
    pub const ALL: [RecommendationKind; 5] = [
        RecommendationKind::Occupancy,
        RecommendationKind::Season,
        RecommendationKind::CustomerProfile,
        RecommendationKind::Operational,
        RecommendationKind::Pricing,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RecommendationKind::Occupancy => "Occupancy Analysis",
            RecommendationKind::Season => "Season Analysis",
            RecommendationKind::CustomerProfile => "Customer Profile",
            RecommendationKind::Operational => "Operational Advice",
            RecommendationKind::Pricing => "Pricing Advice",
        }
    }

    pub fn category(self) -> Category {
        match self {
            RecommendationKind::Occupancy | RecommendationKind::CustomerProfile => {
                Category::Analysis
            }
            RecommendationKind::Season => Category::Summary,
            RecommendationKind::Operational | RecommendationKind::Pricing => Category::Suggestion,
        }
    }

    pub fn accent(self) -> Accent {
        match self {
            RecommendationKind::Occupancy => Accent::Emerald,
            RecommendationKind::Season => Accent::Amber,
            RecommendationKind::CustomerProfile => Accent::Violet,
            RecommendationKind::Operational => Accent::Blue,
            RecommendationKind::Pricing => Accent::Rose,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub content: String,
}

impl Recommendation {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Summer,
    Winter,
    Mid,
}

impl Season {
    /// Summer is June through September, winter December through February.
    pub fn of(departure: DateTime<Utc>) -> Self {
        match departure.month0() {
            5..=8 => Season::Summer,
            0 | 1 | 11 => Season::Winter,
            _ => Season::Mid,
        }
    }
}

pub fn occupancy_percent(reservation: &Reservation) -> f64 {
    reservation.passenger_count() as f64 / SEAT_CAPACITY as f64 * 100.0
}

pub fn is_domestic(flight_number: &str) -> bool {
    flight_number.starts_with(DOMESTIC_PREFIX)
}

/// Whole days until departure, rounded up. Negative once the flight has left.
pub fn days_until_departure(departure: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (departure - now).num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY) + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) != 0)
}

pub fn generate(reservation: &Reservation, now: DateTime<Utc>) -> Vec<Recommendation> {
    let group = reservation.passenger_count() > 1;
    let domestic = is_domestic(&reservation.flight_number);

    RecommendationKind::ALL
        .into_iter()
        .map(|kind| {
            let content = match kind {
                RecommendationKind::Occupancy => occupancy_text(reservation),
                RecommendationKind::Season => season_text(Season::of(reservation.departure_date)),
                RecommendationKind::CustomerProfile => profile_text(reservation.passenger_count()),
                RecommendationKind::Operational => {
                    operational_text(&reservation.flight_number, domestic, group)
                }
                RecommendationKind::Pricing => pricing_text(
                    days_until_departure(reservation.departure_date, now),
                    domestic,
                ),
            };
            Recommendation { kind, content }
        })
        .collect()
}

fn occupancy_text(reservation: &Reservation) -> String {
    let rate = occupancy_percent(reservation);
    let verdict = if rate > 66.0 {
        "High occupancy; consider adding an extra service."
    } else if rate < 33.0 {
        "Low occupancy; a promotion is recommended."
    } else {
        "Occupancy is within normal levels."
    };
    format!("This flight is at {rate:.0}% occupancy. {verdict}")
}

fn season_text(season: Season) -> String {
    match season {
        Season::Summer => "Summer peak is under way. Price optimisation is recommended.",
        Season::Winter => "Winter season. Consider campaigns for holiday destinations.",
        Season::Mid => "Mid season. Standard pricing is appropriate.",
    }
    .to_string()
}

fn profile_text(passengers: usize) -> String {
    if passengers > 1 {
        format!(
            "Group reservation ({passengers} passengers) detected. Group discounts and dedicated services can be offered."
        )
    } else {
        "Single-passenger reservation. Personalised services can be offered.".to_string()
    }
}

fn operational_text(flight_number: &str, domestic: bool, group: bool) -> String {
    let protocol = if domestic {
        "domestic flight protocols apply."
    } else {
        "international flight protocols apply. Plan extra staff for passport control."
    };
    let check_in = if group {
        "Plan extra staff for group check-in."
    } else {
        "Standard check-in procedures will suffice."
    };
    format!("For flight {flight_number}, {protocol} {check_in}")
}

fn pricing_text(days: i64, domestic: bool) -> String {
    let advice = if days < 7 {
        "Last-minute pricing can apply. Consider a price increase if demand is high."
    } else if days < 30 {
        "Standard pricing fits. Adjust dynamically with occupancy."
    } else {
        "Offer early-booking discounts. Long-term promotions can be planned."
    };
    let mut text = format!("{days} days until departure. {advice}");
    if !domestic {
        text.push_str(" Account for exchange-rate fluctuations on international routes.");
    }
    text
}
