use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{Field, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    #[default]
    Active,
    Cancelled,
    Completed,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReservationStatus::Active => "ACTIVE",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub flight_number: String,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
}

impl Reservation {
    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }
}

/// Who is signed in. The role picks which reservations endpoint is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Staff,
}

impl std::str::FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            other => Err(DeskError::InvalidConfigValueError {
                field: "session.role".to_string(),
                value: other.to_string(),
                reason: "Expected 'admin' or 'staff'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl Session {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPassenger {
    pub name: String,
    pub email: String,
}

impl std::str::FromStr for NewPassenger {
    type Err = DeskError;

    /// Parses `Name <email>`.
    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = s.split_once('<').ok_or_else(|| {
            DeskError::validation(format!("Passenger '{s}' must look like 'Name <email>'"))
        })?;
        let email = rest.strip_suffix('>').ok_or_else(|| {
            DeskError::validation(format!("Passenger '{s}' is missing the closing '>'"))
        })?;
        Ok(NewPassenger {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        })
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub flight_number: String,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub passengers: Vec<NewPassenger>,
}

impl Validate for NewReservation {
    fn validate(&self) -> Result<()> {
        Field::input("flightNumber").not_blank(&self.flight_number)?;

        if self.passengers.is_empty() {
            return Err(DeskError::validation(
                "A reservation needs at least one passenger",
            ));
        }

        for (index, passenger) in self.passengers.iter().enumerate() {
            Field::input(&format!("passengers[{index}].name")).not_blank(&passenger.name)?;
            Field::input(&format!("passengers[{index}].email")).email(&passenger.email)?;
        }

        if self.arrival_date < self.departure_date {
            return Err(DeskError::validation(
                "Arrival cannot be earlier than departure",
            ));
        }

        Ok(())
    }
}

/// Server-side filter parameters sent with a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReservationQuery {
    pub role: Role,
    pub range: Option<crate::core::filter::DateRange>,
}

impl ReservationQuery {
    pub fn for_session(session: &Session) -> Self {
        Self {
            role: session.role,
            range: None,
        }
    }

    pub fn with_range(mut self, range: crate::core::filter::DateRange) -> Self {
        self.range = Some(range);
        self
    }
}
