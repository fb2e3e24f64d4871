use crate::domain::model::{NewReservation, Reservation, ReservationQuery, Role};
use crate::domain::ports::ReservationSource;
use crate::utils::error::{DeskError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// reqwest client for the reservations service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| DeskError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        // join() drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DeskError::config(format!("cannot build URL for {path}: {e}")))
    }

    /// Role-unscoped list, or the admin list with an optional date window.
    pub fn reservations_url(&self, query: &ReservationQuery) -> Result<Url> {
        match query.role {
            Role::Staff => self.endpoint("reservations"),
            Role::Admin => {
                let mut url = self.endpoint("reservations/admin")?;
                if let Some(range) = &query.range {
                    url.query_pairs_mut()
                        .append_pair("startDate", &range.start_param())
                        .append_pair("endDate", &range.end_param());
                }
                Ok(url)
            }
        }
    }

    async fn post_seed(&self, token: &str, path: &str) -> Result<serde_json::Value> {
        let url = self.endpoint(path)?;
        tracing::debug!("Seeding via: {}", url);

        let response = self.client.post(url).bearer_auth(token).send().await?;
        let response = check_status(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(DeskError::DecodeError)
    }
}

/// Turns a non-2xx reply into `StatusError`, preferring the body's `message`.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(DeskError::StatusError {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ReservationSource for ApiClient {
    async fn fetch_reservations(
        &self,
        token: &str,
        query: &ReservationQuery,
    ) -> Result<Vec<Reservation>> {
        let url = self.reservations_url(query)?;
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.get(url).bearer_auth(token).send().await?;
        tracing::debug!("API response status: {}", response.status());

        let response = check_status(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(DeskError::DecodeError)
    }

    async fn create_reservation(&self, token: &str, reservation: &NewReservation) -> Result<()> {
        let url = self.endpoint("reservations")?;
        tracing::debug!("Creating reservation for flight {}", reservation.flight_number);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(reservation)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn seed_reservations(&self, token: &str) -> Result<serde_json::Value> {
        self.post_seed(token, "reservations/seed").await
    }

    async fn seed_users(&self, token: &str) -> Result<serde_json::Value> {
        self.post_seed(token, "reservations/seed-users").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::DateRange;
    use chrono::NaiveDate;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_reservations_url_by_role() {
        let api = client("http://localhost:3001");
        let staff = ReservationQuery::default();
        assert_eq!(
            api.reservations_url(&staff).unwrap().as_str(),
            "http://localhost:3001/reservations"
        );

        let admin = ReservationQuery {
            role: Role::Admin,
            range: None,
        };
        assert_eq!(
            api.reservations_url(&admin).unwrap().as_str(),
            "http://localhost:3001/reservations/admin"
        );
    }

    #[test]
    fn test_admin_url_carries_date_range() {
        let api = client("https://api.example.com/v1");
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap();
        let query = ReservationQuery {
            role: Role::Admin,
            range: Some(range),
        };

        let url = api.reservations_url(&query).unwrap();
        assert_eq!(url.path(), "/v1/reservations/admin");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("startDate".to_string(), "2025-03-01T00:00:00.000Z".to_string()),
                ("endDate".to_string(), "2025-03-31T23:59:59.999Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_staff_url_ignores_date_range() {
        let api = client("http://localhost:3001/");
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        )
        .unwrap();
        let query = ReservationQuery {
            role: Role::Staff,
            range: Some(range),
        };
        assert_eq!(api.reservations_url(&query).unwrap().query(), None);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
