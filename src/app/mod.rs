//! Composition root: the collaborators a signed-in session works with,
//! constructed once by the entry point and handed to every operation.

use crate::adapters::http::ApiClient;
use crate::adapters::identity::{RefreshTokenProvider, StaticTokenProvider};
use crate::config::toml_config::DeskConfig;
use crate::core::filter::DateRange;
use crate::core::page_window::PageState;
use crate::core::poller::{CycleOutcome, PollerConfig, ResilientPoller};
use crate::core::recommendations::{self, Recommendation};
use crate::core::stats::DashboardStats;
use crate::domain::model::{NewReservation, Reservation, ReservationQuery, Session};
use crate::domain::ports::{IdentityProvider, Notification, Notifier, ReservationSource};
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{Field, Validate};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct Desk {
    identity: Arc<dyn IdentityProvider>,
    source: Arc<dyn ReservationSource>,
    notifier: Arc<dyn Notifier>,
    session: Session,
    poller_config: PollerConfig,
    page_size: usize,
}

/// One rendered page of reservations.
#[derive(Debug, Clone)]
pub struct ReservationPage {
    pub items: Vec<Reservation>,
    pub state: PageState,
}

impl Desk {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        source: Arc<dyn ReservationSource>,
        notifier: Arc<dyn Notifier>,
        session: Session,
    ) -> Self {
        Self {
            identity,
            source,
            notifier,
            session,
            poller_config: PollerConfig::default(),
            page_size: crate::core::page_window::DEFAULT_PAGE_SIZE,
        }
    }

    /// Wires the HTTP adapters described by `config`.
    pub fn from_config(config: &DeskConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate()?;

        let api = ApiClient::new(&config.api.base_url, config.timeout())?;
        let identity: Arc<dyn IdentityProvider> = match (&config.auth.token, &config.auth.token_url)
        {
            (Some(token), _) => Arc::new(StaticTokenProvider::new(token.clone())),
            (None, Some(token_url)) => {
                let refresh_token =
                    Field::config("auth.refresh_token").required(&config.auth.refresh_token)?;
                Arc::new(RefreshTokenProvider::new(
                    api.client().clone(),
                    token_url.clone(),
                    refresh_token.clone(),
                ))
            }
            (None, None) => {
                return Err(DeskError::MissingConfigError {
                    field: "auth.token".to_string(),
                })
            }
        };

        let session = config.session()?.clone();
        Ok(Self::new(identity, Arc::new(api), notifier, session)
            .with_poller_config(config.poller_config())
            .with_page_size(config.page_size()))
    }

    pub fn with_poller_config(mut self, config: PollerConfig) -> Self {
        self.poller_config = config;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn query(&self, range: Option<DateRange>) -> ReservationQuery {
        let query = ReservationQuery::for_session(&self.session);
        match range {
            Some(range) => query.with_range(range),
            None => query,
        }
    }

    /// Runs one poll cycle with the configured retry budget. When the budget
    /// runs out the error notification has already gone out and the last
    /// failure is returned.
    pub async fn fetch(&self, range: Option<DateRange>) -> Result<Vec<Reservation>> {
        let poller = self.poller(range);
        match poller.poll(self.poller_config.max_retries).await {
            CycleOutcome::Updated { .. } => Ok(poller
                .latest()
                .map(|reservations| reservations.as_ref().clone())
                .unwrap_or_default()),
            CycleOutcome::Exhausted { attempts } => {
                tracing::debug!(attempts, "giving up on reservations");
                Err(poller.take_last_error().unwrap_or(DeskError::Interrupted))
            }
            CycleOutcome::Skipped | CycleOutcome::Cancelled => Err(DeskError::Interrupted),
        }
    }

    pub async fn list(&self, range: Option<DateRange>, page: usize) -> Result<ReservationPage> {
        let reservations = self.fetch(range).await?;
        Ok(paginate(reservations, self.page_size, page))
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        let reservations = self.fetch(None).await?;
        Ok(DashboardStats::from_reservations(&reservations, Utc::now()))
    }

    pub async fn recommend(&self, reservation_id: &str) -> Result<(Reservation, Vec<Recommendation>)> {
        let reservation = self
            .fetch(None)
            .await?
            .into_iter()
            .find(|r| r.id == reservation_id)
            .ok_or_else(|| DeskError::NotFound {
                id: reservation_id.to_string(),
            })?;
        let advice = recommendations::generate(&reservation, Utc::now());
        Ok((reservation, advice))
    }

    pub async fn create(&self, reservation: &NewReservation) -> Result<()> {
        reservation.validate()?;
        let token = self.identity.bearer_token().await?;
        match self.source.create_reservation(&token, reservation).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success("Reservation created"));
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error("Reservation could not be created"));
                Err(e)
            }
        }
    }

    /// Asks the service to generate sample reservations, or sample users.
    pub async fn seed(&self, users: bool) -> Result<serde_json::Value> {
        let token = self.identity.bearer_token().await?;
        let result = if users {
            self.source.seed_users(&token).await
        } else {
            self.source.seed_reservations(&token).await
        };

        let what = if users { "Test users" } else { "Sample reservations" };
        match &result {
            Ok(_) => self
                .notifier
                .notify(Notification::success(format!("{what} created"))),
            Err(_) => self
                .notifier
                .notify(Notification::error(format!("{what} could not be created"))),
        }
        result
    }

    pub fn poller(&self, range: Option<DateRange>) -> ResilientPoller {
        ResilientPoller::new(
            Arc::clone(&self.identity),
            Arc::clone(&self.source),
            Arc::clone(&self.notifier),
            self.query(range),
            self.poller_config,
        )
    }
}

pub fn paginate(reservations: Vec<Reservation>, page_size: usize, page: usize) -> ReservationPage {
    let mut state = PageState::new(page_size);
    state.set_total_items(reservations.len());
    state.go_to(page);
    let items = state.slice(&reservations).to_vec();
    ReservationPage { items, state }
}
