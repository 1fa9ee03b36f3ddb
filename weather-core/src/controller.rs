//! Startup, search and failure handling for the weather view.
//!
//! Every fetch is issued as a [`FetchTicket`]. Only the most recently issued
//! ticket may settle; results for older tickets are dropped, so a slow
//! earlier request can never overwrite a newer one.

use std::sync::Arc;

use crate::{
    config::DEFAULT_CITY,
    error::{Notice, WeatherError},
    location::Geolocator,
    model::{CitySuggestion, Coordinates, Unit, WeatherSnapshot},
    preference::PreferenceStore,
    provider::WeatherProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Loading,
    Ready,
    Failed,
}

/// What triggered a fetch. Only [`Origin::Search`] results are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Startup,
    Search,
    /// The "try a default location" action after a full-page failure.
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchTarget {
    Text(String),
    City(CitySuggestion),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchPlan {
    Coordinates(Coordinates),
    CityName(String),
}

/// A fetch that has been started but not yet settled.
#[derive(Debug)]
pub struct FetchTicket {
    seq: u64,
    origin: Origin,
    plan: FetchPlan,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn plan(&self) -> &FetchPlan {
        &self.plan
    }
}

#[derive(Debug)]
pub struct Failure {
    pub origin: Origin,
    pub error: WeatherError,
}

/// What the presentation layer should show.
#[derive(Debug, PartialEq)]
pub enum View<'a> {
    Loading,
    /// Full-page error after a failed startup or retry.
    Failed(Notice),
    Weather {
        snapshot: Option<&'a WeatherSnapshot>,
        /// Set after a failed search.
        inline_error: Option<&'static str>,
        /// A search is in flight.
        searching: bool,
    },
}

pub struct WeatherController {
    provider: Arc<dyn WeatherProvider>,
    store: Box<dyn PreferenceStore>,
    geolocator: Box<dyn Geolocator>,
    default_city: String,

    phase: Phase,
    in_flight: Option<Origin>,
    latest_seq: u64,
    snapshot: Option<WeatherSnapshot>,
    failure: Option<Failure>,
    saved_city: Option<CitySuggestion>,
    unit: Unit,
}

impl WeatherController {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Box<dyn PreferenceStore>,
        geolocator: Box<dyn Geolocator>,
    ) -> Self {
        Self {
            provider,
            store,
            geolocator,
            default_city: DEFAULT_CITY.to_string(),
            phase: Phase::Initializing,
            in_flight: None,
            latest_seq: 0,
            snapshot: None,
            failure: None,
            saved_city: None,
            unit: Unit::default(),
        }
    }

    pub fn with_default_city(mut self, city: impl Into<String>) -> Self {
        self.default_city = city.into();
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Initializing | Phase::Loading)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// The persisted city, if any. Hosts offer a "forget" action only when set.
    pub fn saved_city(&self) -> Option<&CitySuggestion> {
        self.saved_city.as_ref()
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    pub fn view(&self) -> View<'_> {
        match self.phase {
            Phase::Initializing => View::Loading,
            Phase::Loading if self.in_flight != Some(Origin::Search) => View::Loading,
            Phase::Loading | Phase::Ready => View::Weather {
                snapshot: self.snapshot.as_ref(),
                inline_error: None,
                searching: self.phase == Phase::Loading,
            },
            Phase::Failed => match &self.failure {
                Some(f) if f.origin == Origin::Search => View::Weather {
                    snapshot: self.snapshot.as_ref(),
                    inline_error: Some(f.error.kind().inline_message()),
                    searching: false,
                },
                Some(f) => View::Failed(f.error.kind().notice()),
                None => View::Loading,
            },
        }
    }

    /// Saved city, else device location, else the default city.
    pub async fn start(&mut self) -> Phase {
        let ticket = self.begin_startup().await;
        self.run(ticket).await
    }

    pub async fn search(&mut self, target: SearchTarget) -> Phase {
        let ticket = self.begin_search(target);
        self.run(ticket).await
    }

    pub async fn retry_default(&mut self) -> Phase {
        let ticket = self.begin_retry();
        self.run(ticket).await
    }

    /// Drop the saved city and start over.
    pub async fn forget_preference(&mut self) -> Phase {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "Failed to clear saved city");
        }
        self.saved_city = None;
        self.snapshot = None;
        self.failure = None;

        self.start().await
    }

    pub async fn begin_startup(&mut self) -> FetchTicket {
        self.phase = Phase::Initializing;

        let plan = if let Some(city) = self.store.load() {
            tracing::info!(city = %city.name, "Using saved city");
            let at = city.coordinates();
            self.saved_city = Some(city);
            FetchPlan::Coordinates(at)
        } else {
            match self.geolocator.locate().await {
                Ok(at) => FetchPlan::Coordinates(at),
                Err(err) => {
                    tracing::info!(
                        error = %err,
                        city = %self.default_city,
                        "No location available, using default city"
                    );
                    FetchPlan::CityName(self.default_city.clone())
                }
            }
        };

        self.begin(Origin::Startup, plan)
    }

    pub fn begin_search(&mut self, target: SearchTarget) -> FetchTicket {
        let plan = match target {
            SearchTarget::Text(name) => FetchPlan::CityName(name),
            SearchTarget::City(city) => FetchPlan::Coordinates(city.coordinates()),
        };

        self.begin(Origin::Search, plan)
    }

    pub fn begin_retry(&mut self) -> FetchTicket {
        let plan = FetchPlan::CityName(self.default_city.clone());
        self.begin(Origin::Retry, plan)
    }

    fn begin(&mut self, origin: Origin, plan: FetchPlan) -> FetchTicket {
        self.latest_seq += 1;
        self.phase = Phase::Loading;
        self.in_flight = Some(origin);

        tracing::debug!(seq = self.latest_seq, ?origin, ?plan, "Fetch started");

        FetchTicket { seq: self.latest_seq, origin, plan }
    }

    /// Perform the network side of a ticket. Does not touch controller state.
    pub async fn execute(&self, ticket: &FetchTicket) -> Result<WeatherSnapshot, WeatherError> {
        match &ticket.plan {
            FetchPlan::Coordinates(at) => self.provider.fetch_by_coordinates(*at).await,
            FetchPlan::CityName(name) => self.provider.fetch_by_city_name(name).await,
        }
    }

    /// Apply a ticket's result. Returns `false` if a newer ticket superseded it.
    pub fn settle(
        &mut self,
        ticket: FetchTicket,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> bool {
        if ticket.seq != self.latest_seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "Discarding superseded response"
            );
            return false;
        }

        self.in_flight = None;

        match result {
            Ok(snapshot) => {
                if ticket.origin == Origin::Search {
                    self.remember(&snapshot);
                }
                self.snapshot = Some(snapshot);
                self.failure = None;
                self.phase = Phase::Ready;
            }
            Err(error) => {
                tracing::warn!(origin = ?ticket.origin, error = %error, "Weather fetch failed");
                // A failed search keeps the last good snapshot on screen.
                if ticket.origin != Origin::Search {
                    self.snapshot = None;
                }
                self.failure = Some(Failure { origin: ticket.origin, error });
                self.phase = Phase::Failed;
            }
        }

        true
    }

    async fn run(&mut self, ticket: FetchTicket) -> Phase {
        let result = self.execute(&ticket).await;
        self.settle(ticket, result);
        self.phase
    }

    fn remember(&mut self, snapshot: &WeatherSnapshot) {
        let city = CitySuggestion::from_snapshot(snapshot);
        if let Err(err) = self.store.save(&city) {
            tracing::warn!(error = %err, "Failed to save city preference");
        }
        self.saved_city = Some(city);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        location::StaticGeolocator,
        model::{CityId, CurrentConditions},
        preference::MemoryPreferenceStore,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Coordinates(Coordinates),
        Search(String),
    }

    /// Provider with a fixed gazetteer and an optional outage.
    #[derive(Debug, Default)]
    struct Scripted {
        calls: Mutex<Vec<Call>>,
        outage: bool,
    }

    impl Scripted {
        fn down() -> Self {
            Self { outage: true, ..Self::default() }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn place(name: &str, country: &str, latitude: f64, longitude: f64) -> CitySuggestion {
        CitySuggestion {
            id: CityId::Geocoder(latitude as i64),
            name: name.into(),
            country: country.into(),
            latitude,
            longitude,
        }
    }

    fn gazetteer() -> Vec<CitySuggestion> {
        vec![
            place("London", "United Kingdom", 51.50853, -0.12574),
            place("Paris", "France", 48.85341, 2.3488),
            place("Oslo", "Norway", 59.91273, 10.74609),
        ]
    }

    #[async_trait]
    impl WeatherProvider for Scripted {
        async fn fetch_by_coordinates(
            &self,
            at: Coordinates,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.lock().unwrap().push(Call::Coordinates(at));
            if self.outage {
                return Err(WeatherError::Upstream { status: 503 });
            }
            Ok(WeatherSnapshot {
                city: format!("Near {}", at.key()),
                country: String::new(),
                latitude: at.latitude,
                longitude: at.longitude,
                current: CurrentConditions {
                    temperature: 14,
                    weather_code: 1,
                    wind_speed: 12,
                    wind_direction: 90.0,
                    is_day: true,
                },
                daily: Vec::new(),
            })
        }

        async fn search(
            &self,
            name: &str,
            count: usize,
        ) -> Result<Vec<CitySuggestion>, WeatherError> {
            self.calls.lock().unwrap().push(Call::Search(name.to_string()));
            Ok(gazetteer()
                .into_iter()
                .filter(|c| c.name.eq_ignore_ascii_case(name))
                .take(count)
                .collect())
        }
    }

    fn controller(
        provider: &Arc<Scripted>,
        store: MemoryPreferenceStore,
        position: Option<Coordinates>,
    ) -> WeatherController {
        WeatherController::new(
            provider.clone(),
            Box::new(store),
            Box::new(StaticGeolocator::new(position)),
        )
    }

    fn stored(city: &CitySuggestion) -> MemoryPreferenceStore {
        let mut store = MemoryPreferenceStore::new();
        store.save(city).unwrap();
        store
    }

    #[tokio::test]
    async fn startup_prefers_saved_city() {
        let provider = Arc::new(Scripted::default());
        let paris = place("Paris", "France", 48.85341, 2.3488);
        let here = Some(Coordinates::new(1.0, 1.0));
        let mut c = controller(&provider, stored(&paris), here);

        assert_eq!(c.phase(), Phase::Initializing);
        assert_eq!(c.start().await, Phase::Ready);

        assert_eq!(provider.calls(), vec![Call::Coordinates(paris.coordinates())]);
        assert_eq!(c.saved_city(), Some(&paris));
        assert_eq!(c.preferences().load(), Some(paris));
    }

    #[tokio::test]
    async fn startup_uses_location_without_saving() {
        let provider = Arc::new(Scripted::default());
        let here = Coordinates::new(47.6, -122.33);
        let mut c = controller(&provider, MemoryPreferenceStore::new(), Some(here));

        assert_eq!(c.start().await, Phase::Ready);

        assert_eq!(provider.calls(), vec![Call::Coordinates(here)]);
        assert_eq!(c.snapshot().unwrap().coordinates(), here);
        assert!(c.saved_city().is_none());
        assert!(c.preferences().load().is_none());
    }

    #[tokio::test]
    async fn startup_falls_back_to_default_city() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);

        assert_eq!(c.start().await, Phase::Ready);

        let calls = provider.calls();
        assert_eq!(calls[0], Call::Search("London".into()));
        assert_eq!(calls.len(), 2);
        assert_eq!(c.snapshot().unwrap().city, "London");
        assert!(c.preferences().load().is_none());
    }

    #[tokio::test]
    async fn denied_location_falls_back_to_default_city() {
        let provider = Arc::new(Scripted::default());
        let mut c = WeatherController::new(
            provider.clone(),
            Box::new(MemoryPreferenceStore::new()),
            Box::new(StaticGeolocator::denied()),
        );

        assert_eq!(c.start().await, Phase::Ready);
        assert_eq!(provider.calls()[0], Call::Search("London".into()));
        assert_eq!(c.snapshot().unwrap().city, "London");
    }

    #[tokio::test]
    async fn configured_default_city() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None)
            .with_default_city("Oslo");

        c.start().await;
        assert_eq!(c.snapshot().unwrap().city, "Oslo");
    }

    #[tokio::test]
    async fn corrupt_preference_is_ignored() {
        let provider = Arc::new(Scripted::default());
        let here = Coordinates::new(10.0, 20.0);
        let mut c = controller(&provider, MemoryPreferenceStore::with_raw("{{{"), Some(here));

        c.start().await;
        assert_eq!(provider.calls(), vec![Call::Coordinates(here)]);
        assert!(c.saved_city().is_none());
    }

    #[tokio::test]
    async fn text_search_persists_result() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);
        c.start().await;

        assert_eq!(c.search(SearchTarget::Text("paris".into())).await, Phase::Ready);

        let saved = c.preferences().load().expect("search result should be saved");
        assert_eq!(saved.name, "Paris");
        assert_eq!(saved.country, "France");
        assert_eq!(saved.id, CityId::Coordinates("48.85341:2.3488".into()));
        assert_eq!(c.saved_city(), Some(&saved));
    }

    #[tokio::test]
    async fn suggestion_search_uses_its_coordinates() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), Some(Coordinates::new(0.0, 0.0)));
        c.start().await;

        let oslo = place("Oslo", "Norway", 59.91273, 10.74609);
        c.search(SearchTarget::City(oslo.clone())).await;

        assert_eq!(provider.calls().last(), Some(&Call::Coordinates(oslo.coordinates())));
        assert_eq!(c.preferences().load().unwrap().coordinates(), oslo.coordinates());
    }

    #[tokio::test]
    async fn failed_search_keeps_snapshot_and_shows_inline_error() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);
        c.start().await;
        let before = c.snapshot().cloned();

        assert_eq!(c.search(SearchTarget::Text("Atlantis".into())).await, Phase::Failed);

        assert_eq!(c.snapshot().cloned(), before);
        assert_eq!(c.failure().unwrap().error.kind(), ErrorKind::LocationNotFound);
        assert_eq!(
            c.view(),
            View::Weather {
                snapshot: before.as_ref(),
                inline_error: Some("Could not find that city. Please check the spelling."),
                searching: false,
            }
        );
        assert!(c.preferences().load().is_none());
    }

    #[tokio::test]
    async fn failed_startup_shows_full_page_error() {
        let provider = Arc::new(Scripted::down());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), Some(Coordinates::new(1.0, 2.0)));

        assert_eq!(c.start().await, Phase::Failed);
        assert!(c.snapshot().is_none());
        assert_eq!(c.view(), View::Failed(ErrorKind::ServiceUnavailable.notice()));
        assert!(!c.is_loading());
    }

    #[tokio::test]
    async fn retry_fetches_default_city_without_saving() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);

        let ticket = c.begin_startup().await;
        c.settle(ticket, Err(WeatherError::Upstream { status: 500 }));
        assert_eq!(c.phase(), Phase::Failed);

        assert_eq!(c.retry_default().await, Phase::Ready);
        assert_eq!(c.snapshot().unwrap().city, "London");
        assert!(c.failure().is_none());
        assert!(c.preferences().load().is_none());
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);

        let first = c.begin_search(SearchTarget::Text("Paris".into()));
        let second = c.begin_search(SearchTarget::Text("Oslo".into()));
        assert!(second.seq() > first.seq());

        let newer = c.execute(&second).await;
        assert!(c.settle(second, newer));

        let older = c.execute(&first).await;
        assert!(!c.settle(first, older));

        assert_eq!(c.snapshot().unwrap().city, "Oslo");
        assert_eq!(c.preferences().load().unwrap().name, "Oslo");
    }

    #[tokio::test]
    async fn forget_clears_and_restarts() {
        let provider = Arc::new(Scripted::default());
        let paris = place("Paris", "France", 48.85341, 2.3488);
        let here = Coordinates::new(35.0, 139.0);
        let mut c = controller(&provider, stored(&paris), Some(here));
        c.start().await;
        assert!(c.saved_city().is_some());

        assert_eq!(c.forget_preference().await, Phase::Ready);

        assert!(c.saved_city().is_none());
        assert!(c.preferences().load().is_none());
        assert_eq!(c.snapshot().unwrap().coordinates(), here);
    }

    #[tokio::test]
    async fn view_during_fetches() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);
        assert_eq!(c.view(), View::Loading);

        let ticket = c.begin_startup().await;
        assert_eq!(ticket.origin(), Origin::Startup);
        assert_eq!(ticket.plan(), &FetchPlan::CityName("London".into()));
        assert_eq!(c.view(), View::Loading);
        let result = c.execute(&ticket).await;
        c.settle(ticket, result);

        let _search = c.begin_search(SearchTarget::Text("Oslo".into()));
        assert!(c.is_loading());
        assert!(matches!(
            c.view(),
            View::Weather { snapshot: Some(_), inline_error: None, searching: true }
        ));
    }

    #[test]
    fn unit_is_transient_state() {
        let provider = Arc::new(Scripted::default());
        let mut c = controller(&provider, MemoryPreferenceStore::new(), None);
        assert_eq!(c.unit(), Unit::Celsius);
        c.set_unit(Unit::Fahrenheit);
        assert_eq!(c.unit(), Unit::Fahrenheit);
    }
}
