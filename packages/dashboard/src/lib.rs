#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Screen orchestration: ties scope, date range, and analytics
//! together.
//!
//! A screen mounts, loads the district column, lets the user drive the
//! scope buttons and date drop-down, then fetches analytics filtered
//! by (level, geography ids, range) and folds them into section
//! states. Each region of the screen ([`SectionState`]) loads, fails,
//! and recovers independently; a Geography API outage never blanks the
//! analytics cards, and vice versa.
//!
//! Scope and range changes bump a generation counter. An analytics
//! response that resolves after its generation has passed is stale and
//! is discarded without touching the screen; staleness is purely an
//! internal guard, never shown to the user.

use chrono::NaiveDate;
use swachh_monitor_analytics::aggregate::{
    group_and_average, monthly_score, rank_top_n, summarize,
};
use swachh_monitor_analytics::{AnalyticsApi, AnalyticsQuery};
use swachh_monitor_analytics_models::{AnalyticsDomain, GroupedStats, RankedEntry, Totals};
use swachh_monitor_dates::{DateRange, PredefinedRange};
use swachh_monitor_geography::{FetchKey, GeoCache, GeographyApi};
use swachh_monitor_geography_models::{GeoLevel, GeographyNode};
use swachh_monitor_scope::{Scope, ScopeSelection};

/// Number of rows in the top-performers ranking card.
pub const TOP_PERFORMERS: usize = 5;

/// Load state of one independent screen region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState<T> {
    /// A fetch is outstanding (or the section has not loaded yet).
    Loading,
    /// Data arrived and the section can render it.
    Ready(T),
    /// The backend legitimately returned nothing for this filter.
    Empty,
    /// The fetch failed; the section shows the message and a retry.
    Error(String),
}

impl<T> SectionState<T> {
    /// Returns the contained data when the section is ready.
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` when the section failed to load.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Wraps a fetched list: `Empty` for zero rows, `Ready` otherwise.
fn section_from_list<T>(list: Vec<T>) -> SectionState<Vec<T>> {
    if list.is_empty() {
        SectionState::Empty
    } else {
        SectionState::Ready(list)
    }
}

/// Ticket identifying the screen generation a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

/// Scope selection and date range of one screen, reset as a unit when
/// the scope returns to the state root.
#[derive(Debug, Clone)]
pub struct ScreenState {
    selection: ScopeSelection,
    range: DateRange,
    generation: u64,
}

impl ScreenState {
    /// Fresh screen state: state scope, today's range.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            selection: ScopeSelection::new(),
            range: default_range(today),
            generation: 0,
        }
    }

    /// The current scope selection.
    #[must_use]
    pub const fn selection(&self) -> &ScopeSelection {
        &self.selection
    }

    /// Mutable access for menu interactions (open/hover/seed). Query-
    /// affecting changes go through [`commit`](Self::commit) and
    /// [`set_scope`](Self::set_scope) so the generation advances.
    pub const fn selection_mut(&mut self) -> &mut ScopeSelection {
        &mut self.selection
    }

    /// The current date range.
    #[must_use]
    pub const fn range(&self) -> &DateRange {
        &self.range
    }

    /// Switches scope. Returning to the state root also resets the
    /// date range to its default; selection and range reset as a unit.
    pub fn set_scope(&mut self, scope: Scope, today: NaiveDate) {
        self.selection.reset(scope);
        if scope == Scope::State {
            self.range = default_range(today);
        }
        self.generation += 1;
    }

    /// Replaces the date range.
    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
        self.generation += 1;
    }

    /// Commits a drop-down click and advances the generation, since
    /// the committed path drives the analytics query.
    pub fn commit(&mut self, level: GeoLevel, node: &GeographyNode) {
        self.selection.commit(level, node);
        self.generation += 1;
    }

    /// Ticket for a request about to be issued against this state.
    #[must_use]
    pub const fn ticket(&self) -> RequestTicket {
        RequestTicket {
            generation: self.generation,
        }
    }

    /// Whether a ticket still matches the current state.
    #[must_use]
    pub const fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Builds the analytics query for the current scope and range.
    #[must_use]
    pub fn analytics_query(&self) -> AnalyticsQuery {
        let committed = self.selection.committed();
        AnalyticsQuery::new(self.selection.scope().analytics_level(), &self.range)
            .with_district(committed.district_id())
            .with_block(committed.block_id())
            .with_gp(committed.gp_id())
    }
}

/// The range a fresh screen starts with.
fn default_range(today: NaiveDate) -> DateRange {
    PredefinedRange::Today
        .resolve(today)
        .unwrap_or_else(|| DateRange::custom(today, today))
}

/// The analytics-driven regions of the overview screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    /// Summary totals card.
    pub summary: SectionState<Totals>,
    /// Top-performers ranking table.
    pub ranking: SectionState<Vec<RankedEntry>>,
    /// Per-geography history table.
    pub history: SectionState<Vec<GroupedStats>>,
}

impl Default for Overview {
    fn default() -> Self {
        Self {
            summary: SectionState::Loading,
            ranking: SectionState::Loading,
            history: SectionState::Loading,
        }
    }
}

/// Fetches analytics for the current state and folds them into the
/// overview sections. A failed fetch marks every analytics section as
/// errored (they share the response) while leaving geography-driven
/// regions untouched; an empty result renders zeroed metrics.
pub async fn load_overview<A>(
    api: &A,
    state: &ScreenState,
    domain: AnalyticsDomain,
    today: NaiveDate,
) -> Overview
where
    A: AnalyticsApi,
{
    match api.fetch(domain, &state.analytics_query()).await {
        Ok(records) => {
            let ranking = rank_top_n(
                &records,
                |record| monthly_score(record, today),
                TOP_PERFORMERS,
            );
            let history = group_and_average(&records, |record| record.geography_id);

            Overview {
                summary: SectionState::Ready(summarize(&records)),
                ranking: section_from_list(ranking),
                history: section_from_list(history),
            }
        }
        Err(e) => {
            log::error!("Analytics fetch failed for {domain}: {e}");
            let message = e.to_string();
            Overview {
                summary: SectionState::Error(message.clone()),
                ranking: SectionState::Error(message.clone()),
                history: SectionState::Error(message),
            }
        }
    }
}

/// One dashboard screen: its state plus the independently loading
/// regions.
#[derive(Debug, Clone)]
pub struct DashboardScreen {
    /// Scope, range, and request generation.
    pub state: ScreenState,
    /// The district drop-down column.
    pub districts: SectionState<Vec<GeographyNode>>,
    /// The analytics-driven regions.
    pub overview: Overview,
}

impl DashboardScreen {
    /// Creates an unmounted screen with every region loading.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            state: ScreenState::new(today),
            districts: SectionState::Loading,
            overview: Overview::default(),
        }
    }

    /// Mount step: loads the district column. A geography failure
    /// degrades this region to an error state; analytics regions are
    /// unaffected.
    pub async fn mount<G>(&mut self, cache: &GeoCache<G>)
    where
        G: GeographyApi + 'static,
    {
        let list = cache.fetch_districts().await;

        self.districts = if let Some(message) = cache.error_for(FetchKey::Districts) {
            SectionState::Error(message)
        } else {
            section_from_list(list)
        };
    }

    /// Switches scope. At the state root the Block/GP caches are
    /// meaningless and get cleared along with the range reset.
    pub fn change_scope<G>(&mut self, scope: Scope, today: NaiveDate, cache: &GeoCache<G>)
    where
        G: GeographyApi + 'static,
    {
        if scope == Scope::State {
            cache.clear_children();
        }
        self.state.set_scope(scope, today);
    }

    /// Fetches and applies the overview for the current state.
    pub async fn refresh<A>(&mut self, api: &A, domain: AnalyticsDomain, today: NaiveDate)
    where
        A: AnalyticsApi,
    {
        let ticket = self.state.ticket();
        let overview = load_overview(api, &self.state, domain, today).await;
        self.apply_overview(ticket, overview);
    }

    /// Applies a fetched overview if its ticket is still current.
    /// Returns `false` when the response was stale and discarded.
    pub fn apply_overview(&mut self, ticket: RequestTicket, overview: Overview) -> bool {
        if self.state.is_current(ticket) {
            self.overview = overview;
            true
        } else {
            log::debug!("Discarding stale analytics response");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use swachh_monitor_analytics::AnalyticsError;
    use swachh_monitor_analytics_models::{AnalyticsLevel, AnalyticsRecord};
    use swachh_monitor_geography::GeoError;
    use swachh_monitor_geography_models::GeoId;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn record(id: GeoId, name: &str, present: u64) -> AnalyticsRecord {
        AnalyticsRecord {
            geography_id: id,
            geography_name: name.to_owned(),
            present_count: present,
            absent_count: 2,
            total_contractors: present + 2,
            attendance_rate: 0.8,
            date: None,
        }
    }

    /// Mock analytics backend returning a fixed response.
    struct MockAnalytics {
        records: Vec<AnalyticsRecord>,
        fail: bool,
        calls: AtomicU32,
    }

    impl MockAnalytics {
        fn with_records(records: Vec<AnalyticsRecord>) -> Self {
            Self {
                records,
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                records: Vec::new(),
                fail: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl AnalyticsApi for MockAnalytics {
        async fn fetch(
            &self,
            _domain: AnalyticsDomain,
            _query: &AnalyticsQuery,
        ) -> Result<Vec<AnalyticsRecord>, AnalyticsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AnalyticsError::Conversion {
                    message: "backend unavailable".to_owned(),
                })
            } else {
                Ok(self.records.clone())
            }
        }
    }

    /// Mock geography backend; optionally failing.
    struct MockGeography {
        fail: bool,
    }

    impl GeographyApi for MockGeography {
        async fn districts(&self) -> Result<Vec<GeographyNode>, GeoError> {
            if self.fail {
                Err(GeoError::Conversion {
                    message: "backend unavailable".to_owned(),
                })
            } else {
                Ok(vec![GeographyNode::district(1, "Ajmer".to_owned())])
            }
        }

        async fn blocks(&self, district_id: GeoId) -> Result<Vec<GeographyNode>, GeoError> {
            Ok(vec![GeographyNode::block(
                10,
                "Beawar".to_owned(),
                district_id,
            )])
        }

        async fn gps(
            &self,
            _district_id: GeoId,
            block_id: GeoId,
        ) -> Result<Vec<GeographyNode>, GeoError> {
            Ok(vec![GeographyNode::gp(100, "Jawaja".to_owned(), block_id)])
        }
    }

    #[tokio::test]
    async fn overview_sections_load_from_records() {
        let api = MockAnalytics::with_records(vec![
            record(1, "Ajmer", 13),
            record(2, "Alwar", 5),
        ]);
        let state = ScreenState::new(today());

        let overview = load_overview(&api, &state, AnalyticsDomain::Attendance, today()).await;

        let totals = overview.summary.ready().expect("summary should be ready");
        assert_eq!(totals.present, 18);

        let ranking = overview.ranking.ready().expect("ranking should be ready");
        assert_eq!(ranking[0].name, "Ajmer");
        assert_eq!(ranking[0].rank, 1);

        let history = overview.history.ready().expect("history should be ready");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn empty_records_render_zeroed_metrics() {
        let api = MockAnalytics::with_records(Vec::new());
        let state = ScreenState::new(today());

        let overview = load_overview(&api, &state, AnalyticsDomain::Attendance, today()).await;

        assert_eq!(overview.summary.ready(), Some(&Totals::default()));
        assert_eq!(overview.ranking, SectionState::Empty);
        assert_eq!(overview.history, SectionState::Empty);
    }

    #[tokio::test]
    async fn analytics_failure_marks_sections_errored() {
        let api = MockAnalytics::failing();
        let state = ScreenState::new(today());

        let overview = load_overview(&api, &state, AnalyticsDomain::Attendance, today()).await;

        assert!(overview.summary.is_error());
        assert!(overview.ranking.is_error());
        assert!(overview.history.is_error());
    }

    #[tokio::test]
    async fn geography_failure_leaves_analytics_untouched() {
        let cache = GeoCache::new(MockGeography { fail: true });
        let mut screen = DashboardScreen::new(today());

        screen.mount(&cache).await;

        assert!(screen.districts.is_error());
        assert_eq!(screen.overview, Overview::default());
    }

    #[tokio::test]
    async fn mount_loads_district_column() {
        let cache = GeoCache::new(MockGeography { fail: false });
        let mut screen = DashboardScreen::new(today());

        screen.mount(&cache).await;

        let districts = screen.districts.ready().expect("districts should load");
        assert_eq!(districts[0].name, "Ajmer");
    }

    #[test]
    fn stale_overview_is_discarded() {
        let mut screen = DashboardScreen::new(today());
        let ticket = screen.state.ticket();

        // The user switches scope while the fetch is outstanding.
        let cache = GeoCache::new(MockGeography { fail: false });
        screen.change_scope(Scope::Districts, today(), &cache);

        let stale = Overview {
            summary: SectionState::Ready(Totals::default()),
            ranking: SectionState::Empty,
            history: SectionState::Empty,
        };

        assert!(!screen.apply_overview(ticket, stale));
        assert_eq!(screen.overview, Overview::default());

        // A fresh ticket applies.
        let ticket = screen.state.ticket();
        let fresh = Overview {
            summary: SectionState::Ready(Totals::default()),
            ranking: SectionState::Empty,
            history: SectionState::Empty,
        };
        assert!(screen.apply_overview(ticket, fresh));
    }

    #[test]
    fn query_follows_scope_and_committed_path() {
        let mut state = ScreenState::new(today());
        state.set_scope(Scope::Blocks, today());
        state
            .selection_mut()
            .preview(GeoLevel::District, &GeographyNode::district(1, "Ajmer".to_owned()));
        state.commit(
            GeoLevel::Block,
            &GeographyNode::block(10, "Beawar".to_owned(), 1),
        );

        let query = state.analytics_query();
        assert_eq!(query.level, AnalyticsLevel::Village);
        assert_eq!(query.district_id, Some(1));
        assert_eq!(query.block_id, Some(10));
        assert_eq!(query.gp_id, None);
    }

    #[test]
    fn returning_to_state_resets_range_and_selection_as_a_unit() {
        let mut state = ScreenState::new(today());
        state.set_scope(Scope::Districts, today());
        state.set_range(DateRange::custom(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        ));

        state.set_scope(Scope::State, today());

        assert_eq!(state.range().start, today());
        assert_eq!(state.range().end, today());
        assert_eq!(state.selection().committed().district_id(), None);
    }

    #[tokio::test]
    async fn state_root_clears_child_caches() {
        let cache = GeoCache::new(MockGeography { fail: false });
        let mut screen = DashboardScreen::new(today());

        // Warm a child cache, then return to the root.
        cache.fetch_blocks(Some(1)).await;
        screen.change_scope(Scope::State, today(), &cache);

        assert_eq!(cache.cached(FetchKey::Blocks { district_id: 1 }), None);
    }
}
