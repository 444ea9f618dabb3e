//! School directory store.

use std::collections::BTreeMap;

use crate::api::{FetchFailure, School, SchoolPage};
use crate::view::{self, SchoolStats};

use super::{Phase, Reducer, Rejected, Update};

/// Page sizes offered by the per-page selector.
pub const PER_PAGE_OPTIONS: [u32; 3] = [10, 20, 50];

pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Grid,
            ViewMode::Grid => ViewMode::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchoolState {
    /// Current page exactly as last fetched (at most `per_page` entries).
    pub schools: Vec<School>,
    pub search_query: String,
    pub current_page: u32,
    pub per_page: u32,
    /// Zero until a fetch has completed.
    pub total_data: u64,
    pub view_mode: ViewMode,
    pub error: Option<String>,
    /// Fetches issued but not yet settled.
    pub in_flight: u32,
    /// Set once any fetch has succeeded.
    pub loaded: bool,
    /// Generation of the newest fetch issued.
    pub generation: u64,
    /// Drop completions older than `generation` instead of applying them.
    pub discard_stale: bool,
}

impl Default for SchoolState {
    fn default() -> Self {
        Self {
            schools: Vec::new(),
            search_query: String::new(),
            current_page: 1,
            per_page: DEFAULT_PER_PAGE,
            total_data: 0,
            view_mode: ViewMode::default(),
            error: None,
            in_flight: 0,
            loaded: false,
            generation: 0,
            discard_stale: false,
        }
    }
}

impl SchoolState {
    pub fn new(per_page: u32, discard_stale: bool) -> Self {
        Self {
            per_page,
            discard_stale,
            ..Self::default()
        }
    }

    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn phase(&self) -> Phase {
        Phase::derive(self.in_flight, self.error.as_deref(), self.loaded)
    }

    pub fn total_pages(&self) -> u32 {
        view::total_pages(self.total_data, self.per_page)
    }

    pub fn filtered_schools(&self) -> Vec<&School> {
        view::filter_schools(&self.schools, &self.search_query)
    }

    pub fn grouped_schools(&self) -> BTreeMap<&str, Vec<&School>> {
        view::group_by_province(&self.filtered_schools())
    }

    pub fn showing_range(&self) -> Option<(u64, u64)> {
        view::showing_range(self.current_page, self.per_page, self.total_data)
    }

    pub fn stats(&self) -> SchoolStats {
        view::school_stats(&self.schools)
    }

    /// Query to send upstream, if any.
    fn effective_query(&self) -> Option<String> {
        (!view::is_blank(&self.search_query)).then(|| self.search_query.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchoolAction {
    /// Update the query and refetch page 1 at the current page size.
    SetSearchQuery(String),
    /// Go to a page in `1..=total_pages`.
    SetCurrentPage(u32),
    /// Change the page size and refetch page 1.
    SetPerPage(u32),
    SetViewMode(ViewMode),
    FetchSchoolData { page: u32, per_page: u32 },
    /// Re-issue the fetch for the current page ("Try Again").
    Retry,
    /// A fetch settled.
    Loaded {
        generation: u64,
        page: u32,
        per_page: u32,
        result: Result<SchoolPage, FetchFailure>,
    },
}

/// Request for one directory page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSchools {
    pub generation: u64,
    pub page: u32,
    pub per_page: u32,
    pub query: Option<String>,
}

pub struct SchoolReducer;

impl SchoolReducer {
    fn issue(mut next: SchoolState, page: u32, per_page: u32) -> Update<SchoolState, FetchSchools> {
        next.generation += 1;
        next.in_flight += 1;
        next.error = None;
        let command = FetchSchools {
            generation: next.generation,
            page,
            per_page,
            query: next.effective_query(),
        };
        Update::with(next, command)
    }

    fn settle(
        mut next: SchoolState,
        generation: u64,
        page: u32,
        per_page: u32,
        result: Result<SchoolPage, FetchFailure>,
    ) -> SchoolState {
        next.in_flight = next.in_flight.saturating_sub(1);

        if generation < next.generation {
            if next.discard_stale {
                tracing::debug!(generation, newest = next.generation, "discarding stale school page");
                return next;
            }
            tracing::warn!(
                generation,
                newest = next.generation,
                "stale school page response overwrites newer request"
            );
        }

        match result {
            Ok(mut fetched) => {
                let limit = per_page as usize;
                if fetched.schools.len() > limit {
                    tracing::debug!(
                        returned = fetched.schools.len(),
                        per_page,
                        "upstream ignored page size; truncating"
                    );
                    fetched.schools.truncate(limit);
                }
                next.schools = fetched.schools;
                next.total_data = fetched.total_data;
                next.current_page = page;
                next.error = None;
                next.loaded = true;
            }
            Err(failure) => {
                tracing::warn!(%failure, page, "school fetch failed");
                next.error = Some(failure.to_string());
            }
        }
        next
    }
}

impl Reducer for SchoolReducer {
    type State = SchoolState;
    type Action = SchoolAction;
    type Command = FetchSchools;

    fn reduce(state: &SchoolState, action: SchoolAction) -> Result<Update<SchoolState, FetchSchools>, Rejected> {
        let mut next = state.clone();
        match action {
            SchoolAction::SetSearchQuery(query) => {
                next.search_query = query;
                next.current_page = 1;
                let per_page = next.per_page;
                Ok(Self::issue(next, 1, per_page))
            }
            SchoolAction::SetCurrentPage(page) => {
                let total_pages = next.total_pages();
                if page < 1 || page > total_pages {
                    return Err(Rejected::PageOutOfRange { page, total_pages });
                }
                next.current_page = page;
                let per_page = next.per_page;
                Ok(Self::issue(next, page, per_page))
            }
            SchoolAction::SetPerPage(per_page) => {
                if per_page == 0 {
                    return Err(Rejected::EmptyPageSize);
                }
                next.per_page = per_page;
                next.current_page = 1;
                Ok(Self::issue(next, 1, per_page))
            }
            SchoolAction::SetViewMode(mode) => {
                next.view_mode = mode;
                Ok(Update::state(next))
            }
            SchoolAction::FetchSchoolData { page, per_page } => {
                if per_page == 0 {
                    return Err(Rejected::EmptyPageSize);
                }
                if page == 0 {
                    return Err(Rejected::PageOutOfRange {
                        page,
                        total_pages: next.total_pages(),
                    });
                }
                Ok(Self::issue(next, page, per_page))
            }
            SchoolAction::Retry => {
                let (page, per_page) = (next.current_page, next.per_page);
                Ok(Self::issue(next, page, per_page))
            }
            SchoolAction::Loaded {
                generation,
                page,
                per_page,
                result,
            } => Ok(Update::state(Self::settle(next, generation, page, per_page, result))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{make_school, EndpointKind, FailureKind};
    use crate::store::Store;

    fn page_of(n: usize, total: u64) -> SchoolPage {
        SchoolPage {
            schools: (0..n)
                .map(|i| make_school(&i.to_string(), &format!("Sekolah {i}"), "Prov. Jawa Barat"))
                .collect(),
            total_data: total,
            page: 1,
            per_page: 10,
        }
    }

    fn failure() -> FetchFailure {
        FetchFailure::new(EndpointKind::Schools, FailureKind::HttpStatus(503), "upstream responded with HTTP 503")
    }

    /// Dispatch `action` and immediately settle the single fetch it emits.
    fn settle_with(store: &mut Store<SchoolReducer>, action: SchoolAction, result: Result<SchoolPage, FetchFailure>) {
        let commands = store.dispatch(action).unwrap();
        assert_eq!(commands.len(), 1);
        let cmd = &commands[0];
        store
            .dispatch(SchoolAction::Loaded {
                generation: cmd.generation,
                page: cmd.page,
                per_page: cmd.per_page,
                result,
            })
            .unwrap();
    }

    // -- defaults ------------------------------------------------------------

    #[test]
    fn new_store_is_idle_on_page_one() {
        let state = SchoolState::default();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.per_page, 10);
        assert_eq!(state.total_pages(), 0);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.loading());
    }

    // -- fetch lifecycle -----------------------------------------------------

    #[test]
    fn fetch_transitions_loading_then_ready() {
        let mut store: Store<SchoolReducer> = Store::default();

        let commands = store
            .dispatch(SchoolAction::FetchSchoolData { page: 1, per_page: 10 })
            .unwrap();
        assert!(store.state().loading());
        assert_eq!(store.state().phase(), Phase::Loading);
        assert_eq!(
            commands,
            vec![FetchSchools { generation: 1, page: 1, per_page: 10, query: None }]
        );

        store
            .dispatch(SchoolAction::Loaded {
                generation: 1,
                page: 1,
                per_page: 10,
                result: Ok(page_of(10, 25)),
            })
            .unwrap();

        let state = store.state();
        assert!(!state.loading());
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.schools.len(), 10);
        assert_eq!(state.total_data, 25);
        assert!(state.error.is_none());
    }

    #[test]
    fn failed_fetch_clears_loading_and_keeps_previous_data() {
        let mut store: Store<SchoolReducer> = Store::default();
        settle_with(&mut store, SchoolAction::FetchSchoolData { page: 1, per_page: 10 }, Ok(page_of(10, 25)));

        settle_with(&mut store, SchoolAction::SetCurrentPage(2), Err(failure()));

        let state = store.state();
        assert!(!state.loading());
        assert_eq!(state.phase(), Phase::Errored);
        assert!(state.error.as_deref().unwrap().contains("HTTP 503"));
        assert_eq!(state.schools.len(), 10, "previous page is still shown");
    }

    #[test]
    fn success_after_error_clears_error() {
        let mut store: Store<SchoolReducer> = Store::default();
        settle_with(&mut store, SchoolAction::FetchSchoolData { page: 1, per_page: 10 }, Err(failure()));
        assert!(store.state().error.is_some());

        let commands = store.dispatch(SchoolAction::Retry).unwrap();
        assert!(store.state().error.is_none(), "a new attempt resets the error");
        store
            .dispatch(SchoolAction::Loaded {
                generation: commands[0].generation,
                page: 1,
                per_page: 10,
                result: Ok(page_of(3, 3)),
            })
            .unwrap();

        assert!(store.state().error.is_none());
        assert_eq!(store.state().phase(), Phase::Ready);
    }

    // -- pagination ----------------------------------------------------------

    #[test]
    fn paging_through_twenty_five_records() {
        let mut store: Store<SchoolReducer> = Store::default();
        settle_with(&mut store, SchoolAction::FetchSchoolData { page: 1, per_page: 10 }, Ok(page_of(10, 25)));
        assert_eq!(store.state().total_pages(), 3);

        settle_with(&mut store, SchoolAction::SetCurrentPage(3), Ok(page_of(5, 25)));
        assert_eq!(store.state().current_page, 3);
        assert_eq!(store.state().schools.len(), 5);
        assert_eq!(store.state().showing_range(), Some((21, 25)));

        let before = store.state().clone();
        assert_eq!(
            store.dispatch(SchoolAction::SetCurrentPage(4)),
            Err(Rejected::PageOutOfRange { page: 4, total_pages: 3 })
        );
        assert_eq!(store.state(), &before);
        assert_eq!(
            store.dispatch(SchoolAction::SetCurrentPage(0)),
            Err(Rejected::PageOutOfRange { page: 0, total_pages: 3 })
        );
    }

    #[test]
    fn every_valid_page_lands_with_at_most_per_page_items() {
        for per_page in PER_PAGE_OPTIONS {
            let mut store: Store<SchoolReducer> = Store::default();
            settle_with(&mut store, SchoolAction::SetPerPage(per_page), Ok(page_of(per_page as usize, 120)));
            for page in 1..=store.state().total_pages() {
                // An upstream that ignores paging returns too much.
                settle_with(&mut store, SchoolAction::SetCurrentPage(page), Ok(page_of(60, 120)));
                assert_eq!(store.state().current_page, page);
                assert!(store.state().schools.len() <= per_page as usize);
            }
        }
    }

    #[test]
    fn set_current_page_updates_page_before_fetch_settles() {
        let mut store: Store<SchoolReducer> = Store::default();
        settle_with(&mut store, SchoolAction::FetchSchoolData { page: 1, per_page: 10 }, Ok(page_of(10, 25)));

        let commands = store.dispatch(SchoolAction::SetCurrentPage(2)).unwrap();
        assert_eq!(store.state().current_page, 2);
        assert_eq!(commands[0].page, 2);
        assert_eq!(commands[0].per_page, 10);
    }

    #[test]
    fn set_current_page_is_rejected_before_any_fetch() {
        let mut store: Store<SchoolReducer> = Store::default();
        assert!(store.dispatch(SchoolAction::SetCurrentPage(1)).is_err());
    }

    #[test]
    fn set_per_page_resets_to_first_page_and_refetches() {
        let mut store: Store<SchoolReducer> = Store::default();
        settle_with(&mut store, SchoolAction::FetchSchoolData { page: 1, per_page: 10 }, Ok(page_of(10, 100)));
        settle_with(&mut store, SchoolAction::SetCurrentPage(4), Ok(page_of(10, 100)));

        let commands = store.dispatch(SchoolAction::SetPerPage(20)).unwrap();

        assert_eq!(store.state().current_page, 1);
        assert_eq!(store.state().per_page, 20);
        assert_eq!(commands[0].page, 1);
        assert_eq!(commands[0].per_page, 20);
        assert_eq!(store.dispatch(SchoolAction::SetPerPage(0)), Err(Rejected::EmptyPageSize));
    }

    // -- search --------------------------------------------------------------

    #[test]
    fn set_search_query_resets_page_and_refetches_with_query() {
        let mut store: Store<SchoolReducer> = Store::default();
        settle_with(&mut store, SchoolAction::FetchSchoolData { page: 1, per_page: 10 }, Ok(page_of(10, 100)));
        settle_with(&mut store, SchoolAction::SetCurrentPage(5), Ok(page_of(10, 100)));

        let commands = store
            .dispatch(SchoolAction::SetSearchQuery("bandung".into()))
            .unwrap();

        assert_eq!(store.state().search_query, "bandung");
        assert_eq!(store.state().current_page, 1);
        assert_eq!(commands[0].page, 1);
        assert_eq!(commands[0].query.as_deref(), Some("bandung"));

        let cleared = store.dispatch(SchoolAction::SetSearchQuery(" ".into())).unwrap();
        assert_eq!(cleared[0].query, None);
    }

    #[test]
    fn filtered_and_grouped_views_follow_the_query() {
        let mut state = SchoolState::default();
        state.schools = vec![
            make_school("1", "SMA Negeri 1 Bandung", "Prov. Jawa Barat"),
            make_school("2", "SD Inpres", "Bali"),
        ];

        assert_eq!(state.filtered_schools().len(), 2);
        let groups = state.grouped_schools();
        assert_eq!(groups["Jawa Barat"].len(), 1);
        assert_eq!(groups["Bali"].len(), 1);

        state.search_query = "inpres".into();
        assert_eq!(state.filtered_schools().len(), 1);
        assert_eq!(state.grouped_schools().keys().copied().collect::<Vec<_>>(), vec!["Bali"]);
    }

    // -- view mode -----------------------------------------------------------

    #[test]
    fn view_mode_is_pure_ui_state() {
        let mut store: Store<SchoolReducer> = Store::default();
        let commands = store.dispatch(SchoolAction::SetViewMode(ViewMode::Grid)).unwrap();
        assert!(commands.is_empty());
        assert_eq!(store.state().view_mode, ViewMode::Grid);
        assert_eq!(ViewMode::Grid.toggled(), ViewMode::List);
    }

    // -- out-of-order completion ---------------------------------------------

    fn race(discard_stale: bool) -> SchoolState {
        let mut store: Store<SchoolReducer> = Store::new(SchoolState::new(10, discard_stale));

        let first = store.dispatch(SchoolAction::SetSearchQuery("ban".into())).unwrap();
        let second = store.dispatch(SchoolAction::SetSearchQuery("bandung".into())).unwrap();
        assert_eq!(store.state().in_flight, 2);

        // The newer request resolves first, the older one last.
        store
            .dispatch(SchoolAction::Loaded {
                generation: second[0].generation,
                page: 1,
                per_page: 10,
                result: Ok(page_of(1, 1)),
            })
            .unwrap();
        assert!(store.state().loading(), "older request still in flight");
        store
            .dispatch(SchoolAction::Loaded {
                generation: first[0].generation,
                page: 1,
                per_page: 10,
                result: Ok(page_of(4, 4)),
            })
            .unwrap();

        assert!(!store.state().loading());
        store.state().clone()
    }

    #[test]
    fn stale_response_overwrites_newer_state_by_default() {
        let state = race(false);
        assert_eq!(state.schools.len(), 4, "last write wins");
        assert_eq!(state.total_data, 4);
    }

    #[test]
    fn stale_response_is_dropped_when_configured() {
        let state = race(true);
        assert_eq!(state.schools.len(), 1);
        assert_eq!(state.total_data, 1);
    }
}
