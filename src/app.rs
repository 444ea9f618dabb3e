use std::cell::Cell;
use std::rc::Rc;

use ratatui::widgets::ListState;

use crate::api::School;
use crate::config::Config;
use crate::effects::{Command, Completion};
use crate::store::news::{NewsAction, NewsReducer, NewsState};
use crate::store::school::{SchoolAction, SchoolReducer, SchoolState, ViewMode, PER_PAGE_OPTIONS};
use crate::store::{Rejected, Store, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Schools,
    News,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Keystrokes edit the active screen's search query.
    Editing,
}

/// One row of the grouped school list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchoolRow<'a> {
    Province { name: &'a str, count: usize },
    School(&'a School),
}

/// Province headers interleaved with their schools, in group order.
pub fn school_rows(state: &SchoolState) -> Vec<SchoolRow<'_>> {
    let mut rows = Vec::new();
    for (name, schools) in state.grouped_schools() {
        rows.push(SchoolRow::Province {
            name,
            count: schools.len(),
        });
        rows.extend(schools.into_iter().map(SchoolRow::School));
    }
    rows
}

pub struct App {
    pub schools: Store<SchoolReducer>,
    pub news: Store<NewsReducer>,
    pub screen: Screen,
    pub mode: InputMode,
    /// Selection in the school list/grid.
    pub school_list: ListState,
    /// Selection in the news list.
    pub news_list: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    /// Commands emitted by the stores, waiting for the effect runner.
    outbox: Vec<Command>,
    /// Set by store subscriptions and input; cleared by the renderer.
    dirty: Rc<Cell<bool>>,
    /// Redraw listener on the store of the visible screen.
    watch: SubscriptionId,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let dirty = Rc::new(Cell::new(true));

        let mut schools = Store::new(SchoolState::new(config.per_page, config.discard_stale_responses));
        let flag = Rc::clone(&dirty);
        let watch = schools.subscribe(move |_| flag.set(true));

        Self {
            schools,
            news: Store::new(NewsState::default()),
            screen: Screen::Schools,
            mode: InputMode::Normal,
            school_list: ListState::default(),
            news_list: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            outbox: Vec::new(),
            dirty,
            watch,
        }
    }

    /// Kick off the initial directory page and the news catalog.
    pub fn start(&mut self) {
        let per_page = self.schools.state().per_page;
        self.dispatch_school(SchoolAction::FetchSchoolData { page: 1, per_page });
        self.dispatch_news(NewsAction::FetchNewsSources);
    }

    /// Hand over everything the stores asked for since the last call.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    /// `true` once per change since the last frame.
    pub fn take_redraw(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn request_redraw(&self) {
        self.dirty.set(true);
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
        self.request_redraw();
    }

    /// Move the redraw listener to the store of the visible screen.
    fn watch_screen(&mut self) {
        let removed = match self.screen {
            Screen::Schools => self.news.unsubscribe(self.watch),
            Screen::News => self.schools.unsubscribe(self.watch),
        };
        if !removed {
            tracing::warn!("redraw listener was not registered");
        }
        let flag = Rc::clone(&self.dirty);
        self.watch = match self.screen {
            Screen::Schools => self.schools.subscribe(move |_| flag.set(true)),
            Screen::News => self.news.subscribe(move |_| flag.set(true)),
        };
    }

    // -- dispatch ------------------------------------------------------------

    fn dispatch_school(&mut self, action: SchoolAction) {
        match self.schools.dispatch(action) {
            Ok(commands) => self.outbox.extend(commands.into_iter().map(Command::School)),
            Err(rejected) => self.reject(rejected),
        }
        self.clamp_selection();
    }

    fn dispatch_news(&mut self, action: NewsAction) {
        match self.news.dispatch(action) {
            Ok(commands) => self.outbox.extend(commands.into_iter().map(Command::News)),
            Err(rejected) => self.reject(rejected),
        }
        self.clamp_selection();
    }

    fn reject(&mut self, rejected: Rejected) {
        tracing::debug!(%rejected, "action rejected");
        self.set_status(rejected.to_string());
    }

    /// Feed a settled command back into the store that issued it.
    ///
    /// The status line is updated here because the hidden screen's store
    /// does not trigger redraws.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::School(action) => {
                if let SchoolAction::Loaded { result, .. } = &action {
                    self.set_status(match result {
                        Ok(page) => format!("Fetched {} schools", page.schools.len()),
                        Err(e) => format!("Error: {e}"),
                    });
                }
                self.dispatch_school(action);
            }
            Completion::News(action) => {
                let status = match &action {
                    // Dropped by the store; nothing to report.
                    NewsAction::PostsLoaded { source, .. } if *source != self.news.state().current_source => None,
                    NewsAction::SourcesLoaded(Ok(catalog)) => {
                        Some(format!("Fetched {} news sources", catalog.endpoints.len()))
                    }
                    NewsAction::PostsLoaded {
                        category,
                        result: Ok(payload),
                        ..
                    } => Some(format!("Fetched {} posts from {category}", payload.data.posts.len())),
                    NewsAction::SourcesLoaded(Err(e)) | NewsAction::PostsLoaded { result: Err(e), .. } => {
                        Some(format!("Error: {e}"))
                    }
                    _ => None,
                };
                if let Some(status) = status {
                    self.set_status(status);
                }
                self.dispatch_news(action);
            }
        }
    }

    // -- screens & search ----------------------------------------------------

    pub fn switch_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Schools => Screen::News,
            Screen::News => Screen::Schools,
        };
        self.watch_screen();
        self.mode = InputMode::Normal;
        self.request_redraw();
    }

    pub fn start_editing(&mut self) {
        self.mode = InputMode::Editing;
        self.request_redraw();
    }

    pub fn stop_editing(&mut self) {
        self.mode = InputMode::Normal;
        self.request_redraw();
    }

    pub fn search_query(&self) -> &str {
        match self.screen {
            Screen::Schools => &self.schools.state().search_query,
            Screen::News => &self.news.state().search_query,
        }
    }

    fn set_search_query(&mut self, query: String) {
        match self.screen {
            Screen::Schools => self.dispatch_school(SchoolAction::SetSearchQuery(query)),
            Screen::News => self.dispatch_news(NewsAction::SetSearchQuery(query)),
        }
    }

    /// Live search: every keystroke updates the query.
    pub fn push_search_char(&mut self, c: char) {
        let mut query = self.search_query().to_string();
        query.push(c);
        self.set_search_query(query);
    }

    pub fn pop_search_char(&mut self) {
        let mut query = self.search_query().to_string();
        if query.pop().is_some() {
            self.set_search_query(query);
        }
    }

    /// "Try Again" for the active screen.
    pub fn retry(&mut self) {
        match self.screen {
            Screen::Schools => self.dispatch_school(SchoolAction::Retry),
            Screen::News => self.dispatch_news(NewsAction::Retry),
        }
    }

    // -- schools -------------------------------------------------------------

    pub fn next_page(&mut self) {
        let state = self.schools.state();
        if state.current_page < state.total_pages() {
            let page = state.current_page + 1;
            self.dispatch_school(SchoolAction::SetCurrentPage(page));
            self.school_list.select(None);
        }
    }

    pub fn previous_page(&mut self) {
        let page = self.schools.state().current_page;
        if page > 1 {
            self.dispatch_school(SchoolAction::SetCurrentPage(page - 1));
            self.school_list.select(None);
        }
    }

    pub fn cycle_per_page(&mut self) {
        let current = self.schools.state().per_page;
        let next = PER_PAGE_OPTIONS
            .iter()
            .position(|&n| n == current)
            .map(|i| PER_PAGE_OPTIONS[(i + 1) % PER_PAGE_OPTIONS.len()])
            .unwrap_or(PER_PAGE_OPTIONS[0]);
        self.dispatch_school(SchoolAction::SetPerPage(next));
        self.school_list.select(None);
    }

    pub fn toggle_view_mode(&mut self) {
        let mode: ViewMode = self.schools.state().view_mode.toggled();
        self.dispatch_school(SchoolAction::SetViewMode(mode));
    }

    // -- news ----------------------------------------------------------------

    fn cycle<'a>(names: &[&'a str], current: &str, forward: bool) -> Option<&'a str> {
        if names.is_empty() {
            return None;
        }
        let len = names.len();
        let next = match names.iter().position(|n| *n == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        Some(names[next])
    }

    fn step_source(&mut self, forward: bool) {
        let state = self.news.state();
        let names: Vec<&str> = state.sources.iter().map(|s| s.name.as_str()).collect();
        if let Some(source) = Self::cycle(&names, &state.current_source, forward).map(str::to_string) {
            self.dispatch_news(NewsAction::SetCurrentSource(source));
            self.news_list.select(None);
        }
    }

    fn step_category(&mut self, forward: bool) {
        let state = self.news.state();
        let names = state.available_categories();
        if let Some(category) = Self::cycle(&names, &state.current_category, forward).map(str::to_string) {
            self.dispatch_news(NewsAction::SetCurrentCategory(category));
            self.news_list.select(None);
        }
    }

    pub fn next_source(&mut self) {
        self.step_source(true);
    }

    pub fn previous_source(&mut self) {
        self.step_source(false);
    }

    pub fn next_category(&mut self) {
        self.step_category(true);
    }

    pub fn previous_category(&mut self) {
        self.step_category(false);
    }

    /// Re-fetch every category of the active source, one after another.
    pub fn refresh_all_categories(&mut self) {
        self.dispatch_news(NewsAction::FetchAllCategoryPosts);
    }

    pub fn toggle_scope(&mut self) {
        let scope = self.news.state().scope.toggled();
        self.dispatch_news(NewsAction::SetScope(scope));
        self.news_list.select(None);
    }

    // -- navigation ----------------------------------------------------------

    /// Number of selectable rows on the active screen.
    pub fn visible_len(&self) -> usize {
        match self.screen {
            Screen::Schools => {
                let state = self.schools.state();
                match state.view_mode {
                    ViewMode::List => school_rows(state).len(),
                    ViewMode::Grid => state.filtered_schools().len(),
                }
            }
            Screen::News => self.news.state().formatted_news().len(),
        }
    }

    fn list_state(&mut self) -> &mut ListState {
        match self.screen {
            Screen::Schools => &mut self.school_list,
            Screen::News => &mut self.news_list,
        }
    }

    fn clamp_selection(&mut self) {
        for screen in [Screen::Schools, Screen::News] {
            let previous = self.screen;
            self.screen = screen;
            let len = self.visible_len();
            let list = self.list_state();
            match list.selected() {
                Some(_) if len == 0 => list.select(None),
                Some(i) if i >= len => list.select(Some(len - 1)),
                _ => {}
            }
            self.screen = previous;
        }
    }

    pub fn select_next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let list = self.list_state();
        let i = match list.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        list.select(Some(i));
        self.request_redraw();
    }

    pub fn select_previous(&mut self) {
        if self.visible_len() == 0 {
            return;
        }
        let list = self.list_state();
        let i = match list.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        list.select(Some(i));
        self.request_redraw();
    }

    pub fn select_first(&mut self) {
        if self.visible_len() != 0 {
            self.list_state().select(Some(0));
            self.request_redraw();
        }
    }

    pub fn select_last(&mut self) {
        let len = self.visible_len();
        if len != 0 {
            self.list_state().select(Some(len - 1));
            self.request_redraw();
        }
    }
}
