//! News browsing store.
//!
//! Holds the source catalog, the active source and category, the posts
//! fetched per category of the active source, and the search query.
//!
//! Fetching "all categories" is a sweep driven by the reducer itself: the
//! pending category names sit in a queue and each settled fetch of the
//! current sweep, success or failure, issues the next one.  Categories are
//! therefore fetched strictly one after another and a failing category does
//! not stop the rest.

use std::collections::{BTreeMap, VecDeque};

use crate::api::{FetchFailure, NewsChannel, NewsPayload, NewsSource, SourceCatalog};
use crate::view::{self, FormattedNewsItem};

use super::{Phase, Reducer, Rejected, Update};

pub const DEFAULT_SOURCE: &str = "antara";
pub const DEFAULT_CATEGORY: &str = "terbaru";

/// Which posts the formatted view draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewsScope {
    /// Only the active category.
    #[default]
    Category,
    /// Every category fetched for the active source.
    AllCategories,
}

impl NewsScope {
    pub fn toggled(self) -> Self {
        match self {
            NewsScope::Category => NewsScope::AllCategories,
            NewsScope::AllCategories => NewsScope::Category,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsState {
    pub sources: Vec<NewsSource>,
    pub current_source: String,
    pub current_category: String,
    /// Fetched channels of the active source, keyed by category name.
    pub channels: BTreeMap<String, NewsChannel>,
    pub search_query: String,
    pub scope: NewsScope,
    pub error: Option<String>,
    pub in_flight: u32,
    pub catalog_loaded: bool,
    /// Id of the newest all-categories sweep.
    pub sweep: u64,
    /// Categories the current sweep has yet to fetch.
    pub pending: VecDeque<String>,
    /// Categories of the active source whose latest fetch failed.
    pub failed: Vec<String>,
}

impl Default for NewsState {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            current_source: DEFAULT_SOURCE.to_string(),
            current_category: DEFAULT_CATEGORY.to_string(),
            channels: BTreeMap::new(),
            search_query: String::new(),
            scope: NewsScope::default(),
            error: None,
            in_flight: 0,
            catalog_loaded: false,
            sweep: 0,
            pending: VecDeque::new(),
            failed: Vec::new(),
        }
    }
}

impl NewsState {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn phase(&self) -> Phase {
        Phase::derive(self.in_flight, self.error.as_deref(), self.catalog_loaded)
    }

    pub fn current_source_data(&self) -> Option<&NewsSource> {
        self.sources.iter().find(|s| s.name == self.current_source)
    }

    /// Category names of the active source in catalog order.
    pub fn available_categories(&self) -> Vec<&str> {
        self.current_source_data()
            .map(|s| s.category_names().collect())
            .unwrap_or_default()
    }

    /// Descriptor of the active category, once fetched.
    pub fn current_channel(&self) -> Option<&NewsChannel> {
        self.channels.get(&self.current_category)
    }

    /// Posts in scope, filtered by the search query and annotated with a
    /// localized date and their category.
    pub fn formatted_news(&self) -> Vec<FormattedNewsItem> {
        match self.scope {
            NewsScope::Category => {
                let category = self.current_category.as_str();
                let posts = self
                    .channels
                    .get(category)
                    .map(|c| c.posts.as_slice())
                    .unwrap_or_default();
                view::format_news(posts.iter().map(|p| (category, p)), &self.search_query)
            }
            NewsScope::AllCategories => {
                // Catalog order first, then anything fetched outside it.
                let mut order = self.available_categories();
                for name in self.channels.keys() {
                    if !order.contains(&name.as_str()) {
                        order.push(name.as_str());
                    }
                }
                let posts = order.into_iter().flat_map(|category| {
                    self.channels
                        .get(category)
                        .into_iter()
                        .flat_map(move |c| c.posts.iter().map(move |p| (category, p)))
                });
                view::format_news(posts, &self.search_query)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewsAction {
    FetchNewsSources,
    SourcesLoaded(Result<SourceCatalog, FetchFailure>),
    /// Switch source, reset the category, drop every fetched post, and
    /// sweep the new source's categories.
    SetCurrentSource(String),
    /// Switch category and fetch just that category.
    SetCurrentCategory(String),
    FetchAllCategoryPosts,
    SetSearchQuery(String),
    SetScope(NewsScope),
    /// "Try Again": refetch the catalog if it never loaded, otherwise the
    /// categories whose latest fetch failed (all of them if none did).
    Retry,
    /// A posts fetch settled.  `sweep` is `Some` for sweep fetches.
    PostsLoaded {
        source: String,
        category: String,
        sweep: Option<u64>,
        result: Result<NewsPayload, FetchFailure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsCommand {
    FetchSources,
    FetchPosts {
        source: String,
        category: String,
        sweep: Option<u64>,
    },
}

pub struct NewsReducer;

impl NewsReducer {
    fn fetch_posts(next: &mut NewsState, category: String, sweep: Option<u64>) -> NewsCommand {
        next.in_flight += 1;
        NewsCommand::FetchPosts {
            source: next.current_source.clone(),
            category,
            sweep,
        }
    }

    /// Start a new sweep over the active source's categories.
    fn start_sweep(next: NewsState) -> Update<NewsState, NewsCommand> {
        let categories = next
            .available_categories()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self::sweep_over(next, categories)
    }

    fn sweep_over(mut next: NewsState, categories: VecDeque<String>) -> Update<NewsState, NewsCommand> {
        next.sweep += 1;
        next.error = None;
        next.pending = categories;

        if next.pending.is_empty() {
            tracing::warn!(source = %next.current_source, "no categories to fetch for source");
        }
        match next.pending.pop_front() {
            Some(category) => {
                let sweep = Some(next.sweep);
                let command = Self::fetch_posts(&mut next, category, sweep);
                Update::with(next, command)
            }
            None => Update::state(next),
        }
    }

    fn settle_posts(
        mut next: NewsState,
        source: String,
        category: String,
        sweep: Option<u64>,
        result: Result<NewsPayload, FetchFailure>,
    ) -> Update<NewsState, NewsCommand> {
        next.in_flight = next.in_flight.saturating_sub(1);

        if source != next.current_source {
            tracing::debug!(%source, %category, "dropping posts for a source that is no longer active");
        } else {
            match result {
                Ok(payload) => {
                    next.failed.retain(|c| *c != category);
                    if next.failed.is_empty() {
                        next.error = None;
                    }
                    next.channels.insert(category, payload.data);
                }
                Err(failure) => {
                    tracing::warn!(%failure, %source, %category, "news fetch failed");
                    next.error = Some(failure.to_string());
                    if !next.failed.contains(&category) {
                        next.failed.push(category);
                    }
                }
            }
        }

        // Only a completion of the current sweep advances it.
        if sweep.is_some() && sweep == Some(next.sweep) {
            if let Some(category) = next.pending.pop_front() {
                let command = Self::fetch_posts(&mut next, category, sweep);
                return Update::with(next, command);
            }
        }
        Update::state(next)
    }
}

impl Reducer for NewsReducer {
    type State = NewsState;
    type Action = NewsAction;
    type Command = NewsCommand;

    fn reduce(state: &NewsState, action: NewsAction) -> Result<Update<NewsState, NewsCommand>, Rejected> {
        let mut next = state.clone();
        let update = match action {
            NewsAction::FetchNewsSources => {
                next.in_flight += 1;
                next.error = None;
                Update::with(next, NewsCommand::FetchSources)
            }
            NewsAction::SourcesLoaded(result) => {
                next.in_flight = next.in_flight.saturating_sub(1);
                match result {
                    Ok(catalog) => {
                        next.sources = catalog.endpoints;
                        next.catalog_loaded = true;
                        Self::start_sweep(next)
                    }
                    Err(failure) => {
                        tracing::warn!(%failure, "news catalog fetch failed");
                        next.error = Some(failure.to_string());
                        Update::state(next)
                    }
                }
            }
            NewsAction::SetCurrentSource(source) => {
                next.current_source = source;
                next.current_category = DEFAULT_CATEGORY.to_string();
                next.channels.clear();
                next.failed.clear();
                Self::start_sweep(next)
            }
            NewsAction::SetCurrentCategory(category) => {
                next.current_category = category.clone();
                next.error = None;
                let command = Self::fetch_posts(&mut next, category, None);
                Update::with(next, command)
            }
            NewsAction::FetchAllCategoryPosts => Self::start_sweep(next),
            NewsAction::SetSearchQuery(query) => {
                next.search_query = query;
                Update::state(next)
            }
            NewsAction::SetScope(scope) => {
                next.scope = scope;
                Update::state(next)
            }
            NewsAction::Retry => {
                if !next.catalog_loaded {
                    return Self::reduce(&next, NewsAction::FetchNewsSources);
                }
                if next.failed.is_empty() {
                    Self::start_sweep(next)
                } else {
                    let failed = next.failed.iter().cloned().collect();
                    Self::sweep_over(next, failed)
                }
            }
            NewsAction::PostsLoaded {
                source,
                category,
                sweep,
                result,
            } => Self::settle_posts(next, source, category, sweep, result),
        };
        Ok(update)
    }
}
