//! Explicit state containers.
//!
//! Each store owns one state record and changes it only through a
//! [`Reducer`]: a pure function from the current state and an action to the
//! next state plus a list of commands (fetches) for the caller to run.
//! Nothing in here performs I/O; the effect runner in [`crate::effects`]
//! executes the commands and feeds their outcomes back as actions.
//!
//! ```text
//! Action ──► Reducer ──► State ──► subscribers / views
//!               │
//!               └──► Commands ──► effects ──► completion Action
//! ```

pub mod news;
pub mod school;

use thiserror::Error;

/// Why a reducer refused an action.  The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("page {page} is out of range (1..={total_pages})")]
    PageOutOfRange { page: u32, total_pages: u32 },

    #[error("page size must be greater than zero")]
    EmptyPageSize,
}

/// Coarse lifecycle of a store, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing fetched yet and nothing in flight.
    Idle,
    Loading,
    /// The last settled fetch succeeded.
    Ready,
    /// The last settled fetch failed.
    Errored,
}

impl Phase {
    pub fn derive(in_flight: u32, error: Option<&str>, loaded: bool) -> Self {
        if in_flight > 0 {
            Phase::Loading
        } else if error.is_some() {
            Phase::Errored
        } else if loaded {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}

/// Result of reducing one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Update<S, C> {
    pub state: S,
    pub commands: Vec<C>,
}

impl<S, C> Update<S, C> {
    /// A state change with no side effects.
    pub fn state(state: S) -> Self {
        Self {
            state,
            commands: Vec::new(),
        }
    }

    /// A state change that also asks the caller to run `command`.
    pub fn with(state: S, command: C) -> Self {
        Self {
            state,
            commands: vec![command],
        }
    }
}

/// The only place where a store's state transitions happen.
pub trait Reducer {
    type State: Clone + Default;
    type Action;
    type Command;

    fn reduce(
        state: &Self::State,
        action: Self::Action,
    ) -> Result<Update<Self::State, Self::Command>, Rejected>;
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener<S> = Box<dyn FnMut(&S)>;

/// Owns a state record and the listeners interested in it.
pub struct Store<R: Reducer> {
    state: R::State,
    listeners: Vec<(SubscriptionId, Listener<R::State>)>,
    next_id: u64,
}

impl<R: Reducer> Default for Store<R> {
    fn default() -> Self {
        Self::new(R::State::default())
    }
}

impl<R: Reducer> Store<R> {
    pub fn new(state: R::State) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    /// Apply `action`, notify listeners, and hand back the commands the
    /// reducer emitted.  A rejected action changes nothing and notifies
    /// nobody.
    pub fn dispatch(&mut self, action: R::Action) -> Result<Vec<R::Command>, Rejected> {
        let Update { state, commands } = R::reduce(&self.state, action)?;
        self.state = state;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        Ok(commands)
    }

    /// Call `listener` after every accepted action.
    pub fn subscribe(&mut self, listener: impl FnMut(&R::State) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}
