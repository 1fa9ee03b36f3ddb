//! City search box with debounced suggestions and keyboard selection.

use std::{sync::Arc, time::Duration};

use crate::{
    controller::SearchTarget,
    debounce::Debouncer,
    model::CitySuggestion,
    provider::{MIN_SUGGESTION_CHARS, WeatherProvider},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Down,
    Up,
    Enter,
    Escape,
}

/// What the suggestion dropdown currently shows.
#[derive(Debug, PartialEq)]
pub enum Dropdown<'a> {
    Hidden,
    Searching,
    NoResults(&'a str),
    Suggestions {
        items: &'a [CitySuggestion],
        highlighted: Option<usize>,
    },
}

/// Input text, fetched suggestions, focus and highlight.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    query: String,
    suggestions: Vec<CitySuggestion>,
    fetching: bool,
    focused: bool,
    highlighted: Option<usize>,
}

impl SearchBox {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[CitySuggestion] {
        &self.suggestions
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.focused = true;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Escape, or a click outside the box.
    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn hover(&mut self, index: usize) {
        if index < self.suggestions.len() {
            self.highlighted = Some(index);
        }
    }

    pub fn dropdown(&self) -> Dropdown<'_> {
        if !self.focused || self.query.chars().count() < MIN_SUGGESTION_CHARS {
            Dropdown::Hidden
        } else if self.fetching {
            Dropdown::Searching
        } else if self.suggestions.is_empty() {
            Dropdown::NoResults(&self.query)
        } else {
            Dropdown::Suggestions { items: &self.suggestions, highlighted: self.highlighted }
        }
    }

    /// Store results for `query`. Results for a query the user has since
    /// typed past are ignored.
    pub fn apply_suggestions(&mut self, query: &str, found: Vec<CitySuggestion>) -> bool {
        if query != self.query {
            return false;
        }
        self.suggestions = found;
        self.highlighted = None;
        true
    }

    pub fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.highlighted = None;
    }

    /// Handle a navigation key. Returns a target when the key selects one.
    pub fn on_key(&mut self, key: Key) -> Option<SearchTarget> {
        if key == Key::Escape {
            self.blur();
            return None;
        }

        let len = self.suggestions.len();
        if self.fetching || len == 0 {
            return None;
        }

        match key {
            Key::Down => {
                self.highlighted = match self.highlighted {
                    Some(i) if i + 1 < len => Some(i + 1),
                    _ => Some(0),
                };
                None
            }
            Key::Up => {
                self.highlighted = match self.highlighted {
                    Some(i) if i > 0 && i < len => Some(i - 1),
                    _ => Some(len - 1),
                };
                None
            }
            Key::Enter => {
                let index = self.highlighted.filter(|&i| i < len).unwrap_or(0);
                self.select(index)
            }
            Key::Escape => None,
        }
    }

    /// Pick a suggestion by index, by keyboard or pointer.
    pub fn select(&mut self, index: usize) -> Option<SearchTarget> {
        let city = self.suggestions.get(index)?.clone();

        self.query = city.name.clone();
        self.clear_suggestions();
        self.blur();

        Some(SearchTarget::City(city))
    }

    /// Form submission: the highlighted or first suggestion, else the text.
    pub fn submit(&mut self) -> Option<SearchTarget> {
        self.blur();

        let index = self.highlighted.or(if self.suggestions.is_empty() { None } else { Some(0) });
        if let Some(target) = index.and_then(|i| self.select(i)) {
            return Some(target);
        }

        let text = self.query.trim();
        if text.is_empty() {
            return None;
        }

        let target = SearchTarget::Text(text.to_string());
        self.clear_suggestions();
        Some(target)
    }
}

/// [`SearchBox`] wired to an upstream provider through a debouncer.
#[derive(Debug)]
pub struct Autocomplete {
    provider: Arc<dyn WeatherProvider>,
    debouncer: Debouncer<String>,
    state: SearchBox,
}

impl Autocomplete {
    pub fn new(provider: Arc<dyn WeatherProvider>, window: Duration) -> Self {
        Self { provider, debouncer: Debouncer::new(window), state: SearchBox::default() }
    }

    pub fn state(&self) -> &SearchBox {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SearchBox {
        &mut self.state
    }

    /// New input text. Restarts the quiescence window.
    pub fn input(&mut self, text: impl Into<String>) {
        self.state.set_query(text);
        self.debouncer.push(self.state.query.clone());
    }

    /// Wait for the input to go quiet, then refresh the suggestion list.
    ///
    /// Returns `false` if the debouncer has nothing pending or the results
    /// were stale on arrival.
    pub async fn settle(&mut self) -> bool {
        if !self.debouncer.is_pending() {
            return false;
        }
        let Some(query) = self.begin_lookup().await else {
            return true;
        };

        let found = self.lookup(&query).await;
        self.finish_lookup(&query, found)
    }

    /// Wait for the input to go quiet and mark the box as fetching.
    ///
    /// Returns the query to look up, or `None` when nothing is pending or
    /// the query is too short (its suggestions are cleared instead).
    pub async fn begin_lookup(&mut self) -> Option<String> {
        if !self.debouncer.is_pending() {
            return None;
        }
        let query = self.debouncer.recv().await?;

        if query.chars().count() < MIN_SUGGESTION_CHARS {
            self.state.clear_suggestions();
            return None;
        }

        self.state.fetching = true;
        Some(query)
    }

    pub async fn lookup(&self, query: &str) -> Vec<CitySuggestion> {
        self.provider.fetch_suggestions(query).await
    }

    /// Store the results of [`Autocomplete::lookup`] and clear the loading flag.
    pub fn finish_lookup(&mut self, query: &str, found: Vec<CitySuggestion>) -> bool {
        self.state.fetching = false;
        tracing::debug!(%query, count = found.len(), "Suggestions fetched");
        self.state.apply_suggestions(query, found)
    }

    pub fn on_key(&mut self, key: Key) -> Option<SearchTarget> {
        let target = self.state.on_key(key);
        if target.is_some() {
            self.debouncer.cancel();
        }
        target
    }

    pub fn select(&mut self, index: usize) -> Option<SearchTarget> {
        let target = self.state.select(index);
        if target.is_some() {
            self.debouncer.cancel();
        }
        target
    }

    pub fn submit(&mut self) -> Option<SearchTarget> {
        self.debouncer.cancel();
        self.state.submit()
    }
}
