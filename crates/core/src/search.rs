use std::time::{Duration, Instant};

use crate::domain::page::{Page, PageRequest};

/// Fixed debounce window applied to search input before re-querying.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Debounce state over an injected clock. `input` records keystrokes;
/// `poll` emits at most one settled query per window. An emitted `None`
/// means the input was cleared and the next fetch carries no `search`
/// parameter.
#[derive(Clone, Debug, Default)]
pub struct SearchDebouncer {
    pending: Option<(String, Instant)>,
}

impl SearchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now));
    }

    pub fn poll(&mut self, now: Instant) -> Option<Option<String>> {
        let (_, entered_at) = self.pending.as_ref()?;
        if now.duration_since(*entered_at) < DEBOUNCE_WINDOW {
            return None;
        }
        let (text, _) = self.pending.take()?;
        let trimmed = text.trim();
        Some(if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Generation token guarding a paged listing against out-of-order
/// responses under rapid pagination or search changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Client-side state of one paginated listing. Responses are applied only
/// when their token matches the newest issued request.
#[derive(Clone, Debug)]
pub struct PagedState<T> {
    pub request: PageRequest,
    pub items: Vec<T>,
    pub total: u64,
    generation: u64,
    in_flight: Option<u64>,
}

impl<T> PagedState<T> {
    pub fn new(request: PageRequest) -> Self {
        Self { request, items: Vec::new(), total: 0, generation: 0, in_flight: None }
    }

    /// Marks a new request as the freshest; any response carrying an older
    /// token becomes stale.
    pub fn begin_request(&mut self) -> RequestToken {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        RequestToken(self.generation)
    }

    /// Applies a response unless a newer request has been initiated since.
    /// Returns false for dropped stale responses.
    pub fn apply_response(&mut self, token: RequestToken, page: Page<T>) -> bool {
        if self.in_flight != Some(token.0) {
            return false;
        }
        self.items = page.data;
        self.total = page.total;
        self.in_flight = None;
        true
    }

    pub fn page_count(&self) -> u32 {
        Page::<()> { data: Vec::new(), total: self.total }.page_count(self.request.page_size)
    }

    pub fn set_page(&mut self, page: u32) {
        self.request.page = page.clamp(1, self.page_count().max(1));
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.request.search = search;
        self.request.page = 1;
    }
}
