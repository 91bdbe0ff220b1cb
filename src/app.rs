use std::time::{Duration, Instant};
use tracing::debug;

use crate::browser::LinkOpener;
use crate::fetch::FetchError;
use crate::models::JobListing;

/// Opacity siblings drop to while another card is hovered.
pub const DIMMED_OPACITY: f32 = 0.25;
/// Length of the fade-in reveal after results land.
pub const FADE_DURATION: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Showing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Query,
    Grid,
}

/// One grid cell. Binds its own index and listing (including the apply
/// URL) at construction, so activation never reads shared loop state.
pub struct Card {
    pub listing: JobListing,
    pub index: usize,
    pub opacity: f32,
    target: f32,
}

impl Card {
    fn new(index: usize, listing: JobListing) -> Self {
        Self {
            listing,
            index,
            opacity: 0.0,
            target: 1.0,
        }
    }
}

/// Result of one fetch task, tagged with the submit generation that
/// spawned it so stale cycles can be recognized.
pub struct FetchOutcome {
    pub generation: u64,
    pub result: Result<Vec<JobListing>, FetchError>,
}

/// The whole UI state. Only the event loop mutates it, through these
/// methods.
pub struct App {
    pub query: String,
    pub state: ViewState,
    pub focus: Focus,
    pub cards: Vec<Card>,
    pub hovered: Option<usize>,
    pub status: Option<String>,
    min_loader: Duration,
    generation: u64,
    submitted_at: Option<Instant>,
    settled: Option<Result<Vec<JobListing>, FetchError>>,
    fade_started: Option<Instant>,
}

impl App {
    pub fn new(min_loader: Duration) -> Self {
        Self {
            query: String::new(),
            state: ViewState::Idle,
            focus: Focus::Query,
            cards: Vec::new(),
            hovered: None,
            status: None,
            min_loader,
            generation: 0,
            submitted_at: None,
            settled: None,
            fade_started: None,
        }
    }

    /// Starts a search cycle. The query text is not inspected: an empty
    /// query fetches just like any other, and the text is never sent to
    /// the endpoint. Returns the generation the caller must tag the
    /// spawned fetch with.
    pub fn submit(&mut self) -> u64 {
        for card in &mut self.cards {
            card.opacity = 0.0;
            card.target = 0.0;
        }
        self.hovered = None;
        self.focus = Focus::Query;
        self.status = None;
        self.state = ViewState::Loading;
        self.settled = None;
        self.fade_started = None;
        self.submitted_at = Some(Instant::now());
        self.generation += 1;
        debug!(generation = self.generation, "submit");
        self.generation
    }

    /// Records a fetch result. Outcomes from a superseded submit are
    /// dropped here, so whichever cycle is current always wins.
    pub fn fetch_settled(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                "discarding stale fetch outcome"
            );
            return;
        }
        self.settled = Some(outcome.result);
    }

    /// Advances time-driven state: the minimum loader display while
    /// Loading, the fade ramp while Showing.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            ViewState::Idle => {}
            ViewState::Loading => {
                let waited = self
                    .submitted_at
                    .is_none_or(|at| now.duration_since(at) >= self.min_loader);
                if waited {
                    if let Some(result) = self.settled.take() {
                        self.apply_outcome(result, now);
                    }
                }
            }
            ViewState::Showing => {
                if let Some(start) = self.fade_started {
                    let t = now.duration_since(start).as_secs_f32()
                        / FADE_DURATION.as_secs_f32();
                    if t >= 1.0 {
                        self.fade_started = None;
                        for card in &mut self.cards {
                            card.opacity = card.target;
                        }
                    } else {
                        let eased = ease(t);
                        for card in &mut self.cards {
                            card.opacity = card.target * eased;
                        }
                    }
                }
            }
        }
    }

    fn apply_outcome(&mut self, result: Result<Vec<JobListing>, FetchError>, now: Instant) {
        match result {
            Ok(listings) => {
                debug!(count = listings.len(), "rendering listings");
                self.cards = listings
                    .into_iter()
                    .enumerate()
                    .map(|(index, listing)| Card::new(index, listing))
                    .collect();
                self.fade_started = Some(now);
            }
            Err(e) => {
                self.cards.clear();
                self.status = Some(format!("Search failed: {e}"));
            }
        }
        self.state = ViewState::Showing;
    }

    /// How long the current load has been running, for the loader sweep.
    pub fn loading_elapsed(&self, now: Instant) -> Option<Duration> {
        if self.state != ViewState::Loading {
            return None;
        }
        self.submitted_at.map(|at| now.duration_since(at))
    }

    pub fn enter_grid(&mut self) {
        if self.state != ViewState::Showing || self.cards.is_empty() {
            return;
        }
        self.focus = Focus::Grid;
        self.hover_enter(self.hovered.unwrap_or(0));
    }

    pub fn leave_grid(&mut self) {
        if self.focus == Focus::Grid {
            self.focus = Focus::Query;
            self.hover_exit();
        }
    }

    /// Dim every card except `index`; the hovered card stays fully
    /// visible.
    pub fn hover_enter(&mut self, index: usize) {
        if index >= self.cards.len() {
            return;
        }
        self.hovered = Some(index);
        for card in &mut self.cards {
            card.target = if card.index == index { 1.0 } else { DIMMED_OPACITY };
        }
        self.sync_opacity();
    }

    /// Restore every card to full visibility.
    pub fn hover_exit(&mut self) {
        self.hovered = None;
        for card in &mut self.cards {
            card.target = 1.0;
        }
        self.sync_opacity();
    }

    pub fn hover_move(&mut self, delta: isize) {
        if self.cards.is_empty() {
            return;
        }
        let current = self.hovered.unwrap_or(0) as isize;
        let last = self.cards.len() as isize - 1;
        let next = (current + delta).clamp(0, last) as usize;
        self.hover_enter(next);
    }

    /// Opens the hovered card's apply link. Exactly one open call, for
    /// that card's URL only.
    pub fn activate(&mut self, opener: &dyn LinkOpener) {
        let Some(index) = self.hovered else { return };
        let Some(card) = self.cards.get(index) else { return };
        match opener.open(&card.listing.apply_url) {
            Ok(()) => self.status = Some(format!("Opened {}", card.listing.apply_url)),
            Err(e) => self.status = Some(format!("{e:#}")),
        }
    }

    // While a fade is running the ramp owns card opacity; outside it,
    // hover changes apply immediately.
    fn sync_opacity(&mut self) {
        if self.fade_started.is_none() {
            for card in &mut self.cards {
                card.opacity = card.target;
            }
        }
    }
}

fn ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::cell::RefCell;

    struct RecordingOpener {
        calls: RefCell<Vec<String>>,
    }

    impl RecordingOpener {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<()> {
            self.calls.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn listing(n: usize) -> JobListing {
        JobListing {
            title: format!("Job {n}"),
            employer: format!("Employer {n}"),
            employment_type: "Full_time".to_string(),
            description: format!("description {n}"),
            apply_url: format!("https://jobs.example/{n}"),
        }
    }

    fn listings(count: usize) -> Vec<JobListing> {
        (0..count).map(listing).collect()
    }

    /// Runs one full submit -> settle -> render cycle, including the
    /// fade, with no minimum loader wait.
    fn complete_cycle(app: &mut App, result: Result<Vec<JobListing>, FetchError>) {
        let generation = app.submit();
        app.fetch_settled(FetchOutcome { generation, result });
        let now = Instant::now();
        app.tick(now);
        app.tick(now + FADE_DURATION);
    }

    #[test]
    fn test_completed_cycle_renders_all_cards() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(3)));

        assert_eq!(app.state, ViewState::Showing);
        assert_eq!(app.cards.len(), 3);
        for (i, card) in app.cards.iter().enumerate() {
            assert_eq!(card.index, i);
            assert_eq!(card.listing.title, format!("Job {i}"));
            assert_eq!(card.listing.employer, format!("Employer {i}"));
            assert_eq!(card.listing.employment_type, "Full_time");
            assert_eq!(card.opacity, 1.0);
        }
    }

    #[test]
    fn test_submit_hides_current_cards() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(2)));

        app.submit();
        assert_eq!(app.state, ViewState::Loading);
        assert_eq!(app.hovered, None);
        assert!(app.cards.iter().all(|c| c.opacity == 0.0));
    }

    #[test]
    fn test_empty_query_still_submits() {
        let mut app = App::new(Duration::ZERO);
        assert!(app.query.is_empty());
        let generation = app.submit();
        assert_eq!(generation, 1);
        assert_eq!(app.state, ViewState::Loading);
    }

    #[test]
    fn test_min_loader_delay_gates_render() {
        let mut app = App::new(Duration::from_secs(2));
        let generation = app.submit();
        app.fetch_settled(FetchOutcome {
            generation,
            result: Ok(listings(1)),
        });
        let submitted = app.submitted_at.unwrap();

        app.tick(submitted + Duration::from_secs(1));
        assert_eq!(app.state, ViewState::Loading);

        app.tick(submitted + Duration::from_secs(2));
        assert_eq!(app.state, ViewState::Showing);
        assert_eq!(app.cards.len(), 1);
    }

    #[test]
    fn test_failure_leaves_grid_empty_with_status() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(
            &mut app,
            Err(FetchError::Format("missing `data` array".to_string())),
        );

        assert_eq!(app.state, ViewState::Showing);
        assert!(app.cards.is_empty());
        assert!(app.loading_elapsed(Instant::now()).is_none());
        let status = app.status.as_deref().unwrap();
        assert!(status.contains("missing `data` array"));
    }

    #[test]
    fn test_stale_outcome_discarded() {
        let mut app = App::new(Duration::ZERO);
        let first = app.submit();
        let second = app.submit();

        // First cycle settles late; its five listings must never render.
        app.fetch_settled(FetchOutcome {
            generation: first,
            result: Ok(listings(5)),
        });
        app.tick(Instant::now());
        assert_eq!(app.state, ViewState::Loading);
        assert!(app.cards.is_empty());

        app.fetch_settled(FetchOutcome {
            generation: second,
            result: Ok(listings(2)),
        });
        let now = Instant::now();
        app.tick(now);
        app.tick(now + FADE_DURATION);
        assert_eq!(app.cards.len(), 2);
    }

    #[test]
    fn test_fade_ramps_hidden_to_visible() {
        let mut app = App::new(Duration::ZERO);
        let generation = app.submit();
        app.fetch_settled(FetchOutcome {
            generation,
            result: Ok(listings(1)),
        });
        let now = Instant::now();

        app.tick(now);
        assert_eq!(app.cards[0].opacity, 0.0);

        app.tick(now + FADE_DURATION / 2);
        let mid = app.cards[0].opacity;
        assert!(mid > 0.0 && mid < 1.0);

        app.tick(now + FADE_DURATION);
        assert_eq!(app.cards[0].opacity, 1.0);
    }

    #[test]
    fn test_hover_dims_siblings_only() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(3)));

        app.enter_grid();
        app.hover_enter(1);
        assert_eq!(app.cards[0].opacity, DIMMED_OPACITY);
        assert_eq!(app.cards[1].opacity, 1.0);
        assert_eq!(app.cards[2].opacity, DIMMED_OPACITY);
    }

    #[test]
    fn test_hover_exit_restores_all() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(3)));

        app.enter_grid();
        app.hover_enter(2);
        app.hover_exit();
        assert!(app.cards.iter().all(|c| c.opacity == 1.0));
        assert_eq!(app.hovered, None);
    }

    #[test]
    fn test_activate_opens_only_hovered_card() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(3)));
        let opener = RecordingOpener::new();

        app.enter_grid();
        app.hover_enter(2);
        app.activate(&opener);

        let calls = opener.calls.borrow();
        assert_eq!(calls.as_slice(), ["https://jobs.example/2"]);
    }

    #[test]
    fn test_activate_without_hover_is_noop() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(1)));
        let opener = RecordingOpener::new();

        app.activate(&opener);
        assert!(opener.calls.borrow().is_empty());
    }

    #[test]
    fn test_enter_grid_requires_rendered_results() {
        let mut app = App::new(Duration::ZERO);
        app.enter_grid();
        assert_eq!(app.focus, Focus::Query);

        app.submit();
        app.enter_grid();
        assert_eq!(app.focus, Focus::Query);
    }

    #[test]
    fn test_hover_move_clamps_to_grid() {
        let mut app = App::new(Duration::ZERO);
        complete_cycle(&mut app, Ok(listings(3)));

        app.enter_grid();
        app.hover_move(-1);
        assert_eq!(app.hovered, Some(0));
        app.hover_move(5);
        assert_eq!(app.hovered, Some(2));
    }
}
