use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};

use _model::{Address, AddressPatch, FieldError, FieldStore, FormEntry, InputAttrs};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::{book::AddressBook, client::AddressClient, lookup::LookupError, validation::validate};

pub const POSTCODE: &str = "postCode";
pub const HOUSE_NUMBER: &str = "houseNumber";
pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";

pub fn address_form() -> Vec<FormEntry> {
    vec![
        FormEntry::new(POSTCODE, "Post Code").with_props(InputAttrs::digits()),
        FormEntry::new(HOUSE_NUMBER, "House number").with_props(InputAttrs::digits()),
    ]
}

pub fn person_form() -> Vec<FormEntry> {
    vec![
        FormEntry::new(FIRST_NAME, "First name"),
        FormEntry::new(LAST_NAME, "Last name"),
    ]
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Validation failed; nothing was looked up.
    Rejected,
    Querying,
    Populated,
    Empty,
    /// The lookup call itself failed.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchState {
    pub phase: Phase,
    pub fields: FieldStore,
    pub person: FieldStore,
    pub results: Vec<Address>,
    pub selected: Option<usize>,
    pub error: Option<String>,
}

impl SearchState {
    pub fn loading(&self) -> bool {
        self.phase == Phase::Querying
    }

    pub fn selected_address(&self) -> Option<&Address> {
        self.selected.and_then(|i| self.results.get(i))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersonError {
    #[error("No address selected, try to select an address or find one if you haven't")]
    NoSelection,
    #[error("Selected address not found")]
    SelectionGone,
    #[error("First name and Last name fields are mandatory!")]
    MissingName,
}

/// Drives one search form and its personal-details form.
///
/// Every transition is a single update of the published [`SearchState`], so an
/// observer never sees a half-applied change. Each submission takes a sequence
/// number; a lookup that returns after a newer submission (or a `clear`) is
/// dropped instead of overwriting the newer state.
pub struct SearchController<C, B> {
    client: C,
    book: B,
    state: watch::Sender<SearchState>,
    latest: AtomicU64,
}

impl<C: AddressClient, B: AddressBook> SearchController<C, B> {
    pub fn new(client: C, book: B) -> Result<Self, FieldError> {
        let (state, _) = watch::channel(SearchState {
            phase: Phase::Idle,
            fields: FieldStore::init(&address_form())?,
            person: FieldStore::init(&person_form())?,
            results: Vec::new(),
            selected: None,
            error: None,
        });

        Ok(Self {
            client,
            book,
            state,
            latest: AtomicU64::new(0),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn book(&self) -> &B {
        &self.book
    }

    pub fn on_change(&self, name: &str, value: &str) {
        self.state
            .send_modify(|s| s.fields = s.fields.on_change(name, value));
    }

    pub fn on_person_change(&self, name: &str, value: &str) {
        self.state
            .send_modify(|s| s.person = s.person.on_change(name, value));
    }

    /// Validates right away; the returned future performs the lookup.
    pub fn submit(&self) -> impl Future<Output = ()> + '_ {
        let fields = self.state.borrow().fields.clone();
        let query = validate(fields.value(POSTCODE), fields.value(HOUSE_NUMBER));

        let mut ticket = 0;
        self.state.send_modify(|s| {
            ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            s.results.clear();
            s.selected = None;
            match &query {
                Ok(_) => {
                    s.phase = Phase::Querying;
                    s.error = None;
                }
                Err(e) => {
                    s.phase = Phase::Rejected;
                    s.error = Some(e.to_string());
                }
            }
        });

        async move {
            let Ok(query) = query else {
                return;
            };

            let result = self
                .client
                .get_addresses(&query.postcode, &query.streetnumber)
                .await;

            // tickets only move while the state is locked
            self.state.send_if_modified(|s| {
                if self.latest.load(Ordering::SeqCst) != ticket {
                    debug!(ticket, "dropping stale lookup response");
                    return false;
                }

                match result {
                    Ok(addresses) => {
                        s.phase = Phase::Populated;
                        s.error = None;
                        s.results = addresses;
                    }
                    Err(e) => {
                        s.phase = failure_phase(&e);
                        s.error = Some(e.to_string());
                        s.results.clear();
                    }
                }
                s.selected = None;
                true
            });
        }
    }

    /// Returns `false` if there is no result at `index`.
    pub fn select(&self, index: usize) -> bool {
        self.state.send_if_modified(|s| {
            if index >= s.results.len() {
                return false;
            }
            s.selected = Some(index);
            s.error = None;
            true
        })
    }

    pub fn submit_person(&self) -> Result<Address, PersonError> {
        let state = self.state();
        let result = person_address(&state);

        match &result {
            Ok(address) => {
                self.book.add(address.clone());
                self.state.send_modify(|s| s.error = None);
            }
            Err(e) => self.state.send_modify(|s| s.error = Some(e.to_string())),
        }
        result
    }

    /// Back to idle in a single update. Also invalidates any lookup still in flight.
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            // anything still in flight is stale from here on
            self.latest.fetch_add(1, Ordering::SeqCst);
            s.phase = Phase::Idle;
            s.fields = s.fields.reset();
            s.results.clear();
            s.selected = None;
            s.error = None;
        });
    }

    pub fn clear_person(&self) {
        self.state.send_modify(|s| {
            s.person = s.person.reset();
            s.error = None;
        });
    }
}

/// Input the server refused is a rejection, whichever client carried it.
fn failure_phase(e: &LookupError) -> Phase {
    match e {
        LookupError::NotFound => Phase::Empty,
        LookupError::Invalid(_) | LookupError::Rejected { status: 400, .. } => Phase::Rejected,
        LookupError::Rejected { .. } | LookupError::Transport(_) => Phase::Failed,
    }
}

fn person_address(state: &SearchState) -> Result<Address, PersonError> {
    let index = match state.selected {
        Some(index) if !state.results.is_empty() => index,
        _ => return Err(PersonError::NoSelection),
    };
    let address = state.results.get(index).ok_or(PersonError::SelectionGone)?;

    let first_name = state.person.value(FIRST_NAME).unwrap_or_default();
    let last_name = state.person.value(LAST_NAME).unwrap_or_default();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(PersonError::MissingName);
    }

    Ok(address
        .clone()
        .patched(AddressPatch::person(first_name, last_name)))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use tokio::time::{sleep, Instant};

    use super::*;
    use crate::{
        book::InMemoryAddressBook,
        client::LocalClient,
        lookup::{LookupService, MockRegistry, MIN_LATENCY},
    };

    type Controller = SearchController<LocalClient<MockRegistry>, InMemoryAddressBook>;

    fn controller() -> Controller {
        let client = LocalClient::new(Arc::new(LookupService::new(MockRegistry)));
        SearchController::new(client, InMemoryAddressBook::new()).unwrap()
    }

    fn fill<C: AddressClient, B: AddressBook>(
        ctl: &SearchController<C, B>,
        postcode: &str,
        number: &str,
    ) {
        ctl.on_change(POSTCODE, postcode);
        ctl.on_change(HOUSE_NUMBER, number);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_input_never_queries() {
        let ctl = controller();
        fill(&ctl, "123", "10");
        let start = Instant::now();
        ctl.submit().await;

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Rejected);
        assert_eq!(state.error.as_deref(), Some("Postcode must be at least 4 digits!"));
        assert!(start.elapsed() < MIN_LATENCY);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_while_querying_then_populated() {
        let ctl = controller();
        let mut rx = ctl.subscribe();
        fill(&ctl, "2000", "12");

        let lookup = ctl.submit();
        assert!(ctl.state().loading());
        lookup.await;

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.phase, Phase::Populated);
        assert!(!state.loading());
        assert!(state.error.is_none());
        assert!(!state.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_publishes_message() {
        let ctl = controller();
        fill(&ctl, "9999", "999");
        ctl.submit().await;

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Empty);
        assert_eq!(state.error.as_deref(), Some("No results found!"));
        assert!(state.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn new_results_replace_old_ones_and_error() {
        let ctl = controller();
        fill(&ctl, "9999", "999");
        ctl.submit().await;
        fill(&ctl, "3000", "5");
        ctl.submit().await;

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Populated);
        assert!(state.error.is_none());
        assert!(state.results.iter().all(|x| x.postcode == "3000"));
    }

    struct FailingClient;

    #[async_trait]
    impl AddressClient for FailingClient {
        async fn get_addresses(
            &self,
            _postcode: &str,
            _streetnumber: &str,
        ) -> Result<Vec<Address>, LookupError> {
            Err(LookupError::Transport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn transport_failure_clears_results_and_selection() {
        let ctl = SearchController::new(FailingClient, InMemoryAddressBook::new()).unwrap();
        ctl.state.send_modify(|s| {
            s.results = vec![Address::default()];
            s.selected = Some(0);
        });
        fill(&ctl, "2000", "12");
        ctl.submit().await;

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some("connection refused"));
        assert!(state.results.is_empty());
        assert_eq!(state.selected, None);
    }

    /// Answers postcode 2000 slowly and everything else quickly.
    struct SlowFirst(LocalClient<MockRegistry>);

    #[async_trait]
    impl AddressClient for SlowFirst {
        async fn get_addresses(&self, p: &str, s: &str) -> Result<Vec<Address>, LookupError> {
            if p == "2000" {
                sleep(Duration::from_secs(2)).await;
            }
            self.0.get_addresses(p, s).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_from_older_submission_is_dropped() {
        let client = SlowFirst(LocalClient::new(Arc::new(LookupService::new(MockRegistry))));
        let ctl = SearchController::new(client, InMemoryAddressBook::new()).unwrap();

        fill(&ctl, "2000", "12");
        let first = ctl.submit();
        fill(&ctl, "3000", "12");
        let second = ctl.submit();
        tokio::join!(first, second);

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Populated);
        assert!(state.results.iter().all(|x| x.postcode == "3000"));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_everything_at_once() {
        let ctl = controller();
        fill(&ctl, "2000", "12");
        ctl.submit().await;
        assert!(ctl.select(0));

        let mut rx = ctl.subscribe();
        ctl.clear();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.results.is_empty());
        assert_eq!(state.selected, None);
        assert_eq!(state.error, None);
        assert!(state.fields.entries().iter().all(|x| x.value.is_empty()));
        assert_eq!(state.fields.len(), 2);
        // exactly one notification for the whole reset
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_in_flight_lookup() {
        let ctl = controller();
        fill(&ctl, "2000", "12");
        let lookup = ctl.submit();
        ctl.clear();
        lookup.await;

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn person_flow_adds_to_book() {
        let ctl = controller();
        ctl.on_person_change(FIRST_NAME, "Ada");
        ctl.on_person_change(LAST_NAME, "Lovelace");
        assert_eq!(ctl.submit_person(), Err(PersonError::NoSelection));
        assert_eq!(
            ctl.state().error.as_deref(),
            Some("No address selected, try to select an address or find one if you haven't")
        );

        fill(&ctl, "2000", "12");
        ctl.submit().await;
        assert!(!ctl.select(99));
        assert!(ctl.select(0));
        assert!(ctl.state().error.is_none());

        let added = ctl.submit_person().unwrap();
        assert_eq!(added.first_name, "Ada");
        assert_eq!(added.postcode, "2000");

        let entries = ctl.book().entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].id.is_empty());
        assert_eq!(entries[0].last_name, "Lovelace");
    }

    #[tokio::test(start_paused = true)]
    async fn person_flow_requires_both_names() {
        let ctl = controller();
        fill(&ctl, "2000", "12");
        ctl.submit().await;
        ctl.select(0);
        ctl.on_person_change(FIRST_NAME, "Ada");

        assert_eq!(ctl.submit_person(), Err(PersonError::MissingName));
        assert_eq!(
            ctl.state().error.as_deref(),
            Some("First name and Last name fields are mandatory!")
        );
        assert!(ctl.book().entries().is_empty());

        ctl.clear_person();
        let state = ctl.state();
        assert_eq!(state.error, None);
        assert_eq!(state.person.value(FIRST_NAME), Some(""));
    }

    #[test]
    fn selection_pointing_past_results() {
        let state = SearchState {
            phase: Phase::Populated,
            fields: FieldStore::default(),
            person: FieldStore::init(&person_form()).unwrap(),
            results: vec![Address::default()],
            selected: Some(3),
            error: None,
        };
        assert_eq!(person_address(&state), Err(PersonError::SelectionGone));
    }

    /// Answers every lookup with the same error body.
    struct RefusingClient(u16);

    #[async_trait]
    impl AddressClient for RefusingClient {
        async fn get_addresses(
            &self,
            _postcode: &str,
            _streetnumber: &str,
        ) -> Result<Vec<Address>, LookupError> {
            Err(LookupError::Rejected {
                status: self.0,
                message: "Postcode must be at least 4 digits!".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn server_side_rejection_is_rejected_not_failed() {
        let ctl = SearchController::new(RefusingClient(400), InMemoryAddressBook::new()).unwrap();
        fill(&ctl, "2000", "12");
        ctl.submit().await;

        let state = ctl.state();
        assert_eq!(state.phase, Phase::Rejected);
        assert_eq!(state.error.as_deref(), Some("Postcode must be at least 4 digits!"));
        assert!(state.results.is_empty());
    }

    #[tokio::test]
    async fn server_error_body_is_a_failure() {
        let ctl = SearchController::new(RefusingClient(500), InMemoryAddressBook::new()).unwrap();
        fill(&ctl, "2000", "12");
        ctl.submit().await;

        assert_eq!(ctl.state().phase, Phase::Failed);
    }

    /// Holds each answer until the other side of the barrier is ready too.
    struct Rendezvous(Arc<tokio::sync::Barrier>);

    #[async_trait]
    impl AddressClient for Rendezvous {
        async fn get_addresses(&self, p: &str, s: &str) -> Result<Vec<Address>, LookupError> {
            self.0.wait().await;
            Ok(vec![Address {
                postcode: p.to_string(),
                house_number: s.to_string(),
                ..Address::default()
            }])
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn clear_racing_a_response_always_wins() {
        for _ in 0..200 {
            let barrier = Arc::new(tokio::sync::Barrier::new(2));
            let ctl = Arc::new(
                SearchController::new(Rendezvous(barrier.clone()), InMemoryAddressBook::new())
                    .unwrap(),
            );
            fill(&*ctl, "2000", "12");

            let lookup = tokio::spawn({
                let ctl = ctl.clone();
                async move { ctl.submit().await }
            });
            let clear = tokio::spawn({
                let ctl = ctl.clone();
                async move {
                    barrier.wait().await;
                    ctl.clear();
                }
            });
            let (lookup, clear) = tokio::join!(lookup, clear);
            lookup.unwrap();
            clear.unwrap();

            let state = ctl.state();
            assert_eq!(state.phase, Phase::Idle);
            assert!(state.results.is_empty());
        }
    }
}
