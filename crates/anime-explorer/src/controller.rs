//! Query/pagination controller.
//!
//! Turns user actions into requests, sends them through the client, and hands
//! results to a [`RenderTarget`]. Errors never escape: every action ends with
//! the renderer showing either data or a message.
//!
//! Each list request takes a new generation number when it starts. A response
//! is applied only if no newer list request has started since; otherwise it is
//! dropped. Detail requests are numbered separately.
//!
//! The loading indicator is shared by both kinds of request: it appears when
//! the first request starts and is hidden once none are in flight.

use crate::api::{JikanClient, Transport};
use crate::pagination::PaginationInfo;
use crate::query::{QueryState, SearchCriteria};
use crate::render::{DetailView, RenderTarget, LIST_FAILED};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// How an action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Data was rendered
    Rendered,
    /// Request succeeded but there was nothing to show
    Empty,
    /// Request failed and an error message was rendered
    Failed,
    /// A newer request superseded this one; nothing was rendered
    Discarded,
    /// No request was needed (e.g. "next" on the last page)
    Skipped,
}

#[derive(Debug, Default)]
struct Session {
    query: QueryState,
    pagination: PaginationInfo,
    list_generation: u64,
    detail_generation: u64,
    in_flight: usize,
}

/// Owns the session state and drives the client and renderer
pub struct Controller<T, R> {
    client: JikanClient<T>,
    renderer: R,
    session: Mutex<Session>,
}

impl<T: Transport, R: RenderTarget> Controller<T, R> {
    pub fn new(client: JikanClient<T>, renderer: R) -> Self {
        Self {
            client,
            renderer,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn client(&self) -> &JikanClient<T> {
        &self.client
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Query of the last successful list request (criteria may be newer)
    pub fn query(&self) -> QueryState {
        self.session().query.clone()
    }

    /// Pagination of the last successful list request
    pub fn pagination(&self) -> PaginationInfo {
        self.session().pagination
    }

    /// Replace search term and filters, then load the first page
    pub async fn search(&self, criteria: SearchCriteria) -> Outcome {
        self.search_at(criteria, 1).await
    }

    /// Replace search term and filters, then load `page`
    pub async fn search_at(&self, criteria: SearchCriteria, page: u32) -> Outcome {
        let (generation, query) = {
            let mut session = self.session();
            session.query = QueryState::new(criteria, session.query.page);
            session.list_generation += 1;
            (session.list_generation, session.query.with_page(page))
        };

        self.run_list_request(generation, query).await
    }

    /// Load `page` with the current criteria
    pub async fn fetch_page(&self, page: u32) -> Outcome {
        let (generation, query) = {
            let mut session = self.session();
            session.list_generation += 1;
            (session.list_generation, session.query.with_page(page))
        };

        self.run_list_request(generation, query).await
    }

    /// Page selector click; the active page is not reloaded
    pub async fn go_to_page(&self, page: u32) -> Outcome {
        if page == self.pagination().current_page() {
            debug!(page, "Already on requested page");
            return Outcome::Skipped;
        }
        self.fetch_page(page).await
    }

    pub async fn next_page(&self) -> Outcome {
        let pagination = self.pagination();
        if !pagination.has_next() {
            debug!(page = pagination.current_page(), "No next page");
            return Outcome::Skipped;
        }
        self.fetch_page(pagination.current_page() + 1).await
    }

    pub async fn previous_page(&self) -> Outcome {
        let pagination = self.pagination();
        if !pagination.has_previous() {
            debug!(page = pagination.current_page(), "No previous page");
            return Outcome::Skipped;
        }
        self.fetch_page(pagination.current_page() - 1).await
    }

    /// Load and render the full details of one anime
    pub async fn show_detail(&self, mal_id: u32) -> Outcome {
        let generation = {
            let mut session = self.session();
            session.detail_generation += 1;
            self.begin_request(&mut session);
            session.detail_generation
        };

        info!(mal_id, generation, "Fetching anime details");
        let result = self.client.get_anime_details(mal_id).await;

        let mut session = self.session();
        let outcome = if session.detail_generation != generation {
            debug!(mal_id, generation, "Discarding superseded detail response");
            Outcome::Discarded
        } else {
            match result {
                Ok(response) => match response.data {
                    Some(details) => {
                        self.renderer.render_detail(DetailView::Found(&details));
                        Outcome::Rendered
                    }
                    None => {
                        self.renderer.render_detail(DetailView::NotFound);
                        Outcome::Empty
                    }
                },
                Err(e) => {
                    warn!(mal_id, error = %e, "Failed to fetch anime details");
                    self.renderer.render_detail(DetailView::Failed);
                    Outcome::Failed
                }
            }
        };

        self.end_request(&mut session);
        outcome
    }

    async fn run_list_request(&self, generation: u64, query: QueryState) -> Outcome {
        self.begin_request(&mut self.session());
        info!(
            page = query.page,
            generation,
            term = query.criteria.trimmed_term().unwrap_or_default(),
            "Fetching anime list"
        );

        let result = self.client.search(&query).await;

        let mut session = self.session();
        let outcome = if session.list_generation != generation {
            debug!(
                page = query.page,
                generation,
                latest = session.list_generation,
                "Discarding superseded list response"
            );
            Outcome::Discarded
        } else {
            match result {
                Ok(response) => {
                    let pagination = PaginationInfo::from_response(response.pagination.as_ref());
                    session.query = QueryState::new(query.criteria, pagination.current_page());
                    session.pagination = pagination;

                    debug!(
                        items = response.data.len(),
                        current_page = pagination.current_page(),
                        last_page = pagination.last_page(),
                        "Anime list loaded"
                    );
                    self.renderer.render_list(&response.data, &pagination);

                    if response.data.is_empty() {
                        Outcome::Empty
                    } else {
                        Outcome::Rendered
                    }
                }
                Err(e) => {
                    warn!(page = query.page, error = %e, "Failed to fetch anime list");
                    self.renderer.render_error(LIST_FAILED);
                    Outcome::Failed
                }
            }
        };

        self.end_request(&mut session);
        outcome
    }

    fn begin_request(&self, session: &mut Session) {
        session.in_flight += 1;
        if session.in_flight == 1 {
            self.renderer.set_loading_visible(true);
        }
    }

    fn end_request(&self, session: &mut Session) {
        session.in_flight = session.in_flight.saturating_sub(1);
        if session.in_flight == 0 {
            self.renderer.set_loading_visible(false);
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ThrottledGate, DEFAULT_MIN_INTERVAL};
    use crate::query::{AnimeType, SortKey};
    use crate::testing::{list_body, DetailEvent, FakeTransport, RecordingRenderer, RenderEvent};
    use reqwest::{StatusCode, Url};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const BASE: &str = "https://api.jikan.moe/v4/anime";

    type TestController = Controller<Arc<FakeTransport>, RecordingRenderer>;
    type ThrottledController = Controller<ThrottledGate<Arc<FakeTransport>>, RecordingRenderer>;

    fn controller(fake: &Arc<FakeTransport>) -> TestController {
        Controller::new(
            JikanClient::new(fake.clone(), BASE).unwrap(),
            RecordingRenderer::default(),
        )
    }

    fn throttled_controller(fake: &Arc<FakeTransport>) -> ThrottledController {
        let base = Url::parse(BASE).unwrap();
        let gate = ThrottledGate::new(fake.clone(), &base, DEFAULT_MIN_INTERVAL);
        Controller::new(JikanClient::new(gate, BASE).unwrap(), RecordingRenderer::default())
    }

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    fn loading_events(controller: &TestController) -> Vec<RenderEvent> {
        controller
            .renderer()
            .events()
            .into_iter()
            .filter(|e| matches!(e, RenderEvent::Loading(_)))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_page_updates_state() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, &list_body(&["Bleach", "Naruto"], 3, 8));
        let controller = controller(&fake);

        assert_eq!(controller.fetch_page(3).await, Outcome::Rendered);
        assert_eq!(controller.query().page, 3);
        assert_eq!(controller.pagination(), PaginationInfo::new(3, 8));

        assert_eq!(
            controller.renderer().events(),
            vec![
                RenderEvent::Loading(true),
                RenderEvent::List {
                    titles: vec!["Bleach".to_string(), "Naruto".to_string()],
                    current_page: 3,
                    last_page: 8,
                },
                RenderEvent::Loading(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_builds_request_from_criteria() {
        let fake = Arc::new(FakeTransport::new());
        let controller = controller(&fake);

        let criteria = SearchCriteria {
            search_term: " naruto ".to_string(),
            anime_type: Some(AnimeType::Tv),
            status: None,
            sort: Some(SortKey::Score),
        };
        controller.search(criteria.clone()).await;

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        let params = query_of(&calls[0]);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["page", "limit", "q", "type", "order_by", "sort"]);
        assert!(params.contains(&("q".to_string(), "naruto".to_string())));
        assert!(params.contains(&("page".to_string(), "1".to_string())));
        assert_eq!(controller.query().criteria, criteria);
    }

    #[tokio::test]
    async fn test_search_resets_to_first_page() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, &list_body(&["A"], 4, 9));
        fake.push_response(StatusCode::OK, &list_body(&["B"], 1, 2));
        let controller = controller(&fake);

        controller.fetch_page(4).await;
        controller
            .search(SearchCriteria {
                search_term: "bebop".to_string(),
                ..Default::default()
            })
            .await;

        let params = query_of(&fake.calls()[1]);
        assert!(params.contains(&("page".to_string(), "1".to_string())));
        assert_eq!(controller.query().page, 1);
    }

    #[tokio::test]
    async fn test_empty_result_renders_empty_list() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, r#"{"data": []}"#);
        let controller = controller(&fake);

        assert_eq!(controller.fetch_page(1).await, Outcome::Empty);
        assert!(controller.renderer().events().contains(&RenderEvent::List {
            titles: vec![],
            current_page: 1,
            last_page: 1,
        }));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_page() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, &list_body(&["A"], 2, 5));
        fake.push_response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        fake.push_error("connection refused");
        let controller = controller(&fake);

        controller.fetch_page(2).await;
        assert_eq!(controller.next_page().await, Outcome::Failed);
        assert_eq!(controller.query().page, 2);
        assert_eq!(controller.pagination(), PaginationInfo::new(2, 5));

        assert_eq!(controller.go_to_page(4).await, Outcome::Failed);
        assert_eq!(controller.query().page, 2);

        let errors: Vec<_> = controller
            .renderer()
            .events()
            .into_iter()
            .filter(|e| matches!(e, RenderEvent::Error(_)))
            .collect();
        assert_eq!(errors, vec![RenderEvent::Error(LIST_FAILED.to_string()); 2]);
        assert_eq!(controller.renderer().events().last(), Some(&RenderEvent::Loading(false)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_failure() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, "not json");
        let controller = controller(&fake);

        assert_eq!(controller.fetch_page(1).await, Outcome::Failed);
    }

    #[tokio::test]
    async fn test_out_of_range_pagination_is_clamped() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, &list_body(&["A"], 7, 3));
        let controller = controller(&fake);

        controller.fetch_page(7).await;
        assert_eq!(controller.pagination(), PaginationInfo::new(3, 3));
        assert_eq!(controller.query().page, 3);
    }

    #[tokio::test]
    async fn test_negative_reported_page_is_clamped() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(
            StatusCode::OK,
            r#"{"data": [{"mal_id": 1, "title": "A"}], "pagination": {"current_page": -1, "last_visible_page": 3, "has_next_page": null}}"#,
        );
        let controller = controller(&fake);

        assert_eq!(controller.fetch_page(2).await, Outcome::Rendered);
        assert_eq!(controller.pagination(), PaginationInfo::new(1, 3));
        assert_eq!(controller.query().page, 1);
    }

    #[tokio::test]
    async fn test_null_title_still_renders() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, r#"{"data": [{"mal_id": 1, "title": null}]}"#);
        let controller = controller(&fake);

        assert_eq!(controller.fetch_page(1).await, Outcome::Rendered);
        assert!(controller.renderer().events().contains(&RenderEvent::List {
            titles: vec![String::new()],
            current_page: 1,
            last_page: 1,
        }));
    }

    #[tokio::test]
    async fn test_navigation_bounds_skip_requests() {
        let fake = Arc::new(FakeTransport::new());
        let controller = controller(&fake);

        assert_eq!(controller.previous_page().await, Outcome::Skipped);
        assert_eq!(controller.next_page().await, Outcome::Skipped);
        assert_eq!(controller.go_to_page(1).await, Outcome::Skipped);
        assert!(fake.calls().is_empty());
        assert!(controller.renderer().events().is_empty());
    }

    #[tokio::test]
    async fn test_previous_and_next_pages() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, &list_body(&["A"], 2, 3));
        fake.push_response(StatusCode::OK, &list_body(&["B"], 3, 3));
        fake.push_response(StatusCode::OK, &list_body(&["C"], 2, 3));
        let controller = controller(&fake);

        controller.fetch_page(2).await;
        assert_eq!(controller.next_page().await, Outcome::Rendered);
        assert_eq!(controller.next_page().await, Outcome::Skipped);
        assert_eq!(controller.previous_page().await, Outcome::Rendered);

        let pages: Vec<String> = fake
            .calls()
            .iter()
            .flat_map(query_of)
            .filter(|(k, _)| k == "page")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(pages, vec!["2", "3", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_delayed(StatusCode::OK, &list_body(&["Old"], 2, 5), Duration::from_secs(5));
        fake.push_response(StatusCode::OK, &list_body(&["New"], 3, 5));
        let controller = throttled_controller(&fake);

        let (first, second) = tokio::join!(controller.fetch_page(2), controller.fetch_page(3));
        assert_eq!(first, Outcome::Discarded);
        assert_eq!(second, Outcome::Rendered);
        assert_eq!(controller.query().page, 3);

        let lists: Vec<_> = controller
            .renderer()
            .events()
            .into_iter()
            .filter(|e| matches!(e, RenderEvent::List { .. }))
            .collect();
        assert_eq!(
            lists,
            vec![RenderEvent::List {
                titles: vec!["New".to_string()],
                current_page: 3,
                last_page: 5,
            }]
        );

        let events = controller.renderer().events();
        let loading: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, RenderEvent::Loading(_)))
            .collect();
        assert_eq!(loading, vec![&RenderEvent::Loading(true), &RenderEvent::Loading(false)]);
        assert_eq!(events.last(), Some(&RenderEvent::Loading(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_stays_visible_until_all_requests_settle() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_delayed(StatusCode::OK, &list_body(&["Monster"], 1, 1), Duration::from_secs(3));
        fake.push_response(StatusCode::OK, r#"{"data": {"mal_id": 19, "title": "Monster"}}"#);
        let controller = controller(&fake);

        let (list, detail) = tokio::join!(controller.fetch_page(1), controller.show_detail(19));
        assert_eq!(list, Outcome::Rendered);
        assert_eq!(detail, Outcome::Rendered);

        assert_eq!(
            controller.renderer().events(),
            vec![
                RenderEvent::Loading(true),
                RenderEvent::Detail(DetailEvent::Found("Monster".to_string())),
                RenderEvent::List {
                    titles: vec!["Monster".to_string()],
                    current_page: 1,
                    last_page: 1,
                },
                RenderEvent::Loading(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_loading_toggles_per_sequential_request() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_error("connection reset");
        let controller = controller(&fake);

        controller.fetch_page(1).await;
        controller.show_detail(1).await;
        assert_eq!(
            loading_events(&controller),
            vec![
                RenderEvent::Loading(true),
                RenderEvent::Loading(false),
                RenderEvent::Loading(true),
                RenderEvent::Loading(false),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_through_gate_are_spaced() {
        let fake = Arc::new(FakeTransport::new());
        let controller = throttled_controller(&fake);

        controller.fetch_page(1).await;
        controller.show_detail(20).await;
        controller.fetch_page(1).await;

        let times: Vec<Instant> = fake.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= DEFAULT_MIN_INTERVAL);
        }
        assert_eq!(controller.client().transport().calls_issued(), 3);
    }

    #[tokio::test]
    async fn test_detail_found() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(
            StatusCode::OK,
            r#"{"data": {"mal_id": 5114, "title": "Fullmetal Alchemist: Brotherhood"}}"#,
        );
        let controller = controller(&fake);

        assert_eq!(controller.show_detail(5114).await, Outcome::Rendered);
        assert_eq!(fake.calls()[0].path(), "/v4/anime/5114/full");
        assert!(controller.renderer().events().contains(&RenderEvent::Detail(
            DetailEvent::Found("Fullmetal Alchemist: Brotherhood".to_string())
        )));
    }

    #[tokio::test]
    async fn test_detail_missing_and_failed() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, "{}");
        fake.push_response(StatusCode::NOT_FOUND, r#"{"status": 404}"#);
        let controller = controller(&fake);

        assert_eq!(controller.show_detail(1).await, Outcome::Empty);
        assert_eq!(controller.show_detail(2).await, Outcome::Failed);

        let details: Vec<_> = controller
            .renderer()
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Detail(d) => Some(d),
                _ => None,
            })
            .collect();
        assert_eq!(details, vec![DetailEvent::NotFound, DetailEvent::Failed]);
    }

    #[tokio::test]
    async fn test_detail_does_not_touch_list_state() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_response(StatusCode::OK, &list_body(&["A"], 2, 4));
        fake.push_error("timeout");
        let controller = controller(&fake);

        controller.fetch_page(2).await;
        controller.show_detail(99).await;
        assert_eq!(controller.pagination(), PaginationInfo::new(2, 4));
    }
}
