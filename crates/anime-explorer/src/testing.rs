//! Test doubles shared by the unit tests.

use crate::api::{AnimeEntry, ApiError, ApiResult, RawResponse, Transport};
use crate::pagination::PaginationInfo;
use crate::render::{DetailView, RenderTarget};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct Scripted {
    response: ApiResult<RawResponse>,
    delay: Duration,
}

/// Transport that replays scripted responses in call order
///
/// Unscripted calls answer `200 {"data": []}` immediately.
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(Url, Instant)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: StatusCode, body: &str) {
        self.push_delayed(status, body, Duration::ZERO);
    }

    /// Response that takes `delay` to arrive after the call is issued
    pub fn push_delayed(&self, status: StatusCode, body: &str, delay: Duration) {
        self.script.lock().unwrap().push_back(Scripted {
            response: Ok(RawResponse::new(status, body)),
            delay,
        });
    }

    pub fn push_error(&self, message: &str) {
        self.script.lock().unwrap().push_back(Scripted {
            response: Err(ApiError::Transport(message.to_string())),
            delay: Duration::ZERO,
        });
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> ApiResult<RawResponse> {
        self.calls.lock().unwrap().push((url.clone(), Instant::now()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted { response, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Ok(RawResponse::new(StatusCode::OK, r#"{"data": []}"#)),
        }
    }
}

/// JSON body for a search response with the given titles
pub fn list_body(titles: &[&str], current_page: u32, last_page: u32) -> String {
    let data: Vec<serde_json::Value> = titles
        .iter()
        .enumerate()
        .map(|(idx, title)| serde_json::json!({ "mal_id": idx + 1, "title": title }))
        .collect();

    serde_json::json!({
        "data": data,
        "pagination": {
            "current_page": current_page,
            "last_visible_page": last_page,
            "has_next_page": current_page < last_page,
        }
    })
    .to_string()
}

/// What a [`RecordingRenderer`] saw, in order
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    List {
        titles: Vec<String>,
        current_page: u32,
        last_page: u32,
    },
    Detail(DetailEvent),
    Error(String),
    Loading(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEvent {
    Found(String),
    NotFound,
    Failed,
}

/// Renderer that only records what it was asked to show
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: RenderEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RenderTarget for RecordingRenderer {
    fn render_list(&self, items: &[AnimeEntry], pagination: &PaginationInfo) {
        self.record(RenderEvent::List {
            titles: items.iter().map(|item| item.title.clone()).collect(),
            current_page: pagination.current_page(),
            last_page: pagination.last_page(),
        });
    }

    fn render_detail(&self, detail: DetailView<'_>) {
        let event = match detail {
            DetailView::Found(details) => DetailEvent::Found(details.title.clone()),
            DetailView::NotFound => DetailEvent::NotFound,
            DetailView::Failed => DetailEvent::Failed,
        };
        self.record(RenderEvent::Detail(event));
    }

    fn render_error(&self, message: &str) {
        self.record(RenderEvent::Error(message.to_string()));
    }

    fn set_loading_visible(&self, visible: bool) {
        self.record(RenderEvent::Loading(visible));
    }
}
