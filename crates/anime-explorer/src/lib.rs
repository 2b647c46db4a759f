//! anime-explorer: browse the Jikan anime catalogue from the terminal.
//!
//! The library is built around two pieces: a [`ThrottledGate`] that spaces out
//! calls to the API host, and a [`Controller`] that turns search, filter and
//! page actions into requests and hands the results to a [`RenderTarget`].

pub mod api;
pub mod controller;
pub mod pagination;
pub mod query;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, HttpTransport, JikanClient, ThrottledGate, Transport};
pub use controller::{Controller, Outcome};
pub use pagination::{page_window, PaginationInfo};
pub use query::{AnimeStatus, AnimeType, QueryState, SearchCriteria, SortKey, PAGE_SIZE};
pub use render::{RenderTarget, TerminalRenderer};
