//! Glue between a [`FeedPager`] and a component: issuing fetches, detecting
//! when a list is scrolled near its end, and the shared list footer.

use crate::api::ApiError;
use quill_contract::i18n::{t, Key};
use quill_contract::{FeedPager, FetchTicket, Lang, Page, PageCursor};
use std::future::Future;
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;
use yew::prelude::*;

pub type PageResult<T> = Result<Page<T>, ApiError>;

/// Distance from the bottom, in pixels, at which the next page is requested.
const SCROLL_THRESHOLD: i32 = 120;

/// Starts fetching the next page unless one is in flight or the feed is
/// exhausted. The outcome is delivered to `done` together with its ticket.
pub fn fetch_next<T, F, Fut>(
    pager: &mut FeedPager<T>,
    fetch: F,
    done: Callback<(FetchTicket, PageResult<T>)>,
) -> bool
where
    T: 'static,
    F: FnOnce(PageCursor) -> Fut,
    Fut: Future<Output = PageResult<T>> + 'static,
{
    let Some(ticket) = pager.begin() else {
        return false;
    };
    let request = fetch(ticket.cursor());
    spawn_local(async move {
        let result = request.await;
        done.emit((ticket, result));
    });
    true
}

pub fn near_bottom(e: &Event) -> bool {
    let el: Element = e.target_unchecked_into();
    el.scroll_top() + el.client_height() >= el.scroll_height() - SCROLL_THRESHOLD
}

/// Loading indicator, "load more" button, or the error panel with a retry.
pub fn footer<T>(pager: &FeedPager<T>, lang: Lang, on_more: Callback<MouseEvent>) -> Html {
    if let Some(error) = pager.error() {
        return html! {
            <div class="error-panel">
                <p>{ error }</p>
                <button onclick={on_more}>{ t(lang, Key::TryAgain) }</button>
            </div>
        };
    }
    if pager.is_fetching() {
        return html! { <div class="loading">{ t(lang, Key::Loading) }</div> };
    }
    if pager.total() == Some(0) {
        return html! { <p class="empty">{ t(lang, Key::Empty) }</p> };
    }
    if pager.has_next_page() {
        return html! {
            <button class="load-more" onclick={on_more}>{ t(lang, Key::LoadMore) }</button>
        };
    }
    html! {
        <p class="summary">{ format!("{} / {}", pager.items().len(), pager.total().unwrap_or(0)) }</p>
    }
}
