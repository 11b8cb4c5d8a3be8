use crate::api::{ApiClient, ApiError};
use crate::feed::{self, PageResult};
use crate::session::Session;
use quill_contract::i18n::{t, Key};
use quill_contract::{CommentDto, FeedPager, FetchTicket, Lang};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

const PAGE_SIZE: i64 = 30;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub session: Session,
    pub lang: Lang,
}

pub enum Msg {
    FetchNext,
    Scrolled(bool),
    Settled(FetchTicket, PageResult<CommentDto>),
    Filter(Option<bool>),
    Delete(i64),
    Deleted,
    Failed(ApiError),
}

/// Moderation queue across every post.
pub struct CommentsTab {
    pager: FeedPager<CommentDto>,
    chief: Option<bool>,
    action_error: Option<String>,
}

impl CommentsTab {
    fn fetch_next(&mut self, ctx: &Context<Self>) -> bool {
        let api = ApiClient::for_session(&ctx.props().session);
        let chief = self.chief;
        feed::fetch_next(
            &mut self.pager,
            move |cursor| async move { api.moderation_comments(chief, cursor).await },
            ctx.link().callback(|(ticket, result)| Msg::Settled(ticket, result)),
        )
    }

    fn reload(&mut self, ctx: &Context<Self>) {
        self.pager.reset();
        self.fetch_next(ctx);
    }
}

impl Component for CommentsTab {
    type Message = Msg;
    type Properties = Props;

    fn create(ctx: &Context<Self>) -> Self {
        let mut tab = Self {
            pager: FeedPager::new(PAGE_SIZE),
            chief: None,
            action_error: None,
        };
        tab.fetch_next(ctx);
        tab
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::FetchNext => self.fetch_next(ctx),
            Msg::Scrolled(near_bottom) => near_bottom && self.fetch_next(ctx),
            Msg::Settled(ticket, result) => {
                self.pager.settle(ticket, result);
                true
            }
            Msg::Filter(chief) => {
                if self.chief == chief {
                    return false;
                }
                self.chief = chief;
                self.reload(ctx);
                true
            }
            Msg::Delete(id) => {
                let api = ApiClient::for_session(&ctx.props().session);
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api.delete_comment(id).await {
                        Ok(()) => link.send_message(Msg::Deleted),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                false
            }
            Msg::Deleted => {
                self.action_error = None;
                self.reload(ctx);
                true
            }
            Msg::Failed(e) => {
                self.action_error = Some(e.to_string());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let lang = ctx.props().lang;
        let link = ctx.link();
        let filter_button = |label: Key, value: Option<bool>| {
            let class = if self.chief == value { "filter active" } else { "filter" };
            html! {
                <button {class} onclick={link.callback(move |_| Msg::Filter(value))}>
                    { t(lang, label) }
                </button>
            }
        };

        html! {
            <section class="comments-tab">
                <div class="toolbar">
                    { filter_button(Key::AllComments, None) }
                    { filter_button(Key::ChiefOnly, Some(true)) }
                </div>

                if let Some(error) = &self.action_error {
                    <p class="error">{ error }</p>
                }

                <div class="feed" onscroll={link.callback(|e: Event| Msg::Scrolled(feed::near_bottom(&e)))}>
                    { for self.pager.items().iter().map(|comment| {
                        let id = comment.id;
                        html! {
                            <div class="comment" key={id}>
                                <p>
                                    if comment.chief {
                                        <span class="badge">{ "★" }</span>
                                    }
                                    { &comment.message }
                                </p>
                                <small>{ format!("#{} · post {} · user {} · {}",
                                    id,
                                    comment.post_id,
                                    comment.author_id,
                                    comment.created_at.format("%Y-%m-%d %H:%M")) }</small>
                                <button class="danger" onclick={link.callback(move |_| Msg::Delete(id))}>
                                    { t(lang, Key::Delete) }
                                </button>
                            </div>
                        }
                    }) }
                    { feed::footer(&self.pager, lang, link.callback(|_| Msg::FetchNext)) }
                </div>
            </section>
        }
    }
}
