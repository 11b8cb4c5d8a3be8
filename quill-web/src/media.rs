use crate::api::{ApiClient, ApiError};
use crate::feed::{self, PageResult};
use crate::session::Session;
use quill_contract::i18n::{t, Key};
use quill_contract::{FeedPager, FetchTicket, Lang, MediaDto, MAX_UPLOAD_BYTES};
use wasm_bindgen_futures::spawn_local;
use web_sys::{File, HtmlInputElement};
use yew::prelude::*;

const PAGE_SIZE: i64 = 24;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub session: Session,
    pub lang: Lang,
}

pub enum Msg {
    FetchNext,
    Scrolled(bool),
    Settled(FetchTicket, PageResult<MediaDto>),
    Upload(File),
    Uploaded(MediaDto),
    Failed(ApiError),
}

pub struct MediaTab {
    pager: FeedPager<MediaDto>,
    uploading: bool,
    action_error: Option<String>,
}

impl MediaTab {
    fn fetch_next(&mut self, ctx: &Context<Self>) -> bool {
        let api = ApiClient::for_session(&ctx.props().session);
        feed::fetch_next(
            &mut self.pager,
            move |cursor| async move { api.list_media(cursor).await },
            ctx.link().callback(|(ticket, result)| Msg::Settled(ticket, result)),
        )
    }
}

impl Component for MediaTab {
    type Message = Msg;
    type Properties = Props;

    fn create(ctx: &Context<Self>) -> Self {
        let mut tab = Self {
            pager: FeedPager::new(PAGE_SIZE),
            uploading: false,
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
            Msg::Upload(file) => {
                // the server enforces the same limit, this only saves the round trip
                if file.size() > MAX_UPLOAD_BYTES as f64 {
                    self.action_error = Some(format!(
                        "{} is larger than {} bytes",
                        file.name(),
                        MAX_UPLOAD_BYTES
                    ));
                    return true;
                }
                self.uploading = true;
                self.action_error = None;

                let api = ApiClient::for_session(&ctx.props().session);
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api.upload_media(&file).await {
                        Ok(media) => link.send_message(Msg::Uploaded(media)),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                true
            }
            Msg::Uploaded(media) => {
                log::info!("Uploaded media #{}", media.id);
                self.uploading = false;
                self.pager.reset();
                self.fetch_next(ctx);
                true
            }
            Msg::Failed(e) => {
                self.uploading = false;
                self.action_error = Some(e.to_string());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let lang = ctx.props().lang;
        let link = ctx.link();
        let api = ApiClient::for_session(&ctx.props().session);

        html! {
            <section class="media-tab">
                <label class="upload">
                    { t(lang, Key::Upload) }
                    <input
                        type="file"
                        accept="image/png,image/jpeg,image/gif,image/webp,image/svg+xml"
                        disabled={self.uploading}
                        onchange={link.batch_callback(|e: Event| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            let file = input.files().and_then(|files| files.get(0));
                            input.set_value("");
                            file.map(Msg::Upload)
                        })}
                    />
                </label>
                if self.uploading {
                    <span class="loading">{ t(lang, Key::Loading) }</span>
                }
                if let Some(error) = &self.action_error {
                    <p class="error">{ error }</p>
                }

                <div class="feed media-grid" onscroll={link.callback(|e: Event| Msg::Scrolled(feed::near_bottom(&e)))}>
                    { for self.pager.items().iter().map(|media| html! {
                        <figure key={media.id}>
                            <img src={api.media_url(media)} alt={media.path.clone()} loading="lazy" />
                            <figcaption>
                                { format!("#{} · {}", media.id, media.ext) }
                                if let Some(post_id) = media.post_id {
                                    { format!(" · post {}", post_id) }
                                }
                            </figcaption>
                        </figure>
                    }) }
                    { feed::footer(&self.pager, lang, link.callback(|_| Msg::FetchNext)) }
                </div>
            </section>
        }
    }
}
