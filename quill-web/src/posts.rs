use crate::api::{ApiClient, ApiError};
use crate::feed::{self, PageResult};
use crate::session::Session;
use quill_contract::i18n::{t, Key};
use quill_contract::{
    CreatePostRequest, FeedPager, FetchTicket, Lang, PostDto, UpdatePostRequest,
};
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

const PAGE_SIZE: i64 = 20;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub session: Session,
    pub lang: Lang,
}

/// Editor form. `id` is `None` for a new post.
#[derive(Clone, Default, PartialEq)]
struct Draft {
    id: Option<i64>,
    title: String,
    content: String,
    tags: String,
    thumbnail: String,
}

impl Draft {
    fn from_post(post: &PostDto) -> Self {
        Self {
            id: Some(post.id),
            title: post.title.clone(),
            content: post.content.clone().unwrap_or_default(),
            tags: post.tags.join(", "),
            thumbnail: post.thumbnail_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    fn tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn thumbnail(&self) -> Result<Option<i64>, String> {
        let raw = self.thumbnail.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|_| format!("Thumbnail must be a media id, got {:?}", raw))
    }
}

pub enum Field {
    Title,
    Content,
    Tags,
    Thumbnail,
}

pub enum Msg {
    FetchNext,
    Scrolled(bool),
    Settled(FetchTicket, PageResult<PostDto>),
    SearchInput(String),
    Search,
    NewPost,
    Edit(i64),
    EditField(Field, String),
    Save,
    Cancel,
    TogglePublish(i64),
    Delete(i64),
    Replaced(PostDto),
    Reload,
    Failed(ApiError),
}

pub struct PostsTab {
    pager: FeedPager<PostDto>,
    search: String,
    draft: Option<Draft>,
    action_error: Option<String>,
}

impl PostsTab {
    fn api(ctx: &Context<Self>) -> ApiClient {
        ApiClient::for_session(&ctx.props().session)
    }

    fn fetch_next(&mut self, ctx: &Context<Self>) -> bool {
        let api = Self::api(ctx);
        let search = self.search.clone();
        feed::fetch_next(
            &mut self.pager,
            move |cursor| async move { api.admin_posts(&search, cursor).await },
            ctx.link().callback(|(ticket, result)| Msg::Settled(ticket, result)),
        )
    }

    fn reload(&mut self, ctx: &Context<Self>) {
        self.pager.reset();
        self.fetch_next(ctx);
    }

    /// Runs a mutation and reports the changed post back.
    fn run<F>(&self, ctx: &Context<Self>, request: F)
    where
        F: std::future::Future<Output = Result<Msg, ApiError>> + 'static,
    {
        let link = ctx.link().clone();
        spawn_local(async move {
            match request.await {
                Ok(msg) => link.send_message(msg),
                Err(e) => link.send_message(Msg::Failed(e)),
            }
        });
    }
}

impl Component for PostsTab {
    type Message = Msg;
    type Properties = Props;

    fn create(ctx: &Context<Self>) -> Self {
        let mut tab = Self {
            pager: FeedPager::new(PAGE_SIZE),
            search: String::new(),
            draft: None,
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
                if let Err(e) = &result {
                    log::warn!("Loading posts failed: {}", e);
                }
                self.pager.settle(ticket, result);
                true
            }
            Msg::SearchInput(value) => {
                self.search = value;
                false
            }
            Msg::Search | Msg::Reload => {
                self.reload(ctx);
                true
            }
            Msg::NewPost => {
                self.draft = Some(Draft::default());
                true
            }
            Msg::Edit(id) => {
                self.draft = self
                    .pager
                    .items()
                    .iter()
                    .find(|p| p.id == id)
                    .map(Draft::from_post);
                true
            }
            Msg::EditField(field, value) => {
                if let Some(draft) = &mut self.draft {
                    match field {
                        Field::Title => draft.title = value,
                        Field::Content => draft.content = value,
                        Field::Tags => draft.tags = value,
                        Field::Thumbnail => draft.thumbnail = value,
                    }
                }
                true
            }
            Msg::Save => {
                let Some(draft) = self.draft.clone() else {
                    return false;
                };
                let thumbnail_id = match draft.thumbnail() {
                    Ok(id) => id,
                    Err(e) => {
                        self.action_error = Some(e);
                        return true;
                    }
                };
                let content = (!draft.content.trim().is_empty()).then(|| draft.content.clone());
                let api = Self::api(ctx);
                self.action_error = None;

                match draft.id {
                    None => {
                        let req = CreatePostRequest {
                            title: draft.title.clone(),
                            content,
                            slug: None,
                            thumbnail_id,
                            tags: draft.tags(),
                        };
                        // a new post changes every offset after it
                        self.run(ctx, async move { api.create_post(&req).await.map(|_| Msg::Reload) });
                    }
                    Some(id) => {
                        let req = UpdatePostRequest {
                            title: Some(draft.title.clone()),
                            content,
                            thumbnail_id,
                            tags: Some(draft.tags()),
                        };
                        self.run(ctx, async move { api.update_post(id, &req).await.map(Msg::Replaced) });
                    }
                }
                self.draft = None;
                true
            }
            Msg::Cancel => {
                self.draft = None;
                true
            }
            Msg::TogglePublish(id) => {
                let api = Self::api(ctx);
                self.run(ctx, async move { api.toggle_publish(id).await.map(Msg::Replaced) });
                false
            }
            Msg::Delete(id) => {
                let api = Self::api(ctx);
                self.run(ctx, async move { api.delete_post(id).await.map(|_| Msg::Reload) });
                false
            }
            Msg::Replaced(post) => {
                if let Some(slot) = self.pager.items_mut().iter_mut().find(|p| p.id == post.id) {
                    *slot = post;
                }
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

        html! {
            <section class="posts-tab">
                <div class="toolbar">
                    <input
                        type="search"
                        placeholder={t(lang, Key::Search)}
                        value={self.search.clone()}
                        oninput={link.callback(|e: InputEvent| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            Msg::SearchInput(input.value())
                        })}
                        onchange={link.callback(|_| Msg::Search)}
                    />
                    <button onclick={link.callback(|_| Msg::NewPost)}>{ t(lang, Key::NewPost) }</button>
                </div>

                if let Some(error) = &self.action_error {
                    <div class="error-panel">
                        <p>{ error }</p>
                        <button onclick={link.callback(|_| Msg::Reload)}>{ t(lang, Key::TryAgain) }</button>
                    </div>
                }

                if let Some(draft) = &self.draft {
                    { self.view_editor(ctx, draft) }
                }

                <div class="feed" onscroll={link.callback(|e: Event| Msg::Scrolled(feed::near_bottom(&e)))}>
                    { for self.pager.items().iter().map(|post| self.view_post(ctx, post)) }
                    { feed::footer(&self.pager, lang, link.callback(|_| Msg::FetchNext)) }
                </div>
            </section>
        }
    }
}

impl PostsTab {
    fn view_post(&self, ctx: &Context<Self>, post: &PostDto) -> Html {
        let lang = ctx.props().lang;
        let link = ctx.link();
        let id = post.id;
        let publish_label = if post.is_published() {
            t(lang, Key::Unpublish)
        } else {
            t(lang, Key::Publish)
        };

        html! {
            <article class="post" key={id}>
                <h3>
                    { &post.title }
                    if !post.is_published() {
                        <span class="badge">{ t(lang, Key::Draft) }</span>
                    }
                </h3>
                <small>{ format!("/{} · {}", post.slug, post.updated_at.format("%Y-%m-%d %H:%M")) }</small>
                if !post.tags.is_empty() {
                    <p class="tags">{ post.tags.join(", ") }</p>
                }
                <div class="post-actions">
                    <button onclick={link.callback(move |_| Msg::Edit(id))}>{ t(lang, Key::Edit) }</button>
                    <button onclick={link.callback(move |_| Msg::TogglePublish(id))}>{ publish_label }</button>
                    <button class="danger" onclick={link.callback(move |_| Msg::Delete(id))}>{ t(lang, Key::Delete) }</button>
                </div>
            </article>
        }
    }

    fn view_editor(&self, ctx: &Context<Self>, draft: &Draft) -> Html {
        let lang = ctx.props().lang;
        let link = ctx.link();
        let input = |field: fn() -> Field| {
            link.callback(move |e: InputEvent| {
                let input: HtmlInputElement = e.target_unchecked_into();
                Msg::EditField(field(), input.value())
            })
        };

        html! {
            <div class="editor">
                <input
                    type="text"
                    placeholder={t(lang, Key::Title)}
                    value={draft.title.clone()}
                    oninput={input(|| Field::Title)}
                />
                <textarea
                    placeholder={t(lang, Key::Content)}
                    value={draft.content.clone()}
                    oninput={link.callback(|e: InputEvent| {
                        let area: HtmlTextAreaElement = e.target_unchecked_into();
                        Msg::EditField(Field::Content, area.value())
                    })}
                />
                <input
                    type="text"
                    placeholder={t(lang, Key::Tags)}
                    value={draft.tags.clone()}
                    oninput={input(|| Field::Tags)}
                />
                <input
                    type="text"
                    placeholder={t(lang, Key::Thumbnail)}
                    value={draft.thumbnail.clone()}
                    oninput={input(|| Field::Thumbnail)}
                />
                <div class="edit-actions">
                    <button onclick={link.callback(|_| Msg::Save)}>{ t(lang, Key::Save) }</button>
                    <button onclick={link.callback(|_| Msg::Cancel)}>{ t(lang, Key::Cancel) }</button>
                </div>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_splits_tags_and_parses_thumbnail() {
        let draft = Draft {
            tags: " rust, ,web ,".to_string(),
            thumbnail: " 42 ".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.tags(), vec!["rust", "web"]);
        assert_eq!(draft.thumbnail(), Ok(Some(42)));
    }

    #[test]
    fn blank_thumbnail_clears_it_and_garbage_is_rejected() {
        let mut draft = Draft::default();
        assert_eq!(draft.thumbnail(), Ok(None));

        draft.thumbnail = "cover.png".to_string();
        assert!(draft.thumbnail().unwrap_err().contains("media id"));
    }
}
