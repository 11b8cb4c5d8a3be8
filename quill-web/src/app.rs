use crate::api::{ApiClient, ApiError};
use crate::comments::CommentsTab;
use crate::media::MediaTab;
use crate::posts::PostsTab;
use crate::session::{Session, SessionStore};
use crate::users::UsersTab;
use quill_contract::i18n::{t, Key};
use quill_contract::{Lang, UserDto};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Posts,
    #[at("/comments")]
    Comments,
    #[at("/users")]
    Users,
    #[at("/media")]
    Media,
    #[not_found]
    #[at("/404")]
    NotFound,
}

/// Fragment the identity broker redirects back with: `#token=<jwt>`.
const TOKEN_FRAGMENT: &str = "#token=";

pub enum Msg {
    EditToken(String),
    SubmitToken,
    SignedIn(Session),
    Verified(UserDto),
    SessionExpired,
    Logout,
    SwitchLang(Lang),
    Error(ApiError),
}

pub struct App {
    session: Option<Session>,
    lang: Lang,
    token_input: String,
    loading: bool,
    error: Option<String>,
}

/// Takes a broker-issued token out of the address bar, if present.
fn take_fragment_token() -> Option<String> {
    let location = web_sys::window()?.location();
    let hash = location.hash().ok()?;
    let token = hash.strip_prefix(TOKEN_FRAGMENT)?.trim().to_string();
    if let Err(e) = location.set_hash("") {
        log::warn!("Could not clear token fragment: {:?}", e);
    }
    (!token.is_empty()).then_some(token)
}

impl App {
    /// Checks `token` against `/api/auth/me` and signs in on success.
    fn sign_in(&mut self, ctx: &Context<Self>, token: String) {
        self.loading = true;
        self.error = None;

        let api = ApiClient::with_token(&token);
        let link = ctx.link().clone();
        spawn_local(async move {
            match api.me().await {
                Ok(user) => link.send_message(Msg::SignedIn(Session { token, user })),
                Err(e) => link.send_message(Msg::Error(e)),
            }
        });
    }
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let mut app = Self {
            session: SessionStore::load(),
            lang: SessionStore::load_lang(),
            token_input: String::new(),
            loading: false,
            error: None,
        };

        if let Some(token) = take_fragment_token() {
            app.sign_in(ctx, token);
        } else if let Some(stored) = &app.session {
            // role may have changed since the token was stored
            let api = ApiClient::for_session(stored);
            let link = ctx.link().clone();
            spawn_local(async move {
                match api.me().await {
                    Ok(user) => link.send_message(Msg::Verified(user)),
                    Err(e) if e.is_unauthorized() => link.send_message(Msg::SessionExpired),
                    Err(e) => log::warn!("Could not verify session: {}", e),
                }
            });
        }
        app
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::EditToken(value) => {
                self.token_input = value;
                false
            }

            Msg::SubmitToken => {
                let token = self.token_input.trim().to_string();
                if token.is_empty() {
                    self.error = Some("Paste the token issued by your sign-in provider".to_string());
                    return true;
                }
                self.sign_in(ctx, token);
                true
            }

            Msg::SignedIn(session) => {
                SessionStore::save(&session);
                log::info!("Signed in as {} ({})", session.user.name, session.user.role);
                self.session = Some(session);
                self.token_input.clear();
                self.loading = false;
                true
            }

            Msg::Verified(user) => match &mut self.session {
                Some(session) if session.user != user => {
                    session.user = user;
                    SessionStore::save(session);
                    true
                }
                _ => false,
            },

            Msg::SessionExpired => {
                SessionStore::clear();
                self.session = None;
                self.error = Some("Session expired, please sign in again".to_string());
                true
            }

            Msg::Logout => {
                SessionStore::clear();
                self.session = None;
                self.error = None;
                true
            }

            Msg::SwitchLang(lang) => {
                SessionStore::save_lang(lang);
                self.lang = lang;
                true
            }

            Msg::Error(e) => {
                self.loading = false;
                self.error = Some(e.to_string());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let lang = self.lang;
        let link = ctx.link();

        let lang_switch = html! {
            <div class="lang-switch">
                { for Lang::SUPPORTED.iter().map(|&l| {
                    let class = if l == lang { "active" } else { "" };
                    html! {
                        <button {class} onclick={link.callback(move |_| Msg::SwitchLang(l))}>
                            { l.code() }
                        </button>
                    }
                }) }
            </div>
        };

        html! {
            <div class="container">
                <header>
                    <h1>{ t(lang, Key::SiteTitle) }</h1>
                    { lang_switch }
                    if let Some(session) = &self.session {
                        <div class="user-info">
                            <span>{ format!("{} ({})", session.user.name, session.user.role) }</span>
                            <button onclick={link.callback(|_| Msg::Logout)}>{ t(lang, Key::SignOut) }</button>
                        </div>
                    }
                </header>

                if let Some(error) = &self.error {
                    <div class="error">{ error }</div>
                }

                {
                    match &self.session {
                        None => self.view_login(ctx),
                        Some(session) if !session.is_admin() => html! {
                            <p class="hint">{ t(lang, Key::AdminOnly) }</p>
                        },
                        Some(session) => Self::view_dashboard(session.clone(), lang),
                    }
                }
            </div>
        }
    }
}

impl App {
    fn view_login(&self, ctx: &Context<Self>) -> Html {
        let lang = self.lang;
        let link = ctx.link();
        let oninput = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::EditToken(input.value())
        });
        let onsubmit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::SubmitToken
        });

        html! {
            <form class="login" {onsubmit}>
                <h2>{ t(lang, Key::SignIn) }</h2>
                <input
                    type="password"
                    autocomplete="off"
                    placeholder={t(lang, Key::AccessToken)}
                    value={self.token_input.clone()}
                    {oninput}
                />
                <button type="submit" disabled={self.loading}>
                    { if self.loading { t(lang, Key::Loading) } else { t(lang, Key::SignIn) } }
                </button>
            </form>
        }
    }

    fn view_dashboard(session: Session, lang: Lang) -> Html {
        html! {
            <BrowserRouter>
                <nav class="tabs">
                    <Link<Route> to={Route::Posts}>{ t(lang, Key::Posts) }</Link<Route>>
                    <Link<Route> to={Route::Comments}>{ t(lang, Key::Moderation) }</Link<Route>>
                    <Link<Route> to={Route::Users}>{ t(lang, Key::Users) }</Link<Route>>
                    <Link<Route> to={Route::Media}>{ t(lang, Key::Media) }</Link<Route>>
                </nav>
                <main>
                    <Switch<Route> render={move |route: Route| switch(route, &session, lang)} />
                </main>
            </BrowserRouter>
        }
    }
}

fn switch(route: Route, session: &Session, lang: Lang) -> Html {
    let session = session.clone();
    match route {
        Route::Posts => html! { <PostsTab {session} {lang} /> },
        Route::Comments => html! { <CommentsTab {session} {lang} /> },
        Route::Users => html! { <UsersTab {session} {lang} /> },
        Route::Media => html! { <MediaTab {session} {lang} /> },
        Route::NotFound => html! {
            <div class="not-found">
                <p>{ t(lang, Key::NotFound) }</p>
                <Link<Route> to={Route::Posts}>{ t(lang, Key::BackHome) }</Link<Route>>
            </div>
        },
    }
}
