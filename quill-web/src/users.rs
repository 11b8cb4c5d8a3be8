use crate::api::{ApiClient, ApiError};
use crate::feed::{self, PageResult};
use crate::session::Session;
use quill_contract::i18n::{t, Key};
use quill_contract::{FeedPager, FetchTicket, Lang, Role, UserDto};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

const PAGE_SIZE: i64 = 30;
const ROLES: [Role; 3] = [Role::Guest, Role::Admin, Role::SuperAdmin];

#[derive(Properties, PartialEq)]
pub struct Props {
    pub session: Session,
    pub lang: Lang,
}

pub enum Msg {
    FetchNext,
    Scrolled(bool),
    Settled(FetchTicket, PageResult<UserDto>),
    SetRole(i64, Role),
    Updated(UserDto),
    Failed(ApiError),
}

pub struct UsersTab {
    pager: FeedPager<UserDto>,
    action_error: Option<String>,
}

impl UsersTab {
    fn fetch_next(&mut self, ctx: &Context<Self>) -> bool {
        let api = ApiClient::for_session(&ctx.props().session);
        feed::fetch_next(
            &mut self.pager,
            move |cursor| async move { api.list_users(cursor).await },
            ctx.link().callback(|(ticket, result)| Msg::Settled(ticket, result)),
        )
    }

    /// Only a super-admin edits roles, and never their own.
    fn can_edit(session: &Session, user: &UserDto) -> bool {
        session.is_super_admin() && session.user.id != user.id
    }
}

impl Component for UsersTab {
    type Message = Msg;
    type Properties = Props;

    fn create(ctx: &Context<Self>) -> Self {
        let mut tab = Self {
            pager: FeedPager::new(PAGE_SIZE),
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
            Msg::SetRole(id, role) => {
                let api = ApiClient::for_session(&ctx.props().session);
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api.set_role(id, role).await {
                        Ok(user) => link.send_message(Msg::Updated(user)),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                false
            }
            Msg::Updated(user) => {
                self.action_error = None;
                if let Some(slot) = self.pager.items_mut().iter_mut().find(|u| u.id == user.id) {
                    *slot = user;
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
        let props = ctx.props();
        let lang = props.lang;
        let link = ctx.link();

        html! {
            <section class="users-tab">
                if let Some(error) = &self.action_error {
                    <p class="error">{ error }</p>
                }

                <div class="feed" onscroll={link.callback(|e: Event| Msg::Scrolled(feed::near_bottom(&e)))}>
                    { for self.pager.items().iter().map(|user| {
                        let id = user.id;
                        let role_cell = if Self::can_edit(&props.session, user) {
                            html! {
                                <select onchange={link.batch_callback(move |e: Event| {
                                    let select: HtmlSelectElement = e.target_unchecked_into();
                                    select.value().parse::<Role>().ok().map(|role| Msg::SetRole(id, role))
                                })}>
                                    { for ROLES.iter().map(|role| html! {
                                        <option value={role.as_str()} selected={*role == user.role}>
                                            { role.as_str() }
                                        </option>
                                    }) }
                                </select>
                            }
                        } else {
                            html! { <span class="role">{ user.role.as_str() }</span> }
                        };

                        html! {
                            <div class="user" key={id}>
                                if let Some(avatar) = &user.avatar {
                                    <img class="avatar" src={avatar.clone()} alt="" />
                                }
                                <strong>{ &user.name }</strong>
                                <small>{ format!("#{} · {}", id, user.provider) }</small>
                                { role_cell }
                            </div>
                        }
                    }) }
                    { feed::footer(&self.pager, lang, link.callback(|_| Msg::FetchNext)) }
                </div>

                if !props.session.is_super_admin() {
                    <p class="hint">{ t(lang, Key::AdminOnly) }</p>
                }
            </section>
        }
    }
}
