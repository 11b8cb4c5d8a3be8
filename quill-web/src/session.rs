use gloo_storage::{LocalStorage, Storage};
use quill_contract::{Lang, Role, UserDto};
use serde::{Deserialize, Serialize};

const SESSION_KEY: &str = "quill_session";
const LANG_KEY: &str = "quill_lang";

/// Signed-in user. Owned by the root component and passed down as props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserDto,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role.satisfies(Role::Admin)
    }

    pub fn is_super_admin(&self) -> bool {
        self.user.role == Role::SuperAdmin
    }
}

/// The only place the dashboard touches browser storage.
pub struct SessionStore;

impl SessionStore {
    pub fn load() -> Option<Session> {
        LocalStorage::get(SESSION_KEY).ok()
    }

    pub fn save(session: &Session) {
        if let Err(e) = LocalStorage::set(SESSION_KEY, session) {
            log::warn!("Failed to persist session: {:?}", e);
        }
    }

    pub fn clear() {
        LocalStorage::delete(SESSION_KEY);
    }

    pub fn load_lang() -> Lang {
        LocalStorage::get::<Lang>(LANG_KEY).unwrap_or(Lang::FALLBACK)
    }

    pub fn save_lang(lang: Lang) {
        if let Err(e) = LocalStorage::set(LANG_KEY, lang) {
            log::warn!("Failed to persist locale: {:?}", e);
        }
    }
}
