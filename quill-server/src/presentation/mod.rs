pub mod auth;
pub mod error;
pub mod http_handlers;
pub mod locale;
pub mod media_handlers;
pub mod middleware;
pub mod routes;
pub mod site;

pub use locale::LocaleNegotiation;
pub use middleware::RequireApiKey;
pub use routes::configure;
