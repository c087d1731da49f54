pub mod builder;
pub mod client;
pub mod errors;
mod html;
pub mod routes;
pub mod user;
pub mod wallpaper;

#[cfg(test)]
mod testing;

pub use builder::*;
pub use client::*;
pub use errors::*;
pub use routes::*;
pub use user::*;
pub use wallpaper::{Tag, Wallpaper};

pub use wallhaven_core::{
    AuthSession, Batch, Body, Categories, FetchResult, Params, Purity, RouteKind, SearchOptions,
};

pub mod prelude {
    pub use crate::builder::WallhavenBuilder;
    pub use crate::client::{ANONYMOUS_LIMIT, AUTHENTICATED_LIMIT, WallhavenClient};
    pub use crate::errors::{Result, WallhavenError};
    pub use crate::routes::{BASE_URL, Routes};
    pub use crate::user::User;
    pub use crate::wallpaper::{Tag, Wallpaper};
    pub use wallhaven_core::{Batch, Categories, FetchResult, Purity, SearchOptions};
}
