pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod storage;
pub mod types;

pub use config::ProviderConfig;
pub use error::{Error, ProviderFailure};
pub use models::{
    Comment, ContentType, Counter, Like, ModerationAction, PostCounters, Report, ReportStatus,
    WriteBatch, WriteOp,
};
pub use provider::Provider;
pub use storage::ModerationStore;
pub use types::{
    Article, ArticleSource, CitySuggestion, LocationCheck, NewsQuery, NewsResult, NewsTopic,
    Place, PlaceQuery, PlacesResult,
};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use super::{Article, Error, Place, Provider, Result};
}
