pub mod cli;
pub mod fallback;
pub mod flows;
pub mod http;
pub mod locations;
pub mod logging;
pub mod news;
pub mod places;

#[cfg(test)]
pub(crate) mod test_support;

pub use cli::{handle_command, ProviderArgs, ProviderCommands};
pub use fallback::FallbackChain;
pub use flows::Services;
pub use locations::LocationService;

pub mod prelude {
    pub use super::fallback::FallbackChain;
    pub use super::flows::Services;
    pub use jh_core::{Article, Error, NewsQuery, Place, PlaceQuery, Provider, Result};
}
