//! Market data: the provider seam, the Yahoo implementation, caching,
//! clean-up and headline sentiment

mod cache;
pub mod normalize;
mod provider;
pub mod sentiment;
mod yahoo;

pub use cache::{CacheKey, MarketDataCache};
pub use provider::MarketDataProvider;
pub use yahoo::{YahooProvider, yahoo_symbol};
