pub mod config;
pub mod discover;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod pipeline;
pub mod playlist;
pub mod site;
pub mod stream;
pub mod translate;

pub use config::{
    load_filmgrab_config, FilmgrabConfig, LookupSection, OutputSection, PipelineSection,
    SiteSection,
};
pub use discover::{DiscoveryStats, LinkDiscoverer};
pub use enrich::{CatalogMetadata, EnrichMiss, EnrichOutcome, MetadataEnricher};
pub use error::{ConfigError, Result};
pub use fetch::{FetchError, HttpFetcher, LimitedFetcher, PageFetcher};
pub use lookup::{LookupClient, TmdbClient};
pub use pipeline::{AggregatedRecord, Coordinator, PipelineStats, SkipReason};
pub use playlist::{sanitize_id, wrap_proxy_url, PlaylistWriter};
pub use site::{SiteMetadata, SiteMetadataExtractor};
pub use stream::{StreamInfo, StreamLinkResolver};
pub use translate::{Translator, WebTranslator};
