pub mod overrides;
pub mod schema;

pub use overrides::Overrides;
pub use schema::{
    BrowserConfig, CampaignConfig, Config, DownloadConfig, PathsConfig, SearchConfig, SiteConfig,
};
