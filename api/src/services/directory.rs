use std::sync::Arc;

use derive_more::{Display, Error, From};
use dining_aggregator::PageSource;
use dining_aggregator::config::AggregatorConfig;
use dining_aggregator::menu::ScrapeError;
use scraper::{Html, Selector};

const NAME_CELL: &str = "th[colspan='4']";

#[derive(Debug, Display, From, Error)]
pub enum DirectoryError {
    #[display("no directory entry for `{_0}`")]
    NotFound(#[error(not(source))] String),
    #[display("directory answered with status {_0}")]
    Upstream(#[error(not(source))] u16),
    #[from]
    Fetch(ScrapeError),
}

/// Looks people up on the institutional directory by their uni.
pub struct DirectoryClient {
    source: Arc<dyn PageSource>,
    url: String,
}

impl DirectoryClient {
    pub fn new(source: Arc<dyn PageSource>, config: &AggregatorConfig) -> Self {
        Self {
            source,
            url: config.directory_url.clone(),
        }
    }

    /// `uni` must already be validated as alphanumeric, it is placed in the query as is.
    #[tracing::instrument(skip(self))]
    pub async fn first_name(&self, uni: &str) -> Result<String, DirectoryError> {
        let url = format!("{}?code={uni}", self.url);

        let markup = match self.source.fetch_page(&url).await {
            Ok(markup) => markup,
            Err(ScrapeError::Status { status, .. }) => {
                return Err(DirectoryError::Upstream(status));
            }
            Err(e) => return Err(e.into()),
        };

        parse_first_name(&markup).ok_or_else(|| DirectoryError::NotFound(uni.to_owned()))
    }
}

pub fn parse_first_name(markup: &str) -> Option<String> {
    let selector = Selector::parse(NAME_CELL).ok()?;
    let document = Html::parse_document(markup);

    let cell = document.select(&selector).next()?;
    let full_name = cell.text().collect::<String>();
    full_name.split_whitespace().next().map(ToOwned::to_owned)
}
