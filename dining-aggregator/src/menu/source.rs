use std::time::Duration;

use super::ScrapeError;
use crate::{BoxFuture, PageSource};

const USER_AGENT: &str = concat!("dining-aggregator/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP page source. Pages that need script execution are not supported.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    http: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http })
    }
}

impl PageSource for HttpPageSource {
    #[tracing::instrument(skip(self))]
    fn fetch_page<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ScrapeError>> {
        Box::pin(async move {
            let response = self.http.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ScrapeError::Status {
                    url: url.to_owned(),
                    status: status.as_u16(),
                });
            }

            Ok(response.text().await?)
        })
    }
}
