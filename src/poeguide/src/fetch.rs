//! Throttled HTTP fetching for poedb pages and assets.
//!
//! Every request goes through one [`Fetcher`], which sleeps a fixed
//! delay after each call to self-throttle against the origin server.
//! There is no retry; a failed fetch surfaces to the caller.

use crate::error::Result;
use scraper::Html;
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

pub const POEDB_BASE: &str = "https://poedb.tw";
pub const QUEST_URL: &str = "https://poedb.tw/kr/Quest";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub struct Fetcher {
    agent: ureq::Agent,
    delay: Duration,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_secs(1))
    }

    pub fn with_delay(delay: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Fetcher { agent, delay }
    }

    /// GET a page and parse it into a DOM tree.
    pub fn document(&self, url: &str) -> Result<Html> {
        let body = self.get_string(url)?;
        Ok(Html::parse_document(&body))
    }

    /// GET raw bytes (icon downloads).
    pub fn bytes(&self, url: &str) -> Result<Vec<u8>> {
        print!("  Fetching {url} ... ");
        let _ = std::io::stdout().flush();
        let response = self.agent.get(url).set("User-Agent", USER_AGENT).call()?;
        let mut buf = Vec::new();
        response.into_reader().read_to_end(&mut buf)?;
        println!("OK ({} bytes)", buf.len());
        thread::sleep(self.delay);
        Ok(buf)
    }

    fn get_string(&self, url: &str) -> Result<String> {
        print!("  Fetching {url} ... ");
        let _ = std::io::stdout().flush();
        let body = self
            .agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()?
            .into_string()?;
        println!("OK ({} bytes)", body.len());
        thread::sleep(self.delay);
        Ok(body)
    }

    /// URL of an individual localized page, e.g. a quest or gem page.
    pub fn page_url(slug: &str) -> String {
        format!("{POEDB_BASE}/kr/{slug}")
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_joins_slug() {
        assert_eq!(Fetcher::page_url("The_Caged_Brute"), "https://poedb.tw/kr/The_Caged_Brute");
    }
}
