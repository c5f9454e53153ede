use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::runtime::ResolvedPaths;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRIES: usize = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 350;

/// Blocking MediaWiki API client with bounded retries.
pub struct WikiClient {
    client: Client,
    api_url: String,
    user_agent: String,
    retries: usize,
    retry_delay_ms: u64,
}

impl WikiClient {
    pub fn new(api_url: &str, user_agent: &str) -> Result<Self> {
        let timeout_ms = env::var("WIKI_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let retries = env::var("WIKI_HTTP_RETRIES")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_RETRIES);
        let retry_delay_ms = env::var("WIKI_HTTP_RETRY_DELAY_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_DELAY_MS);
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            user_agent: user_agent.to_string(),
            retries,
            retry_delay_ms,
        })
    }

    /// Fetch a page's raw wikitext, following redirects.
    pub fn page_wikitext(&self, title: &str) -> Result<String> {
        let payload = self.request_json(&[
            ("action", "parse".to_string()),
            ("page", title.replace(' ', "_")),
            ("prop", "wikitext".to_string()),
            ("redirects", "1".to_string()),
        ])?;
        payload
            .get("parse")
            .and_then(|value| value.get("wikitext"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .with_context(|| format!("no wikitext in response for \"{title}\""))
    }

    /// List the main-namespace member pages of a category.
    pub fn category_members(&self, category: &str) -> Result<Vec<String>> {
        let payload = self.request_json(&[
            ("action", "query".to_string()),
            ("generator", "categorymembers".to_string()),
            ("gcmtitle", category.to_string()),
            ("gcmprop", "title".to_string()),
            ("gcmnamespace", "0".to_string()),
            ("gcmlimit", "500".to_string()),
        ])?;
        let mut titles = Vec::new();
        if let Some(pages) = payload
            .get("query")
            .and_then(|value| value.get("pages"))
            .and_then(Value::as_array)
        {
            for page in pages {
                if let Some(title) = page.get("title").and_then(Value::as_str)
                    && !title.trim().is_empty()
                {
                    titles.push(title.to_string());
                }
            }
        }
        Ok(titles)
    }

    /// Fetch an arbitrary JSON document (used for the base catalog).
    pub fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.clone())
            .send()
            .with_context(|| format!("failed to fetch {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} while fetching {}", status.as_u16(), url);
        }
        response
            .json()
            .with_context(|| format!("failed to decode JSON from {url}"))
    }

    fn request_json(&self, params: &[(&str, String)]) -> Result<Value> {
        let mut pairs = Vec::with_capacity(params.len() + 2);
        pairs.push(("format".to_string(), "json".to_string()));
        pairs.push(("formatversion".to_string(), "2".to_string()));
        for (key, value) in params {
            pairs.push(((*key).to_string(), value.clone()));
        }

        let mut last_error = None::<String>;
        for attempt in 0..=self.retries {
            let response = self
                .client
                .get(&self.api_url)
                .header("User-Agent", self.user_agent.clone())
                .query(&pairs)
                .send();

            match response {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        last_error = Some(format!("HTTP {status}"));
                        if attempt < self.retries {
                            sleep(Duration::from_millis(
                                self.retry_delay_ms.saturating_mul(attempt as u64 + 1),
                            ));
                            continue;
                        }
                        break;
                    }
                    let payload: Value = response
                        .json()
                        .context("failed to decode MediaWiki JSON response")?;
                    if let Some(error) = payload.get("error") {
                        let code = error
                            .get("code")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown_error");
                        let info = error
                            .get("info")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown info");
                        last_error = Some(format!("api error [{code}]: {info}"));
                        if attempt < self.retries {
                            sleep(Duration::from_millis(
                                self.retry_delay_ms.saturating_mul(attempt as u64 + 1),
                            ));
                            continue;
                        }
                        break;
                    }
                    return Ok(payload);
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                    if attempt < self.retries {
                        sleep(Duration::from_millis(
                            self.retry_delay_ms.saturating_mul(attempt as u64 + 1),
                        ));
                        continue;
                    }
                }
            }
        }

        let message = last_error.unwrap_or_else(|| "MediaWiki API request failed".to_string());
        bail!("{message}")
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub text: String,
    pub from_cache: bool,
}

/// Page source backed by the on-disk cache, with the network as fallback.
/// An offline store only ever reads the cache.
pub struct PageStore {
    client: Option<WikiClient>,
    sets_dir: PathBuf,
    cards_dir: PathBuf,
}

impl PageStore {
    pub fn new(client: WikiClient, paths: &ResolvedPaths) -> Self {
        Self {
            client: Some(client),
            sets_dir: paths.sets_cache_dir.clone(),
            cards_dir: paths.cards_cache_dir.clone(),
        }
    }

    pub fn offline(paths: &ResolvedPaths) -> Self {
        Self {
            client: None,
            sets_dir: paths.sets_cache_dir.clone(),
            cards_dir: paths.cards_cache_dir.clone(),
        }
    }

    pub fn client(&self) -> Option<&WikiClient> {
        self.client.as_ref()
    }

    /// Set page titles to process: category members online, cached pages offline.
    pub fn set_titles(&self, category: &str) -> Result<Vec<String>> {
        match &self.client {
            Some(client) => client.category_members(category),
            None => cached_titles(&self.sets_dir),
        }
    }

    pub fn set_page(&self, title: &str) -> Result<FetchedPage> {
        self.page(&self.sets_dir, title)
    }

    pub fn card_page(&self, title: &str) -> Result<FetchedPage> {
        self.page(&self.cards_dir, title)
    }

    fn page(&self, dir: &Path, title: &str) -> Result<FetchedPage> {
        let path = dir.join(format!("{}.wikitext", sanitize_title(title)));
        if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return Ok(FetchedPage {
                text,
                from_cache: true,
            });
        }
        let Some(client) = &self.client else {
            bail!("page \"{title}\" is not cached and this run is offline");
        };
        let text = client.page_wikitext(title)?;
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        fs::write(&path, &text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(FetchedPage {
            text,
            from_cache: false,
        })
    }
}

/// Titles keep their spaces on disk; only path-hostile characters are replaced.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            _ => ch,
        })
        .collect()
}

fn cached_titles(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut titles = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(title) = name.strip_suffix(".wikitext") {
            titles.push(title.to_string());
        }
    }
    titles.sort();
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{PathOverrides, resolve_paths};
    use tempfile::tempdir;

    fn paths_in(dir: &Path) -> ResolvedPaths {
        resolve_paths(&PathOverrides {
            project_root: Some(dir.to_path_buf()),
            ..Default::default()
        })
        .expect("resolve")
    }

    #[test]
    fn sanitize_title_keeps_spaces_and_replaces_path_separators() {
        assert_eq!(
            sanitize_title("Genetic Apex (TCG Pocket)"),
            "Genetic Apex (TCG Pocket)"
        );
        assert_eq!(sanitize_title("A/B:C?"), "A-B-C-");
    }

    #[test]
    fn offline_store_serves_cached_pages() {
        let temp = tempdir().expect("tempdir");
        let paths = paths_in(temp.path());
        fs::create_dir_all(&paths.sets_cache_dir).expect("create cache");
        fs::write(
            paths.sets_cache_dir.join("Genetic Apex (TCG Pocket).wikitext"),
            "|setname=Genetic Apex\n",
        )
        .expect("seed cache");

        let store = PageStore::offline(&paths);
        let page = store.set_page("Genetic Apex (TCG Pocket)").expect("page");
        assert!(page.from_cache);
        assert_eq!(page.text, "|setname=Genetic Apex\n");
    }

    #[test]
    fn offline_store_fails_on_uncached_pages() {
        let temp = tempdir().expect("tempdir");
        let paths = paths_in(temp.path());
        let store = PageStore::offline(&paths);
        let error = store.card_page("Pikachu (Genetic Apex 094)").expect_err("must fail");
        assert!(error.to_string().contains("offline"));
    }

    #[test]
    fn offline_set_titles_come_from_the_cache_listing() {
        let temp = tempdir().expect("tempdir");
        let paths = paths_in(temp.path());
        fs::create_dir_all(&paths.sets_cache_dir).expect("create cache");
        for name in [
            "Mythical Island (TCG Pocket).wikitext",
            "Genetic Apex (TCG Pocket).wikitext",
            "notes.txt",
        ] {
            fs::write(paths.sets_cache_dir.join(name), "").expect("seed cache");
        }

        let store = PageStore::offline(&paths);
        let titles = store.set_titles("ignored").expect("titles");
        assert_eq!(
            titles,
            vec![
                "Genetic Apex (TCG Pocket)".to_string(),
                "Mythical Island (TCG Pocket)".to_string(),
            ]
        );
    }
}
