//! Gitee v5 REST API client.

use reqwest::{Client, Method, StatusCode, Url};
use serde_json::json;
use tracing::{debug, info};

use super::{ForgeClient, ForgeFuture, PrRef, RepoContent};
use crate::config::ForgeConfig;
use crate::{AppError, Result};

/// [`ForgeClient`] backed by the Gitee REST API.
pub struct GiteeClient {
    http: Client,
    api_base: Url,
    access_token: String,
}

impl GiteeClient {
    /// Build a client from forge settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `api_base` is not an absolute URL.
    pub fn new(config: &ForgeConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|err| AppError::Config(format!("invalid forge api_base: {err}")))?;
        if api_base.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "forge api_base cannot be a base url: {api_base}"
            )));
        }
        Ok(Self {
            http: Client::new(),
            api_base,
            access_token: config.access_token.clone(),
        })
    }

    /// Join `segments` onto the API base and attach the access token.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Config("forge api_base cannot be a base url".into()))?
            .pop_if_empty()
            .extend(segments);
        if !self.access_token.is_empty() {
            url.query_pairs_mut()
                .append_pair("access_token", &self.access_token);
        }
        Ok(url)
    }

    fn pull_labels_url(&self, pr: &PrRef, tail: Option<&str>) -> Result<Url> {
        let number = pr.number.to_string();
        let mut segments = vec![
            "repos",
            pr.org.as_str(),
            pr.repo.as_str(),
            "pulls",
            number.as_str(),
            "labels",
        ];
        segments.extend(tail);
        self.endpoint(segments)
    }

    async fn delete_labels(&self, pr: &PrRef, joined: &str) -> Result<()> {
        let url = self.pull_labels_url(pr, Some(joined))?;
        let response = self.http.request(Method::DELETE, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%pr, labels = joined, "labels already absent");
            return Ok(());
        }
        ensure_success(response, "remove labels").await?;
        info!(%pr, labels = joined, "removed labels");
        Ok(())
    }
}

/// Turn a non-success response into `AppError::Forge` carrying the body.
async fn ensure_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Forge(format!("{what} failed with {status}: {body}")))
}

impl ForgeClient for GiteeClient {
    fn get_path_content<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
        path: &'a str,
        git_ref: &'a str,
    ) -> ForgeFuture<'a, RepoContent> {
        Box::pin(async move {
            let mut segments = vec!["repos", org, repo, "contents"];
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            let mut url = self.endpoint(segments)?;
            url.query_pairs_mut().append_pair("ref", git_ref);

            let response = self.http.get(url).send().await?;
            let response = ensure_success(response, "get path content").await?;
            let content = response.json::<RepoContent>().await?;
            debug!(org, repo, path, git_ref, "fetched path content");
            Ok(content)
        })
    }

    fn add_label<'a>(&'a self, pr: &'a PrRef, label: &'a str) -> ForgeFuture<'a, ()> {
        Box::pin(async move {
            let url = self.pull_labels_url(pr, None)?;
            let response = self.http.post(url).json(&json!([label])).send().await?;
            ensure_success(response, "add label").await?;
            info!(%pr, label, "added label");
            Ok(())
        })
    }

    fn remove_label<'a>(&'a self, pr: &'a PrRef, label: &'a str) -> ForgeFuture<'a, ()> {
        Box::pin(self.delete_labels(pr, label))
    }

    fn remove_labels<'a>(&'a self, pr: &'a PrRef, labels: &'a [String]) -> ForgeFuture<'a, ()> {
        Box::pin(async move {
            if labels.is_empty() {
                return Ok(());
            }
            self.delete_labels(pr, &labels.join(",")).await
        })
    }

    fn create_comment<'a>(&'a self, pr: &'a PrRef, body: &'a str) -> ForgeFuture<'a, ()> {
        Box::pin(async move {
            let number = pr.number.to_string();
            let url = self.endpoint([
                "repos",
                pr.org.as_str(),
                pr.repo.as_str(),
                "pulls",
                number.as_str(),
                "comments",
            ])?;
            let response = self
                .http
                .post(url)
                .json(&json!({ "body": body }))
                .send()
                .await?;
            ensure_success(response, "create comment").await?;
            info!(%pr, "posted comment");
            Ok(())
        })
    }
}
