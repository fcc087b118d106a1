//! Mastodon REST client backing the engine's fetch boundary.
//!
//! Timeline pages come from `/api/v1/timelines/public` using the
//! `max_id`/`min_id` cursor parameters; conversation context comes from
//! `/api/v1/statuses/:id/context`. Responses are decoded into the
//! engine's [`Status`] slice and everything else the server sends is
//! dropped here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use flock_core::error::FetchError;
use flock_core::fetch::{Fetcher, Page};
use flock_core::model::{Status, StatusId};
use serde::Deserialize;

/// HTTP client bound to one server.
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    page_size: u32,
}

/// A focal status with its thread context, as returned by the server.
pub struct Context {
    pub focal: Status,
    pub ancestors: Vec<Status>,
    pub descendants: Vec<Status>,
}

impl ApiClient {
    pub fn new(config: &crate::config::Config) -> Self {
        let timeout = Duration::from_secs(config.server.timeout_secs);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .user_agent(concat!("flock/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: config.server.base_url.trim_end_matches('/').to_string(),
            page_size: config.timeline.page_size,
        }
    }

    /// Fetch the focal status plus its ancestor and descendant context.
    pub fn fetch_context(&self, id: &StatusId) -> Result<Context, FetchError> {
        let focal: StatusDto =
            decode(self.call(&format!("/api/v1/statuses/{}", id.as_str()), &[])?)?;
        let context: ContextDto =
            decode(self.call(&format!("/api/v1/statuses/{}/context", id.as_str()), &[])?)?;
        Ok(Context {
            focal: focal.into(),
            ancestors: context.ancestors.into_iter().map(Into::into).collect(),
            descendants: context.descendants.into_iter().map(Into::into).collect(),
        })
    }

    fn timeline_page(&self, extra: &[(&str, &str)]) -> Result<Page, FetchError> {
        let limit = self.page_size.to_string();
        let mut params = vec![("limit", limit.as_str())];
        params.extend_from_slice(extra);

        let dtos: Vec<StatusDto> = decode(self.call("/api/v1/timelines/public", &params)?)?;
        // The server omits a page count; a short page means the end of
        // the available span.
        let has_more = dtos.len() as u32 >= self.page_size;
        Ok(Page {
            statuses: dtos.into_iter().map(Into::into).collect(),
            has_more,
        })
    }

    fn call(&self, path: &str, params: &[(&str, &str)]) -> Result<ureq::Response, FetchError> {
        let mut request = self.agent.get(&format!("{}{path}", self.base_url));
        for (key, value) in params {
            request = request.query(key, value);
        }
        request.call().map_err(|err| match err {
            ureq::Error::Status(code, _) => FetchError::Server(code),
            ureq::Error::Transport(transport) => FetchError::Network(transport.to_string()),
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T, FetchError> {
    response
        .into_json()
        .map_err(|err| FetchError::Decode(err.to_string()))
}

impl Fetcher for ApiClient {
    fn fetch_latest(&self) -> Result<Page, FetchError> {
        self.timeline_page(&[])
    }

    fn fetch_older(&self, before: &StatusId) -> Result<Page, FetchError> {
        self.timeline_page(&[("max_id", before.as_str())])
    }

    fn fetch_gap(&self, anchor: &StatusId, until: Option<&StatusId>) -> Result<Page, FetchError> {
        // The missing span sits directly below the anchor.
        let mut params = vec![("max_id", anchor.as_str())];
        if let Some(until) = until {
            params.push(("min_id", until.as_str()));
        }
        self.timeline_page(&params)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatusDto {
    id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    in_reply_to_id: Option<String>,
    #[serde(default)]
    replies_count: u32,
    account: AccountDto,
    #[serde(default)]
    content: String,
    #[serde(default)]
    sensitive: bool,
    #[serde(default)]
    spoiler_text: String,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    acct: String,
}

#[derive(Debug, Deserialize)]
struct ContextDto {
    #[serde(default)]
    ancestors: Vec<StatusDto>,
    #[serde(default)]
    descendants: Vec<StatusDto>,
}

impl From<StatusDto> for Status {
    fn from(dto: StatusDto) -> Self {
        Self {
            id: StatusId::new(dto.id),
            created_at: dto.created_at,
            in_reply_to: dto.in_reply_to_id.map(StatusId::new),
            replies_count: dto.replies_count,
            account: dto.account.acct,
            content: strip_html(&dto.content),
            sensitive: dto.sensitive,
            spoiler_text: dto.spoiler_text,
        }
    }
}

/// Reduce the server's HTML body to plain text for terminal display.
///
/// Tags are dropped, `<br>` and `</p>` become line breaks, and the few
/// entities Mastodon emits are unescaped. Not a general HTML parser.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[open + 1..open + close];
        if tag.starts_with("br") || tag == "/p" {
            out.push('\n');
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);

    let out = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    out.trim_end_matches('\n').to_string()
}
