use std::time::Duration;

use async_trait::async_trait;
use kotatsu_schema::{MediaCategory, MediaResult, ReleaseDate};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::text::clean_description;
use crate::{LookupError, MediaCatalog};

pub const ANILIST_URL: &str = "https://graphql.anilist.co";
const REQUEST_TIMEOUT_SECS: u64 = 8;
const UNTITLED: &str = "Untitled";

const SEARCH_QUERY: &str = r#"query ($search: String!, $type: MediaType, $isAdult: Boolean) {
  Page(page: 1, perPage: 1) {
    media(search: $search, type: $type, isAdult: $isAdult) {
      id
      siteUrl
      title { romaji english native }
      description(asHtml: false)
      genres
      coverImage { large color }
      format
      startDate { year month day }
    }
  }
}"#;

/// AniList GraphQL client. One search per call, at most one record back.
#[derive(Debug, Clone)]
pub struct AniListClient {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for AniListClient {
    fn default() -> Self {
        Self::new(ANILIST_URL)
    }
}

impl AniListClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn to_request(name: &str, category: MediaCategory, allow_adult: bool) -> serde_json::Value {
        let mut variables = serde_json::json!({
            "search": name,
            "type": category.as_str(),
        });
        // Omitting isAdult lifts the filter; false excludes adult entries.
        if !allow_adult {
            variables["isAdult"] = serde_json::Value::Bool(false);
        }
        serde_json::json!({ "query": SEARCH_QUERY, "variables": variables })
    }
}

#[async_trait]
impl MediaCatalog for AniListClient {
    async fn search(
        &self,
        name: &str,
        category: MediaCategory,
        allow_adult: bool,
    ) -> Result<Option<MediaResult>, LookupError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&Self::to_request(name, category, allow_adult))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            tracing::debug!(%status, body = %body, "anilist returned non-success status");
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse = serde_json::from_str(&body)?;
        parse_response(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    data: Option<ApiData>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    #[serde(rename = "Page")]
    page: Option<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    media: Vec<ApiMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMedia {
    id: i64,
    #[serde(default)]
    site_url: Option<String>,
    #[serde(default)]
    title: ApiTitle,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    cover_image: Option<ApiCoverImage>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    start_date: Option<ApiDate>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiTitle {
    english: Option<String>,
    romaji: Option<String>,
    native: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCoverImage {
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

fn parse_response(resp: ApiResponse) -> Result<Option<MediaResult>, LookupError> {
    let Some(data) = resp.data else {
        let message = resp
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(if message.is_empty() {
            LookupError::Malformed("response has neither data nor errors".into())
        } else {
            LookupError::Remote(message)
        });
    };

    let Some(media) = data.page.and_then(|page| page.media.into_iter().next()) else {
        return Ok(None);
    };
    Ok(Some(normalize(media)))
}

fn pick_title(title: &ApiTitle) -> String {
    [&title.english, &title.romaji, &title.native]
        .into_iter()
        .flatten()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

fn normalize(media: ApiMedia) -> MediaResult {
    let release_date = media.start_date.and_then(|d| {
        d.year.map(|year| ReleaseDate {
            year,
            month: d.month,
            day: d.day,
        })
    });

    MediaResult {
        catalog_id: media.id,
        title: pick_title(&media.title),
        description: clean_description(media.description.as_deref().unwrap_or_default()),
        genres: media.genres,
        cover_image_url: media
            .cover_image
            .and_then(|c| c.large)
            .filter(|u| !u.is_empty()),
        site_url: media
            .site_url
            .unwrap_or_else(|| format!("https://anilist.co/{}/{}", media_path(media.format.as_deref()), media.id)),
        format: media.format,
        release_date,
    }
}

fn media_path(format: Option<&str>) -> &'static str {
    match format {
        Some("MANGA" | "NOVEL" | "ONE_SHOT") => "manga",
        _ => "anime",
    }
}
