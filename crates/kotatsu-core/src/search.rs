use std::sync::Arc;

use futures_util::future::join_all;
use kotatsu_provider::MediaCatalog;
use kotatsu_schema::{InboundMessage, MediaCategory, MediaResult, OutboundMessage};
use tokio::task::JoinHandle;

use crate::forum::ForumApi;
use crate::patterns::extract_media_names;
use crate::render::{render_media, render_media_list};
use crate::scope::{ScopeConfig, ScopeRejection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Disabled,
    Ignored(ScopeRejection),
    NoCandidates,
    NoMatches,
    Posted {
        category: MediaCategory,
        matched: usize,
    },
    /// The channel could not be read, or the reply could not be sent.
    Failed,
}

/// Looks up media named inline in ordinary messages and posts summaries.
pub struct SearchTrigger {
    api: Arc<dyn ForumApi>,
    catalog: Arc<dyn MediaCatalog>,
    scope: Arc<ScopeConfig>,
    enabled: bool,
}

impl SearchTrigger {
    pub fn new(
        api: Arc<dyn ForumApi>,
        catalog: Arc<dyn MediaCatalog>,
        scope: Arc<ScopeConfig>,
        enabled: bool,
    ) -> Self {
        Self {
            api,
            catalog,
            scope,
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Runs [`scan`](Self::scan) on its own task so a slow catalog never
    /// holds up the caller.
    pub fn spawn(self: &Arc<Self>, msg: InboundMessage) -> JoinHandle<SearchOutcome> {
        let trigger = Arc::clone(self);
        tokio::spawn(async move { trigger.scan(&msg).await })
    }

    pub async fn scan(&self, msg: &InboundMessage) -> SearchOutcome {
        if !self.enabled {
            return SearchOutcome::Disabled;
        }
        if msg.author_is_bot {
            return SearchOutcome::Ignored(ScopeRejection::AutomatedAuthor);
        }
        // Cheap text check before touching the network.
        let Some(extraction) = extract_media_names(&msg.content) else {
            return SearchOutcome::NoCandidates;
        };

        let container = match self.api.fetch_container(msg.channel_id).await {
            Ok(container) => container,
            Err(e) => {
                tracing::warn!(
                    trace_id = %msg.trace_id,
                    channel_id = msg.channel_id,
                    "search: failed to fetch channel: {e}"
                );
                return SearchOutcome::Failed;
            }
        };
        if let Err(rejection) = self.scope.check_search(msg.author_is_bot, &container) {
            return SearchOutcome::Ignored(rejection);
        }

        let category = extraction.category;
        let allow_adult = container.nsfw;
        tracing::debug!(
            trace_id = %msg.trace_id,
            channel_id = container.id,
            %category,
            names = ?extraction.names,
            allow_adult,
            "search: extracted candidates"
        );

        let (embed, matched) = if let [name] = extraction.names.as_slice() {
            match self.lookup(msg, name, category, allow_adult).await {
                Some(media) => (render_media(&media), 1),
                None => return SearchOutcome::NoMatches,
            }
        } else {
            let matches: Vec<MediaResult> = join_all(
                extraction
                    .names
                    .iter()
                    .map(|name| self.lookup(msg, name, category, allow_adult)),
            )
            .await
            .into_iter()
            .flatten()
            .collect();
            match render_media_list(&matches) {
                Some(embed) => (embed, matches.len()),
                None => return SearchOutcome::NoMatches,
            }
        };

        match self
            .api
            .send_message(msg.channel_id, &OutboundMessage::embed(embed))
            .await
        {
            Ok(()) => SearchOutcome::Posted { category, matched },
            Err(e) => {
                tracing::warn!(
                    trace_id = %msg.trace_id,
                    channel_id = msg.channel_id,
                    "search: failed to post results: {e}"
                );
                SearchOutcome::Failed
            }
        }
    }

    /// Errors and misses both come back as `None`; errors are logged here.
    async fn lookup(
        &self,
        msg: &InboundMessage,
        name: &str,
        category: MediaCategory,
        allow_adult: bool,
    ) -> Option<MediaResult> {
        match self.catalog.search(name, category, allow_adult).await {
            Ok(Some(media)) => Some(media),
            Ok(None) => {
                tracing::debug!(trace_id = %msg.trace_id, name, %category, "search: no match");
                None
            }
            Err(e) => {
                tracing::warn!(trace_id = %msg.trace_id, name, %category, "search: lookup failed: {e}");
                None
            }
        }
    }
}
