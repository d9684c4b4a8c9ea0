//! Batch blog rewriter.
//!
//! Rewrites posts one at a time, fewest existing names first, with a bounded
//! retry budget per post. A post that exhausts its budget is recorded as a
//! failure and the batch moves on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use soulseed_llm::{ChatModel, ChatRequest};
use soulseed_names::{blog_stats, extract_unique_names};
use soulseed_shared::{BlogPost, RewriteConfig, Result, SoulseedError};
use soulseed_storage::{REWRITE_SUMMARY_DOC, Storage};

/// Existing names quoted back to the model as hints.
const NAME_HINT_LIMIT: usize = 20;

pub const REWRITE_SYSTEM_PROMPT: &str = r#"You are an expert baby name writer creating beautiful, spiritual, and witty blog posts.

CRITICAL REQUIREMENTS:
1. Include EXACTLY 50+ unique baby names (count them!)
2. Format ALL names as: <strong>Name</strong>
3. Add 3+ cute nickname suggestions after EACH name (e.g., "Luna (Lulu, Lu-Lu, Lunita)")
4. Write with warmth, sensitivity, and spiritual insight
5. Mobile-first formatting (short paragraphs, 2-3 sentences max)
6. Spread names EVENLY throughout the entire article
7. Make it engaging, witty, and heartfelt

NICKNAME REQUIREMENTS:
- At LEAST 3 nicknames per name
- Make them cute, creative, and diverse
- Include traditional, modern, and playful variations

STRUCTURE:
- Opening: set the tone (2-3 short paragraphs)
- Body: present names in themed sections (5-8 names per section), each with an h2 header
- Each name gets its meaning or origin, why it's special, and 3+ nickname options
- Heartwarming conclusion (2-3 paragraphs)
- Add the <!-- BLOG_NAME_LIST_COMPONENT --> placeholder at the very end

FORMATTING EXAMPLE:
<h2>Luminous Choices</h2>
<p><strong>Aurora</strong> - The goddess of dawn brings light to new beginnings.</p>
<p>Sweet nicknames: Rory, Aura, Rora, Ori, Rorie</p>

REMEMBER: count your names. You MUST include 50+ unique names minimum."#;

// ---------------------------------------------------------------------------
// Item state
// ---------------------------------------------------------------------------

/// Lifecycle of one post within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Generating { attempt: u32 },
    Retry { attempt: u32 },
    Success,
    Failed,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Generating { attempt } => write!(f, "generating (attempt {attempt})"),
            Self::Retry { attempt } => write!(f, "retry after attempt {attempt}"),
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Verdict on one generated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCheck {
    pub accepted: bool,
    pub unique_names: usize,
    pub names: Vec<String>,
}

/// Domain acceptance rule applied after a successful model call.
pub trait ContentValidator: Send + Sync {
    fn validate(&self, html: &str) -> ContentCheck;
}

/// Accepts content carrying at least `minimum` unique name markers.
#[derive(Debug, Clone, Copy)]
pub struct MinimumNamesValidator {
    pub minimum: usize,
}

impl ContentValidator for MinimumNamesValidator {
    fn validate(&self, html: &str) -> ContentCheck {
        let names = extract_unique_names(html);
        ContentCheck {
            accepted: names.len() >= self.minimum,
            unique_names: names.len(),
            names,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSuccess {
    pub success: bool,
    pub post_id: String,
    pub title: String,
    pub before: usize,
    pub after: usize,
    pub words: usize,
    pub names: Vec<String>,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub success: bool,
    pub post_id: String,
    pub title: String,
    pub attempts: u32,
    pub error: String,
}

/// Result of processing one post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemOutcome {
    Success(ItemSuccess),
    Failure(ItemFailure),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn post_id(&self) -> &str {
        match self {
            Self::Success(s) => &s.post_id,
            Self::Failure(f) => &f.post_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Success(s) => &s.title,
            Self::Failure(f) => &f.title,
        }
    }
}

/// Totals for a full run. Also persisted as the summary document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteSummary {
    pub completed_at: DateTime<Utc>,
    pub total_posts: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<ItemOutcome>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for rewrite runs.
pub trait RewriteProgress: Send + Sync {
    /// Called before a post is first sent to the model.
    fn item_started(&self, index: usize, total: usize, title: &str);
    /// Called once per post with its final outcome.
    fn item_finished(&self, outcome: &ItemOutcome);
}

/// No-op rewrite progress.
pub struct SilentRewriteProgress;

impl RewriteProgress for SilentRewriteProgress {
    fn item_started(&self, _index: usize, _total: usize, _title: &str) {}
    fn item_finished(&self, _outcome: &ItemOutcome) {}
}

// ---------------------------------------------------------------------------
// Rewriter
// ---------------------------------------------------------------------------

/// A post queued for rewriting, with its names extracted from current content.
struct QueuedPost {
    post: BlogPost,
    existing: Vec<String>,
}

impl QueuedPost {
    fn new(post: BlogPost) -> Self {
        let existing = extract_unique_names(&post.content);
        Self { post, existing }
    }
}

#[derive(Clone)]
pub struct BlogRewriter {
    model: Arc<dyn ChatModel>,
    storage: Arc<Storage>,
    validator: Arc<dyn ContentValidator>,
    config: RewriteConfig,
}

impl BlogRewriter {
    pub fn new(
        model: Arc<dyn ChatModel>,
        storage: Arc<Storage>,
        validator: Arc<dyn ContentValidator>,
        config: RewriteConfig,
    ) -> Self {
        Self {
            model,
            storage,
            validator,
            config,
        }
    }

    /// Rewriter using [`MinimumNamesValidator`] with the configured minimum.
    pub fn with_default_validator(
        model: Arc<dyn ChatModel>,
        storage: Arc<Storage>,
        config: RewriteConfig,
    ) -> Self {
        let validator = Arc::new(MinimumNamesValidator {
            minimum: config.min_names,
        });
        Self::new(model, storage, validator, config)
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Rewrite every post with the configured status and write the summary.
    pub async fn rewrite_all(&self) -> Result<RewriteSummary> {
        self.rewrite_all_with_progress(&SilentRewriteProgress).await
    }

    #[instrument(skip_all, fields(status = %self.config.collection_status))]
    pub async fn rewrite_all_with_progress(
        &self,
        progress: &dyn RewriteProgress,
    ) -> Result<RewriteSummary> {
        let posts = self
            .storage
            .list_blogs_by_status(&self.config.collection_status)
            .await?;

        let mut queue: Vec<QueuedPost> = posts.into_iter().map(QueuedPost::new).collect();
        queue.sort_by_key(|q| q.existing.len());

        info!(posts = queue.len(), "starting rewrite run");
        for (i, q) in queue.iter().enumerate() {
            debug!(
                position = i + 1,
                title = %q.post.title,
                existing = q.existing.len(),
                "queued"
            );
        }

        let total = queue.len();
        let mut results = Vec::with_capacity(total);
        for (i, queued) in queue.iter().enumerate() {
            progress.item_started(i, total, &queued.post.title);
            let outcome = self.process(queued).await;
            progress.item_finished(&outcome);
            results.push(outcome);

            if i + 1 < total {
                pause(self.config.item_delay_ms).await;
            }
        }

        let success_count = results.iter().filter(|r| r.is_success()).count();
        let summary = RewriteSummary {
            completed_at: Utc::now(),
            total_posts: total,
            success_count,
            fail_count: total - success_count,
            results,
        };

        self.storage
            .put_system_doc(REWRITE_SUMMARY_DOC, &serde_json::to_value(&summary)?)
            .await?;

        info!(
            total = summary.total_posts,
            succeeded = summary.success_count,
            failed = summary.fail_count,
            "rewrite run complete"
        );
        Ok(summary)
    }

    /// Rewrite one post regardless of its status.
    ///
    /// Returns [`SoulseedError::NotFound`] for an unknown id. An exhausted
    /// retry budget is an `Ok` failure outcome, not an error.
    #[instrument(skip(self))]
    pub async fn rewrite_one(&self, post_id: &str) -> Result<ItemOutcome> {
        let post = self
            .storage
            .get_blog(post_id)
            .await?
            .ok_or_else(|| SoulseedError::NotFound(format!("blog post {post_id}")))?;
        Ok(self.process(&QueuedPost::new(post)).await)
    }

    /// Run the retry loop for one post. Never returns an error.
    async fn process(&self, queued: &QueuedPost) -> ItemOutcome {
        let post = &queued.post;
        let max_attempts = self.config.max_attempts.max(1);
        let request = ChatRequest::new(
            &self.config.model,
            REWRITE_SYSTEM_PROMPT,
            build_rewrite_prompt(post, &queued.existing, self.config.min_names),
            self.config.temperature,
        )
        .max_tokens(self.config.max_tokens);

        debug!(post_id = %post.id, state = %ItemState::Pending, "state");
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            debug!(post_id = %post.id, state = %ItemState::Generating { attempt }, "state");

            match self.attempt(post, &request).await {
                Ok(Ok(success)) => {
                    info!(
                        post_id = %post.id,
                        title = %post.title,
                        before = queued.existing.len(),
                        after = success.unique_names,
                        attempt,
                        "post rewritten"
                    );
                    return ItemOutcome::Success(ItemSuccess {
                        success: true,
                        post_id: post.id.clone(),
                        title: post.title.clone(),
                        before: queued.existing.len(),
                        after: success.unique_names,
                        words: success.words,
                        names: success.names,
                        attempts: attempt,
                    });
                }
                Ok(Err(rejected)) => {
                    warn!(
                        post_id = %post.id,
                        unique_names = rejected.unique_names,
                        minimum = self.config.min_names,
                        attempt,
                        "too few names, retrying"
                    );
                    last_error = format!(
                        "only {} unique names, need {}",
                        rejected.unique_names, self.config.min_names
                    );
                }
                Err(e) => {
                    warn!(post_id = %post.id, attempt, error = %e, "rewrite attempt failed");
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                debug!(post_id = %post.id, state = %ItemState::Retry { attempt }, "state");
                pause(self.config.retry_delay_ms).await;
            }
        }

        warn!(post_id = %post.id, state = %ItemState::Failed, error = %last_error, "giving up");
        ItemOutcome::Failure(ItemFailure {
            success: false,
            post_id: post.id.clone(),
            title: post.title.clone(),
            attempts: max_attempts,
            error: format!("failed after {max_attempts} attempts: {last_error}"),
        })
    }

    /// One model call. The outer `Result` is transport and persistence; the
    /// inner one is the validator's verdict.
    async fn attempt(
        &self,
        post: &BlogPost,
        request: &ChatRequest,
    ) -> Result<std::result::Result<Accepted, ContentCheck>> {
        let completion = self.model.complete(request).await?;
        let content = completion.text.trim();

        let check = self.validator.validate(content);
        if !check.accepted {
            return Ok(Err(check));
        }

        let stats = blog_stats(content, self.config.words_per_minute);
        self.storage
            .update_blog_content(&post.id, content, &stats)
            .await?;
        debug!(post_id = %post.id, state = %ItemState::Success, "state");

        Ok(Ok(Accepted {
            unique_names: check.unique_names,
            names: check.names,
            words: stats.word_count,
        }))
    }
}

struct Accepted {
    unique_names: usize,
    names: Vec<String>,
    words: usize,
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// User prompt for one post.
pub fn build_rewrite_prompt(post: &BlogPost, existing: &[String], min_names: usize) -> String {
    let hints = existing
        .iter()
        .take(NAME_HINT_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Rewrite this blog post with MINIMUM {min_names} unique baby names:

TITLE: {title}
CATEGORY: {category}
SLUG: {slug}

CURRENT CONTENT ({count} names - TOO FEW!):
{content}

REQUIREMENTS:
- Include {min_names}+ unique names (count them!)
- Add 3+ CUTE NICKNAMES for EACH name
- Keep the same title and theme
- Mobile-friendly formatting (short paragraphs, 2-3 sentences)
- Witty, sensitive, spiritual tone
- Spread names evenly throughout
- Add <!-- BLOG_NAME_LIST_COMPONENT --> at the very end
- Use these database names when possible: {hints}...

Write the complete HTML content (no markdown, pure HTML with <h2>, <p>, <strong> tags)."#,
        title = post.title,
        category = post.category,
        slug = post.slug,
        count = existing.len(),
        content = post.content,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
