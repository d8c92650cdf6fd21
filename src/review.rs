//! Change review: diff in, generated review out
//!
//! Collects the working-tree diff, retrieves the most relevant indexed
//! chunks for it, and hands diff + context to the generation model.

use crate::client::ReviewClient;
use crate::generation::GenerationProvider;
use crate::types::SearchResult;
use anyhow::Result;
use std::path::Path;

/// The diff text used as the retrieval query is capped at this many
/// characters; the generation prompt still carries the full diff
const MAX_QUERY_CHARS: usize = 8000;

pub(crate) const REVIEW_SYSTEM_PROMPT: &str = "\
You are an experienced software engineer reviewing a proposed change. \
You are given the unified diff of the change and snippets of the existing \
codebase that are semantically related to it. Point out bugs, regressions, \
missed edge cases, and inconsistencies with the surrounding code. Be \
specific: reference files and line numbers from the diff. If the change \
looks correct, say so briefly instead of inventing problems.";

pub(crate) async fn review_changes(
    client: &ReviewClient,
    root: &Path,
    generation: &dyn GenerationProvider,
) -> Result<String> {
    let diff = crate::git_diff::working_tree_diff(root)?;

    let query: String = diff.chars().take(MAX_QUERY_CHARS).collect();
    let context = client.search(root, &query, None).await?;

    tracing::info!(
        "Reviewing {} chars of diff with {} context snippets via '{}'",
        diff.len(),
        context.len(),
        generation.model_name()
    );

    let prompt = build_review_prompt(&diff, &context);
    generation.generate(&prompt, REVIEW_SYSTEM_PROMPT).await
}

/// Assemble the generation prompt from the diff and retrieved snippets
pub(crate) fn build_review_prompt(diff: &str, context: &[SearchResult]) -> String {
    let mut prompt = String::new();

    if context.is_empty() {
        prompt.push_str("No related code was found in the index.\n\n");
    } else {
        prompt.push_str("Related code from the repository:\n\n");
        for result in context {
            prompt.push_str(&format!(
                "--- {} (lines {}-{}",
                result.path, result.start_line, result.end_line
            ));
            if let Some(symbol) = &result.symbol {
                prompt.push_str(&format!(", {symbol}"));
            }
            prompt.push_str(")\n");
            prompt.push_str(&result.content);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str("The change to review:\n\n```diff\n");
    prompt.push_str(diff);
    if !diff.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```\n");

    prompt
}
