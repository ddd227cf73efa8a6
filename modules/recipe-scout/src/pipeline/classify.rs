use std::collections::BTreeSet;

use tracing::debug;

use recipe_common::{CategoryLabel, CategoryMode, PRIMARY_CATEGORIES};

use crate::pipeline::{prompt_excerpt, Rejection, Skip, StageError};
use crate::traits::{CompletionRequest, TextCompleter};

const CLASSIFY_MAX_TOKENS: u32 = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Matched a vocabulary entry.
    Known(CategoryLabel),
    /// Dynamic mode: a coerced label not in the vocabulary.
    Discovered(CategoryLabel),
}

impl Classification {
    pub fn into_label(self) -> CategoryLabel {
        match self {
            Classification::Known(label) | Classification::Discovered(label) => label,
        }
    }
}

pub fn system_prompt(vocabulary: &[String], discovered: &BTreeSet<CategoryLabel>, mode: CategoryMode) -> String {
    let mut prompt = String::from(
        "You classify cooking videos. Answer with exactly one category label of the form \
         \"<primary>-<secondary>\" and nothing else.\n",
    );
    prompt.push_str(&format!("Primary categories: {}.\n", PRIMARY_CATEGORIES.join(", ")));
    match mode {
        CategoryMode::Closed => {
            prompt.push_str("You must choose one of these labels:\n");
        }
        CategoryMode::Dynamic => {
            prompt.push_str(
                "Prefer one of these labels. If none fits, invent a new one with a known \
                 primary category and the dish type as the secondary part:\n",
            );
        }
    }
    for label in vocabulary {
        prompt.push_str(&format!("- {label}\n"));
    }
    if mode == CategoryMode::Dynamic {
        for label in discovered {
            prompt.push_str(&format!("- {label}\n"));
        }
    }
    prompt
}

/// Match raw model output against the vocabulary, ignoring quoting and
/// whitespace around the separator.
pub fn match_vocabulary(raw: &str, vocabulary: &[String]) -> Option<CategoryLabel> {
    let candidate = CategoryLabel::parse(raw)?;
    vocabulary
        .iter()
        .filter_map(|entry| CategoryLabel::parse(entry))
        .find(|entry| entry == &candidate)
}

/// Apply the category mode to raw model output.
pub fn resolve(raw: &str, vocabulary: &[String], mode: CategoryMode) -> Result<Classification, Rejection> {
    if let Some(label) = match_vocabulary(raw, vocabulary) {
        return Ok(Classification::Known(label));
    }
    match mode {
        CategoryMode::Closed => Err(Rejection::CategoryOutsideVocabulary {
            label: raw.trim().to_string(),
        }),
        CategoryMode::Dynamic => {
            let label = CategoryLabel::coerce(raw);
            if label.has_known_primary() {
                Ok(Classification::Discovered(label))
            } else {
                Ok(Classification::Discovered(CategoryLabel::other(raw)))
            }
        }
    }
}

/// Ask the model for a label and resolve it against the vocabulary.
pub async fn classify(
    completer: &dyn TextCompleter,
    title: &str,
    document: &str,
    vocabulary: &[String],
    discovered: &BTreeSet<CategoryLabel>,
    mode: CategoryMode,
) -> Result<Classification, Skip> {
    let user = format!("Title: {title}\n\n{}", prompt_excerpt(document));
    let request = CompletionRequest::new(system_prompt(vocabulary, discovered, mode), user, CLASSIFY_MAX_TOKENS);
    let raw = completer
        .complete(request)
        .await
        .map_err(StageError::Classify)?;
    debug!(raw = raw.as_str(), ?mode, "Category classified");
    Ok(resolve(&raw, vocabulary, mode)?)
}
