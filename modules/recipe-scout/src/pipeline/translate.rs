use tracing::{debug, warn};

use crate::pipeline::{prompt_excerpt, StageError};
use crate::traits::{CompletionRequest, TextCompleter};

const TRANSLATE_SYSTEM: &str = "You are a translator. Translate the user's text into natural \
Korean. Keep quantities, units and proper nouns. Reply with the translation only.";

const TRANSLATE_MAX_TOKENS: u32 = 2048;

const LINE_MAX_TOKENS: u32 = 256;

/// True when the text contains at least one Hangul syllable.
pub fn is_likely_target_language(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}

/// Normalize a document to Korean. Korean and empty input pass through
/// without a model call; a failed call fails the candidate.
pub async fn to_korean(completer: &dyn TextCompleter, text: &str) -> Result<String, StageError> {
    if text.trim().is_empty() || is_likely_target_language(text) {
        return Ok(text.to_string());
    }

    let request = CompletionRequest::new(TRANSLATE_SYSTEM, prompt_excerpt(text), TRANSLATE_MAX_TOKENS);
    let translated = completer
        .complete(request)
        .await
        .map_err(StageError::Translate)?;
    debug!(chars_in = text.len(), chars_out = translated.len(), "Document translated");
    Ok(translated)
}

/// Translate individual extracted lines that are not already Korean.
/// A failed line keeps its original text.
pub async fn lines_to_korean(completer: &dyn TextCompleter, lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if line.trim().is_empty() || is_likely_target_language(&line) {
            out.push(line);
            continue;
        }
        let request = CompletionRequest::new(TRANSLATE_SYSTEM, line.as_str(), LINE_MAX_TOKENS);
        match completer.complete(request).await {
            Ok(translated) if !translated.trim().is_empty() => out.push(translated.trim().to_string()),
            Ok(_) => out.push(line),
            Err(e) => {
                warn!(error = %e, "Line translation failed, keeping original");
                out.push(line);
            }
        }
    }
    out
}
