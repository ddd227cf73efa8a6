use tracing::debug;

use recipe_common::CandidateItem;

use crate::traits::{TranscriptSegment, VideoSource};

/// Description, transcript and top comments for one candidate, joined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledDocument {
    pub text: String,
    pub has_transcript: bool,
    pub comment_count: usize,
}

/// Join the non-empty parts with blank lines, in source order.
pub fn join_parts(description: &str, transcript: &str, comments: &[String]) -> String {
    let comments = comments
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    [description.trim(), transcript.trim(), comments.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn transcript_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch the transcript and comments and assemble the document. Never fails:
/// a sub-fetch error becomes an empty component.
pub async fn gather(
    source: &dyn VideoSource,
    item: &CandidateItem,
    comment_limit: u32,
) -> AssembledDocument {
    let transcript = match source.transcript(&item.id).await {
        Ok(segments) => transcript_text(&segments),
        Err(e) => {
            debug!(video_id = item.id.as_str(), error = %e, "No transcript");
            String::new()
        }
    };

    let comments = if comment_limit == 0 {
        Vec::new()
    } else {
        match source.comments(&item.id, comment_limit).await {
            Ok(comments) => comments,
            Err(e) => {
                debug!(video_id = item.id.as_str(), error = %e, "No comments");
                Vec::new()
            }
        }
    };

    AssembledDocument {
        text: join_parts(&item.description, &transcript, &comments),
        has_transcript: !transcript.is_empty(),
        comment_count: comments.len(),
    }
}
