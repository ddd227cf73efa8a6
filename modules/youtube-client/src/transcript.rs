use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::TranscriptSegment;

/// Parse the timedtext XML format:
/// `<transcript><text start="1.2" dur="3.4">...</text></transcript>`.
///
/// Cues without a usable `start` are skipped. A malformed document keeps the
/// cues read before the error.
pub fn parse_timedtext(xml: &str) -> Vec<TranscriptSegment> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut cue: Option<(f64, f64)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => {
                cue = cue_timing(&e);
                text.clear();
            }
            Ok(Event::Text(e)) if cue.is_some() => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                if let Some((start, duration)) = cue.take() {
                    let decoded = decode_entities(&text);
                    let normalized = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !normalized.is_empty() {
                        segments.push(TranscriptSegment {
                            text: normalized,
                            start,
                            duration,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    position = reader.buffer_position(),
                    "Malformed timedtext, keeping cues parsed so far"
                );
                break;
            }
            _ => {}
        }
    }
    segments
}

fn cue_timing(start_tag: &BytesStart) -> Option<(f64, f64)> {
    let mut start = None;
    let mut duration = 0.0;
    for attr in start_tag.attributes().flatten() {
        let value = std::str::from_utf8(&attr.value).ok()?;
        match attr.key.as_ref() {
            b"start" => start = value.trim().parse().ok(),
            b"dur" => duration = value.trim().parse().unwrap_or(0.0),
            _ => {}
        }
    }
    Some((start?, duration))
}

/// Caption text is entity-escaped, sometimes twice (`&amp;#39;`).
fn decode_entities(raw: &str) -> String {
    let once = html_escape::decode_html_entities(raw);
    if once.contains('&') {
        html_escape::decode_html_entities(&once).into_owned()
    } else {
        once.into_owned()
    }
}
