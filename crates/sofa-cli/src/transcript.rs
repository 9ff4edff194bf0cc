use anyhow::{anyhow, Result};
use sofa_thread::MessageId;

/// One line of a transcript file: `> raw` for outgoing, `< raw` for incoming.
/// Blank lines and `#` comments are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine<'a> {
    /// 1-based position in the file.
    pub number: usize,
    pub is_outgoing: bool,
    pub raw: &'a str,
}

impl TranscriptLine<'_> {
    /// Stable across runs, so a payment store can be shared between
    /// `project` and `transition`.
    pub fn message_id(&self) -> MessageId {
        MessageId::new(format!("line-{}", self.number))
    }
}

pub fn parse(text: &str) -> Result<Vec<TranscriptLine<'_>>> {
    let mut lines = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (is_outgoing, raw) = if let Some(raw) = line.strip_prefix('>') {
            (true, raw)
        } else if let Some(raw) = line.strip_prefix('<') {
            (false, raw)
        } else {
            return Err(anyhow!(
                "line {}: expected `>` (outgoing) or `<` (incoming)",
                number + 1
            ));
        };
        lines.push(TranscriptLine {
            number: number + 1,
            is_outgoing,
            raw: raw.trim(),
        });
    }
    Ok(lines)
}
