use std::path::Path;

use serde::{Deserialize, Serialize, de::Error as DeError};
use serde_json::Deserializer;
use tracing::debug;

use crate::{error::Result, jj::Vcs};

/// Number of characters of a change identity shown to the user.
const SHORT_ID_LEN: usize = 12;

/// A revision as reported by `jj log -T 'json(self)'`.
///
/// Changes are read-only snapshots: after a command runs, the same identity is
/// fetched again rather than updating a record in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Stable identity of the revision across rewrites.
    pub change_id: String,
    /// Identity of the concrete snapshot content.
    pub commit_id: String,
    /// Free-text description; empty when unset.
    #[serde(default)]
    pub description: String,
    /// Parent commit identities, in order. The first entry is the rewrite target.
    #[serde(default)]
    pub parents: Vec<String>,
}

impl Change {
    /// Change identity truncated for display.
    pub fn short_id(&self) -> &str {
        short_id(&self.change_id)
    }

    /// First line of the description, or a placeholder when none is set.
    pub fn summary(&self) -> &str {
        self.description
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("(no description set)")
    }
}

/// Truncate an identity to its display prefix.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Resolve `revset` into an ordered list of changes, querying from `cwd`.
pub fn resolve(vcs: &dyn Vcs, revset: &str, cwd: &Path) -> Result<Vec<Change>> {
    let stream = vcs.log_json(revset, cwd)?;
    let changes = parse_changes(&stream);
    debug!(revset, count = changes.len(), "resolved changes");
    Ok(changes)
}

/// Parse a concatenation of JSON change records.
///
/// Records are not guaranteed to be newline-delimited. Each step decodes one
/// record at the current offset and advances past the bytes it consumed. A
/// record that fails to decode is treated as noise: parsing resumes after the
/// next line break, and stops if there is none.
pub fn parse_changes(stream: &str) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut offset = 0;

    loop {
        let rest = stream[offset..].trim_start();
        if rest.is_empty() {
            break;
        }
        offset = stream.len() - rest.len();

        match decode_one(rest) {
            Ok((change, consumed)) => {
                changes.push(change);
                offset += consumed;
            }
            Err(err) => {
                debug!(offset, error = %err, "skipping undecodable change record");
                match rest.find('\n') {
                    Some(newline) => offset += newline + 1,
                    None => break,
                }
            }
        }
    }

    changes
}

/// Decode a single record from the start of `input`, returning it together
/// with the number of bytes consumed.
fn decode_one(input: &str) -> serde_json::Result<(Change, usize)> {
    let mut records = Deserializer::from_str(input).into_iter::<Change>();
    match records.next() {
        Some(Ok(change)) => Ok((change, records.byte_offset())),
        Some(Err(err)) => Err(err),
        None => Err(DeError::custom("no record at offset")),
    }
}
