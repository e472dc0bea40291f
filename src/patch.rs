use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;

/// Marker that opens a hunk header
const HUNK_MARKER: &str = "@@";
/// Marker git emits after a line lacking a trailing newline
const NO_NEWLINE_MARKER: char = '\\';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// A hunk header whose new-file range is missing, not numeric, or can't
    /// hold the lines the hunk adds
    #[error("Malformed hunk header on patch line {line}: {header:?}")]
    MalformedHunkHeader { line: usize, header: String },
}

/// Post-change line numbers (1-indexed) introduced by a single patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedLines {
    lines: Vec<u32>,
    members: HashSet<u32>,
}

impl AddedLines {
    fn from_lines(lines: Vec<u32>) -> Self {
        let members = lines.iter().copied().collect();
        Self { lines, members }
    }

    pub fn contains(&self, line: u32) -> bool {
        self.members.contains(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line numbers in the order they appear in the patch
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.iter().copied()
    }
}

/// Turns unified-diff text into the set of lines it adds
pub trait PatchParser {
    fn parse(&self, patch: &str) -> Result<AddedLines, PatchError>;
}

/// Parser for the standard unified-diff hunk syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct UnifiedDiffParser;

impl PatchParser for UnifiedDiffParser {
    fn parse(&self, patch: &str) -> Result<AddedLines, PatchError> {
        parse_patch(patch)
    }
}

/// Parse a unified diff and collect the post-change numbers of its added lines
///
/// The cursor is re-anchored at every hunk header, so hunks never influence
/// each other. Context and added lines advance the cursor; removed lines don't.
/// Anything before the first hunk header (such as `---`/`+++` file headers) is
/// ignored.
pub fn parse_patch(patch: &str) -> Result<AddedLines, PatchError> {
    let mut lines = Vec::new();
    // None until the first hunk header is seen
    let mut hunk: Option<Hunk> = None;
    let mut position: u32 = 0;

    for (index, line) in split_lines(patch).enumerate() {
        if line.starts_with(HUNK_MARKER) {
            let current = Hunk {
                line: index + 1,
                header: line,
                start: 0,
            };
            let start = parse_new_start(line).ok_or_else(|| current.malformed())?;
            trace!("Hunk header at patch line {}: new start {}", index + 1, start);
            hunk = Some(Hunk { start, ..current });
            position = 0;
            continue;
        }

        let Some(hunk) = &hunk else {
            continue;
        };

        if line.starts_with('-') || line.starts_with(NO_NEWLINE_MARKER) {
            continue;
        }
        if line.starts_with('+') {
            // A `+0` range only describes an empty new side
            let added = hunk
                .start
                .checked_add(position)
                .filter(|&n| n >= 1)
                .ok_or_else(|| hunk.malformed())?;
            lines.push(added);
        }
        position = position.saturating_add(1);
    }

    Ok(AddedLines::from_lines(lines))
}

/// The hunk the cursor is anchored to
struct Hunk<'a> {
    /// Patch line (1-indexed) of the header
    line: usize,
    header: &'a str,
    start: u32,
}

impl Hunk<'_> {
    fn malformed(&self) -> PatchError {
        PatchError::MalformedHunkHeader {
            line: self.line,
            header: self.header.to_string(),
        }
    }
}

/// Split on `\r\n`, `\r`, or `\n`
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(idx) => {
                let skip = if current[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[idx + skip..]);
                Some(&current[..idx])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Extract `c` from `@@ -a,b +c,d @@`; the counts are optional
fn parse_new_start(header: &str) -> Option<u32> {
    let range = header.split(' ').nth(2)?.strip_prefix('+')?;
    range.split(',').next()?.parse().ok()
}
