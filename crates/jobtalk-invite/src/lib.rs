// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codec for the job-invite fragment embedded in message bodies.
//!
//! Companies attach job references to otherwise plain-text messages as a
//! single-line in-band fragment:
//!
//! ```text
//! [JOB_INVITE jobId="42" title="Barista" salary="50000"][/JOB_INVITE]
//! ```
//!
//! The fragment may appear anywhere in the body. Parsing is fail-soft: a
//! malformed or partial fragment degrades to a plain-text message, never an
//! error. The encoding must stay bit-exact for compatibility with the
//! counterpart producer on the company side.

use serde::{Deserialize, Serialize};

const OPEN_TAG: &str = "[JOB_INVITE";
const CLOSE_TAG: &str = "[/JOB_INVITE]";

/// A job reference extracted from an invite fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInvite {
    pub job_id: String,
    pub title: String,
    pub salary: String,
}

impl JobInvite {
    /// Serializes this invite into its wire fragment.
    ///
    /// Values must not contain double-quote characters; the format has no
    /// escaping.
    pub fn to_fragment(&self) -> String {
        format!(
            "[JOB_INVITE jobId=\"{}\" title=\"{}\" salary=\"{}\"][/JOB_INVITE]",
            self.job_id, self.title, self.salary
        )
    }
}

/// Result of parsing a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBody {
    /// No well-formed invite fragment. Render the body verbatim.
    Plain,
    /// A complete invite was recovered.
    Invite {
        invite: JobInvite,
        /// The body with the fragment removed and the seam re-joined,
        /// trimmed, for rendering alongside the invite card.
        stripped_body: String,
    },
}

impl ParsedBody {
    pub fn is_invite(&self) -> bool {
        matches!(self, ParsedBody::Invite { .. })
    }
}

/// Parses a message body, extracting an embedded job invite if present.
///
/// Reports an invite only when all three of `jobId`, `title`, `salary` were
/// recovered from the fragment. Anything less, or any malformation, yields
/// [`ParsedBody::Plain`].
pub fn parse(body: &str) -> ParsedBody {
    let Some(start) = body.find(OPEN_TAG) else {
        return ParsedBody::Plain;
    };

    let attrs_start = start + OPEN_TAG.len();
    // The open tag ends at the first `]` outside quoted values.
    let Some(attrs_len) = find_unquoted_bracket(&body[attrs_start..]) else {
        return ParsedBody::Plain;
    };
    let attrs = &body[attrs_start..attrs_start + attrs_len];

    let rest = &body[attrs_start + attrs_len + 1..];
    if !rest.starts_with(CLOSE_TAG) {
        return ParsedBody::Plain;
    }

    let Some(invite) = parse_attributes(attrs) else {
        return ParsedBody::Plain;
    };

    let before = body[..start].trim_end();
    let after = rest[CLOSE_TAG.len()..].trim_start();
    let stripped_body = match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (true, false) => after.to_string(),
        (false, true) => before.to_string(),
        (false, false) => format!("{before} {after}"),
    };

    ParsedBody::Invite {
        invite,
        stripped_body,
    }
}

/// Finds the byte offset of the first `]` not inside a quoted value.
fn find_unquoted_bracket(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ']' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parses `key="value"` pairs, returning an invite only if all three keys
/// were recovered. Unknown keys are skipped; duplicate keys keep the last
/// occurrence.
fn parse_attributes(attrs: &str) -> Option<JobInvite> {
    let mut job_id = None;
    let mut title = None;
    let mut salary = None;

    let mut rest = attrs;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let eq = rest.find('=')?;
        let key = rest[..eq].trim();
        rest = &rest[eq + 1..];

        if !rest.starts_with('"') {
            return None;
        }
        rest = &rest[1..];
        let end = rest.find('"')?;
        let value = &rest[..end];
        rest = &rest[end + 1..];

        match key {
            "jobId" => job_id = Some(value.to_string()),
            "title" => title = Some(value.to_string()),
            "salary" => salary = Some(value.to_string()),
            _ => {}
        }
    }

    Some(JobInvite {
        job_id: job_id?,
        title: title?,
        salary: salary?,
    })
}
