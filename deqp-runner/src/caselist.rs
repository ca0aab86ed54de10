// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The compact case list format understood by the dEQP test binary.
//!
//! Dotted case paths are grouped by shared prefix into nested braces, so
//!
//! ```text
//! dEQP-GLES3.info.version
//! dEQP-GLES3.info.renderer
//! ```
//!
//! becomes `{dEQP-GLES3{info{version,renderer}}}`. Within each level, leaves are written before
//! groups, and both follow first-seen order.

use crate::errors::CaseListParseError;
use indexmap::{IndexMap, IndexSet};

/// Encodes a set of dotted case paths into a case list trie.
pub fn encode<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    let mut root = TrieNode::default();
    for path in paths {
        root.insert(path);
    }

    let mut out = String::new();
    root.write(&mut out);
    out
}

/// Decodes a case list trie into the dotted case paths it contains.
///
/// Trailing whitespace after the outermost group is accepted, since that's how the list is stored
/// on the device.
pub fn decode(input: &str) -> Result<Vec<String>, CaseListParseError> {
    let mut parser = TrieParser {
        input: input.as_bytes(),
        pos: 0,
        out: Vec::new(),
    };
    parser.expect(b'{')?;
    if parser.peek() == Some(b'}') {
        parser.pos += 1;
    } else {
        parser.parse_items("")?;
    }

    if !input[parser.pos..].trim().is_empty() {
        return Err(CaseListParseError::new(
            parser.pos,
            "unexpected data after case list",
        ));
    }
    Ok(parser.out)
}

#[derive(Debug, Default)]
struct TrieNode<'a> {
    leaves: IndexSet<&'a str>,
    groups: IndexMap<&'a str, TrieNode<'a>>,
}

impl<'a> TrieNode<'a> {
    fn insert(&mut self, path: &'a str) {
        match path.split_once('.') {
            Some((group, rest)) => self.groups.entry(group).or_default().insert(rest),
            None => {
                self.leaves.insert(path);
            }
        }
    }

    fn write(&self, out: &mut String) {
        out.push('{');
        let mut first = true;
        for leaf in &self.leaves {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(leaf);
        }
        for (name, node) in &self.groups {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(name);
            node.write(out);
        }
        out.push('}');
    }
}

struct TrieParser<'a> {
    input: &'a [u8],
    pos: usize,
    out: Vec<String>,
}

impl TrieParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), CaseListParseError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(CaseListParseError::new(
                self.pos,
                format!("expected '{}', found '{}'", byte as char, b as char),
            )),
            None => Err(CaseListParseError::new(
                self.pos,
                format!("expected '{}', found end of input", byte as char),
            )),
        }
    }

    // Parses `item (',' item)* '}'`, the opening brace having been consumed already.
    fn parse_items(&mut self, prefix: &str) -> Result<(), CaseListParseError> {
        loop {
            let name = self.parse_name()?;
            let path = if prefix.is_empty() {
                name.to_owned()
            } else {
                format!("{prefix}.{name}")
            };

            if self.peek() == Some(b'{') {
                self.pos += 1;
                if self.peek() == Some(b'}') {
                    return Err(CaseListParseError::new(
                        self.pos,
                        format!("group `{path}` is empty"),
                    ));
                }
                self.parse_items(&path)?;
            } else {
                self.out.push(path);
            }

            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return self.expect(b'}'),
            }
        }
    }

    fn parse_name(&mut self) -> Result<&str, CaseListParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'{' | b'}' | b',') || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(CaseListParseError::new(start, "expected a case or group name"));
        }
        // The boundaries above are all ASCII, so this slice is on char boundaries.
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| CaseListParseError::new(start, "name is not valid UTF-8"))
    }
}
