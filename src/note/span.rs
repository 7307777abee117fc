use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open `[begin, end)` byte range into a note's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LexicalSpan {
    pub begin: usize,
    pub end: usize,
}

impl LexicalSpan {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end: end.max(begin) }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Smallest span covering every span given, or `None` when there are none.
    pub fn widen<I: IntoIterator<Item = LexicalSpan>>(spans: I) -> Option<LexicalSpan> {
        spans.into_iter().fold(None, |acc, s| match acc {
            None => Some(s),
            Some(w) => Some(LexicalSpan::new(w.begin.min(s.begin), w.end.max(s.end))),
        })
    }

    /// Regions of `[0, end)` not covered by any of `spans`, in order.
    pub fn gaps<I: IntoIterator<Item = LexicalSpan>>(spans: I, end: usize) -> Vec<LexicalSpan> {
        let mut spans: Vec<LexicalSpan> = spans.into_iter().collect();
        spans.sort();
        let mut gaps = Vec::new();
        let mut cur = 0;
        for s in spans {
            if s.begin > cur {
                gaps.push(LexicalSpan::new(cur, s.begin));
            }
            cur = cur.max(s.end);
        }
        if cur < end {
            gaps.push(LexicalSpan::new(cur, end));
        }
        gaps
    }

    pub fn overlaps_with(&self, other: &LexicalSpan) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    pub fn contains(&self, other: &LexicalSpan) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Text covered by the span; empty when it falls outside `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.begin..self.end).unwrap_or("")
    }

    pub fn shift(&self, offset: usize) -> Self {
        Self::new(self.begin + offset, self.end + offset)
    }
}

impl fmt::Display for LexicalSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.begin, self.end)
    }
}
