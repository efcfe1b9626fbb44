use std::fmt;
use std::str::FromStr;

use super::error::PatternError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` - exactly one non-empty segment
    Single,
    /// `**` - zero or more segments
    Multi,
}

/// Compiled path pattern.
///
/// Grammar: `/`-separated segments where `*` matches exactly one non-empty
/// segment and `**` matches any suffix of zero or more segments. Matching is
/// anchored and case-sensitive. The bare pattern `**` matches every path,
/// including the empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    universal: bool,
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        if pattern == "**" {
            return Ok(Self {
                source: pattern.to_string(),
                segments: vec![Segment::Multi],
                universal: true,
            });
        }

        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        // Root pattern has no segments at all
        if rest.is_empty() {
            return Ok(Self {
                source: pattern.to_string(),
                segments: Vec::new(),
                universal: false,
            });
        }

        let mut segments = Vec::new();
        for (position, raw) in rest.split('/').enumerate() {
            let segment = match raw {
                "" => {
                    return Err(PatternError::EmptySegment {
                        pattern: pattern.to_string(),
                        position,
                    })
                }
                "*" => Segment::Single,
                "**" => Segment::Multi,
                s if s.contains('*') => {
                    return Err(PatternError::InvalidWildcard {
                        pattern: pattern.to_string(),
                        segment: s.to_string(),
                    })
                }
                s => Segment::Literal(s.to_string()),
            };
            // `**/**` matches the same paths as `**`
            if segment == Segment::Multi && segments.last() == Some(&Segment::Multi) {
                continue;
            }
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            universal: false,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.universal {
            return true;
        }

        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };

        if rest.is_empty() {
            return match_segments(&self.segments, &[]);
        }

        let parts: Vec<&str> = rest.split('/').collect();
        match_segments(&self.segments, &parts)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern contains no wildcard and only matches itself
    pub fn is_literal(&self) -> bool {
        !self.universal
            && self
                .segments
                .iter()
                .all(|s| matches!(s, Segment::Literal(_)))
    }
}

/// Anchored match in O(pattern x path). `reachable[i]` holds when the
/// pattern segments seen so far can consume exactly `path[..i]`.
fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    let mut reachable = vec![false; path.len() + 1];
    reachable[0] = true;

    for segment in pattern {
        match segment {
            Segment::Multi => {
                // Any position at or after a reachable one is reachable
                let mut seen = false;
                for slot in reachable.iter_mut() {
                    seen |= *slot;
                    *slot = seen;
                }
            }
            Segment::Single | Segment::Literal(_) => {
                for i in (1..=path.len()).rev() {
                    reachable[i] = reachable[i - 1] && segment_matches(segment, path[i - 1]);
                }
                reachable[0] = false;
            }
        }

        if !reachable.contains(&true) {
            return false;
        }
    }

    reachable[path.len()]
}

fn segment_matches(segment: &Segment, part: &str) -> bool {
    match segment {
        Segment::Literal(literal) => part == literal.as_str(),
        Segment::Single => !part.is_empty(),
        Segment::Multi => true,
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Normalize a raw request path before matching: leading `/`, no repeated
/// `/`, no trailing `/` except for the root.
pub fn normalize_path(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len() + 1);
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}
