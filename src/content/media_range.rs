use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

static RANGE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("range separator regex should be valid"));

static PARAMETER_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*;\s*").expect("parameter separator regex should be valid"));

static MEDIA_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+?|\*)/(\S+?|\*)$").expect("media type regex should be valid")
});

static PARAMETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w[\w.+\-]*?)(?:\s*=\s*(\S+))?$").expect("parameter regex should be valid")
});

const WILDCARD: &str = "*";
const QUALITY_PARAMETER: &str = "q";
const DEFAULT_QUALITY: f32 = 1.0;

const TYPE_MATCH_SCORE: u32 = 100;
const SUBTYPE_MATCH_SCORE: u32 = 50;
const PARAMETER_MATCH_SCORE: u32 = 2;

/// A parsed `type/subtype; name=value; q=0.8` preference.
///
/// Equality compares type, subtype, quality and the parameter set exactly
/// (case-sensitive). The original segment text is not part of equality.
#[derive(Debug, Clone)]
pub struct MediaRange {
    name: String,
    media_type: String,
    subtype: String,
    qvalue: f32,
    parameters: BTreeMap<String, Option<String>>,
}

impl MediaRange {
    /// Parse a single range. Returns `None` when the segment is not `type/subtype`.
    ///
    /// A bare `*` is accepted as `*/*`, as some clients still send it.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        let segment = segment.trim();
        let mut parts = PARAMETER_SEPARATOR.split(segment);
        let head = parts.next()?;

        let (media_type, subtype) = if head == WILDCARD {
            (WILDCARD.to_string(), WILDCARD.to_string())
        } else {
            let caps = MEDIA_TYPE.captures(head)?;
            (caps[1].to_string(), caps[2].to_string())
        };

        let mut qvalue = DEFAULT_QUALITY;
        let mut parameters = BTreeMap::new();
        for part in parts.filter(|p| !p.is_empty()) {
            let Some(caps) = PARAMETER.captures(part) else {
                continue;
            };
            let name = caps[1].to_string();
            let value = caps.get(2).map(|v| v.as_str().trim_matches('"').to_string());
            if name.eq_ignore_ascii_case(QUALITY_PARAMETER) {
                qvalue = value.as_deref().and_then(parse_quality).unwrap_or(DEFAULT_QUALITY);
            } else {
                parameters.insert(name, value);
            }
        }

        Some(Self {
            name: segment.to_string(),
            media_type,
            subtype,
            qvalue,
            parameters,
        })
    }

    /// The original text this range was parsed from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    #[must_use]
    pub fn qvalue(&self) -> f32 {
        self.qvalue
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(|v| v.as_deref())
    }

    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Type and subtype are each equal, or either side is `*`.
    #[must_use]
    pub fn is_applicable(&self, that: &MediaRange) -> bool {
        component_compatible(&self.media_type, &that.media_type)
            && component_compatible(&self.subtype, &that.subtype)
    }

    /// Score this (supported) range against a requested range.
    ///
    /// `None` means not applicable. Exact type equality scores 100, exact
    /// subtype equality 50, and each requested parameter present on this range
    /// with the same value 2. Wildcard agreement scores nothing.
    #[must_use]
    pub fn rank(&self, requested: &MediaRange) -> Option<u32> {
        if !self.is_applicable(requested) {
            return None;
        }

        let mut rank = 0;
        if self.media_type == requested.media_type && self.media_type != WILDCARD {
            rank += TYPE_MATCH_SCORE;
        }
        if self.subtype == requested.subtype && self.subtype != WILDCARD {
            rank += SUBTYPE_MATCH_SCORE;
        }
        for (name, value) in &requested.parameters {
            if self.parameters.get(name) == Some(value) {
                rank += PARAMETER_MATCH_SCORE;
            }
        }
        Some(rank)
    }

    /// Render as a header value: `type/subtype; name=value`. Quality is omitted.
    #[must_use]
    pub fn as_media_type(&self) -> String {
        let mut out = format!("{}/{}", self.media_type, self.subtype);
        for (name, value) in &self.parameters {
            out.push_str("; ");
            out.push_str(name);
            if let Some(value) = value {
                out.push('=');
                out.push_str(value);
            }
        }
        out
    }
}

impl PartialEq for MediaRange {
    fn eq(&self, other: &Self) -> bool {
        self.media_type == other.media_type
            && self.subtype == other.subtype
            && self.qvalue == other.qvalue
            && self.parameters == other.parameters
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_media_type())?;
        if self.qvalue != DEFAULT_QUALITY {
            write!(f, "; q={}", self.qvalue)?;
        }
        Ok(())
    }
}

fn component_compatible(a: &str, b: &str) -> bool {
    a == b || a == WILDCARD || b == WILDCARD
}

/// Only plain decimals in `[0, 1]` are accepted.
fn parse_quality(raw: &str) -> Option<f32> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    raw.parse::<f32>().ok().filter(|q| (0.0..=1.0).contains(q))
}

/// Parse an `Accept` / `Content-Type` style header into ranges, in header order.
///
/// An absent or blank header yields no ranges. Segments that are not
/// `type/subtype` are dropped.
#[must_use]
pub fn parse_media_ranges(header: Option<&str>) -> Vec<MediaRange> {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return Vec::new();
    };
    RANGE_SEPARATOR
        .split(header)
        .filter_map(MediaRange::parse)
        .collect()
}

struct WeightedMatch<'a> {
    supported: &'a MediaRange,
    rank: u32,
    requested_quality: f32,
}

/// Pick the supported range that best satisfies the requested ranges.
///
/// Each supported range takes its best rank over all requested ranges (ties
/// keep the higher requested quality). Candidates compare by rank, then by
/// requested quality, where qualities less than a tenth apart tie. Remaining
/// ties keep server order.
/// Returns the winner rendered with [`MediaRange::as_media_type`].
#[must_use]
pub fn best_match(supported: &[MediaRange], requested: &[MediaRange]) -> Option<String> {
    supported
        .iter()
        .filter_map(|candidate| {
            requested
                .iter()
                .filter_map(|r| candidate.rank(r).map(|rank| (rank, r.qvalue)))
                .fold(None, |best: Option<(u32, f32)>, (rank, q)| match best {
                    Some((best_rank, best_q))
                        if best_rank > rank || (best_rank == rank && best_q >= q) =>
                    {
                        best
                    }
                    _ => Some((rank, q)),
                })
                .map(|(rank, requested_quality)| WeightedMatch {
                    supported: candidate,
                    rank,
                    requested_quality,
                })
        })
        .fold(None, |best: Option<WeightedMatch<'_>>, m| match best {
            Some(current) if !beats(&m, &current) => Some(current),
            _ => Some(m),
        })
        .map(|m| m.supported.as_media_type())
}

/// A later candidate only displaces the current one when it ranks higher, or
/// ranks the same and its quality is at least a tenth higher.
fn beats(candidate: &WeightedMatch<'_>, current: &WeightedMatch<'_>) -> bool {
    match candidate.rank.cmp(&current.rank) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            quality_difference(candidate.requested_quality, current.requested_quality) > 0
        }
    }
}

/// `(a - b) * 10` truncated, so qualities less than a tenth apart tie. The
/// nudge keeps an exact tenth from rounding away in `f32`.
fn quality_difference(a: f32, b: f32) -> i32 {
    ((a - b) * 10.0 + 1e-4) as i32
}
