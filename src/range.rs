//! Score and lexicographic range descriptors.
//!
//! Both accept the textual bound syntax used by sorted-set commands:
//! `(1.5` is exclusive, `1.5` inclusive, `-inf`/`+inf` unbounded for
//! scores; `[abc`/`(abc` with `-`/`+` as the infinities for members.

use crate::error::RangeParseError;
use core::cmp::Ordering;

/// Closed, open or half-open interval of scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

impl ScoreRange {
    /// Inclusive on both ends.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: false,
        }
    }

    pub fn all() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn exclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_exclusive: true,
            max_exclusive: true,
        }
    }

    pub fn gte_min(&self, score: f64) -> bool {
        if self.min_exclusive {
            score > self.min
        } else {
            score >= self.min
        }
    }

    pub fn lte_max(&self, score: f64) -> bool {
        if self.max_exclusive {
            score < self.max
        } else {
            score <= self.max
        }
    }

    pub fn contains(&self, score: f64) -> bool {
        self.gte_min(score) && self.lte_max(score)
    }

    /// True when no score can satisfy the range.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
            || (self.min == self.max && (self.min_exclusive || self.max_exclusive))
    }

    /// Parse a `min`/`max` pair such as `("(1", "+inf")`.
    pub fn parse(min: &str, max: &str) -> Result<Self, RangeParseError> {
        let (min, min_exclusive) = parse_score_bound(min)?;
        let (max, max_exclusive) = parse_score_bound(max)?;
        Ok(Self {
            min,
            max,
            min_exclusive,
            max_exclusive,
        })
    }
}

fn parse_score_bound(s: &str) -> Result<(f64, bool), RangeParseError> {
    let (body, exclusive) = match s.strip_prefix('(') {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    match body.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok((v, exclusive)),
        _ => Err(RangeParseError::InvalidScore(s.to_string())),
    }
}

/// One end of a lexicographic range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexBound<M> {
    NegInf,
    PosInf,
    Inclusive(M),
    Exclusive(M),
}

impl<M: Ord> LexBound<M> {
    /// Whether `value` lies at or above this bound used as a minimum.
    pub fn admits_from_below(&self, value: &M) -> bool {
        match self {
            LexBound::NegInf => true,
            LexBound::PosInf => false,
            LexBound::Inclusive(m) => value >= m,
            LexBound::Exclusive(m) => value > m,
        }
    }

    /// Whether `value` lies at or below this bound used as a maximum.
    pub fn admits_from_above(&self, value: &M) -> bool {
        match self {
            LexBound::NegInf => false,
            LexBound::PosInf => true,
            LexBound::Inclusive(m) => value <= m,
            LexBound::Exclusive(m) => value < m,
        }
    }
}

impl<M> LexBound<M> {
    /// Parse `-`, `+`, `[member` or `(member`.
    pub fn parse(s: &str) -> Result<Self, RangeParseError>
    where
        M: for<'a> From<&'a str>,
    {
        match s {
            "-" => Ok(LexBound::NegInf),
            "+" => Ok(LexBound::PosInf),
            _ => {
                if let Some(rest) = s.strip_prefix('[') {
                    Ok(LexBound::Inclusive(M::from(rest)))
                } else if let Some(rest) = s.strip_prefix('(') {
                    Ok(LexBound::Exclusive(M::from(rest)))
                } else {
                    Err(RangeParseError::InvalidLexBound(s.to_string()))
                }
            }
        }
    }
}

/// Interval over members ordered by `Ord`. Only meaningful when every
/// member in the index carries the same score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexRange<M> {
    pub min: LexBound<M>,
    pub max: LexBound<M>,
}

impl<M: Ord> LexRange<M> {
    pub fn new(min: LexBound<M>, max: LexBound<M>) -> Self {
        Self { min, max }
    }

    pub fn all() -> Self {
        Self::new(LexBound::NegInf, LexBound::PosInf)
    }

    pub fn gte_min(&self, value: &M) -> bool {
        self.min.admits_from_below(value)
    }

    pub fn lte_max(&self, value: &M) -> bool {
        self.max.admits_from_above(value)
    }

    pub fn contains(&self, value: &M) -> bool {
        self.gte_min(value) && self.lte_max(value)
    }

    /// True when no member can satisfy the range.
    pub fn is_empty(&self) -> bool {
        use LexBound::*;
        match (&self.min, &self.max) {
            (PosInf, _) | (_, NegInf) => true,
            (NegInf, _) | (_, PosInf) => false,
            (Inclusive(a), Inclusive(b)) => a > b,
            (Inclusive(a) | Exclusive(a), Inclusive(b) | Exclusive(b)) => {
                a.cmp(b) != Ordering::Less
            }
        }
    }
}

impl<M> LexRange<M> {
    pub fn parse(min: &str, max: &str) -> Result<Self, RangeParseError>
    where
        M: for<'a> From<&'a str>,
    {
        Ok(Self {
            min: LexBound::parse(min)?,
            max: LexBound::parse(max)?,
        })
    }
}
