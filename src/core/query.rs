//! Query grammar.
//!
//! A query string is either an rsid (`rs231361`) or a coordinate
//! (`chr8:118184783`). The coordinate form splits on the last colon so
//! chromosome names containing colons still parse; the chromosome itself is
//! validated later, against a build.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::error::LookupError;

static RSID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rs[1-9][0-9]*$").expect("rsid pattern is valid"));

static COORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+):([0-9]+)$").expect("coordinate pattern is valid"));

/// A parsed variant query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Chromosome as given by the caller (not yet normalized) and 1-based position
    Coordinate { chromosome: String, position: u64 },
    /// Numeric part of an rsid
    Identifier(u64),
}

impl Query {
    /// Parse a query string
    ///
    /// # Errors
    ///
    /// Returns `LookupError::MalformedQuery` if `s` matches neither query shape.
    pub fn parse(s: &str) -> Result<Self, LookupError> {
        if RSID_REGEX.is_match(s) {
            return parse_rsid(s).map(Self::Identifier);
        }

        if let Some(caps) = COORD_REGEX.captures(s) {
            let position = caps[2]
                .parse::<u64>()
                .ok()
                .filter(|&p| p >= 1)
                .ok_or_else(|| LookupError::MalformedQuery(s.to_string()))?;
            return Ok(Self::Coordinate {
                chromosome: caps[1].to_string(),
                position,
            });
        }

        Err(LookupError::MalformedQuery(s.to_string()))
    }

    /// Build an identifier query from an rsid string
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidIdentifier` if `rsid` is not `rs` followed
    /// by digits with a nonzero leading digit.
    pub fn rsid(rsid: &str) -> Result<Self, LookupError> {
        parse_rsid(rsid).map(Self::Identifier)
    }

    pub fn coordinate(chromosome: impl Into<String>, position: u64) -> Self {
        Self::Coordinate {
            chromosome: chromosome.into(),
            position,
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinate {
                chromosome,
                position,
            } => write!(f, "{chromosome}:{position}"),
            Self::Identifier(id) => write!(f, "rs{id}"),
        }
    }
}

impl std::str::FromStr for Query {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Strip the `rs` prefix and return the numeric identifier
///
/// # Errors
///
/// Returns `LookupError::InvalidIdentifier` for anything other than
/// `rs[1-9][0-9]*` that fits in a `u64`.
pub fn parse_rsid(rsid: &str) -> Result<u64, LookupError> {
    if !RSID_REGEX.is_match(rsid) {
        return Err(LookupError::InvalidIdentifier(rsid.to_string()));
    }
    rsid[2..]
        .parse()
        .map_err(|_| LookupError::InvalidIdentifier(rsid.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rsid_query() {
        assert_eq!(Query::parse("rs231361").unwrap(), Query::Identifier(231_361));
        assert_eq!(Query::parse("rs1").unwrap(), Query::Identifier(1));
    }

    #[test]
    fn test_parse_coordinate_query() {
        assert_eq!(
            Query::parse("chr8:118184783").unwrap(),
            Query::coordinate("chr8", 118_184_783)
        );
        assert_eq!(
            Query::parse("NC_000008.10:5").unwrap(),
            Query::coordinate("NC_000008.10", 5)
        );
    }

    #[test]
    fn test_zero_valued_rsid_is_malformed() {
        for s in ["rs0", "rs01", "rs", "RS123", "rs12a"] {
            assert!(
                matches!(Query::parse(s), Err(LookupError::MalformedQuery(_))),
                "{s} should be malformed"
            );
        }
    }

    #[test]
    fn test_missing_position_is_malformed() {
        for s in ["chr8", "chr8:", ":123", "chr8:12x", "chr8:0", ""] {
            assert!(
                matches!(Query::parse(s), Err(LookupError::MalformedQuery(_))),
                "{s:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_rsid_constructor_rejects_bad_identifiers() {
        assert_eq!(Query::rsid("rs42").unwrap(), Query::Identifier(42));
        for s in ["rs0", "42", "rsX", "rs99999999999999999999999"] {
            assert!(
                matches!(Query::rsid(s), Err(LookupError::InvalidIdentifier(_))),
                "{s} should be an invalid identifier"
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["rs231361", "chr8:118184783"] {
            assert_eq!(Query::parse(s).unwrap().to_string(), s);
        }
    }
}
