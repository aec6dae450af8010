//! `Accept` header negotiation.
//!
//! [`negotiate`] picks one of the server's offered media types for a request:
//!
//! 1. Entries with `q=0` (or an unparseable `q`) are ignored.
//! 2. A match is exact, a `type/*` prefix match, or `*/*`, in that order of
//!    specificity.
//! 3. A candidate replaces the current best only with a strictly higher
//!    weight, or an equal weight and a strictly more specific match. Earlier
//!    offers therefore win exact ties.
//! 4. With no match at all the default is returned.
//!
//! Comparison is ASCII case-insensitive. The chosen offer is returned as the
//! caller spelled it.

use std::cmp::Ordering;

/// How precisely an `Accept` entry matched an offer. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    Exact = 0,
    TypeWildcard = 1,
    FullWildcard = 2,
}

/// One parsed `Accept` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeSpec {
    pub value: String,
    pub quality: f32,
    pub specificity: Specificity,
}

impl ContentTypeSpec {
    /// Specificity of this entry against `offer`, or None if it does not match.
    pub fn matches(&self, offer: &str) -> Option<Specificity> {
        match self.specificity {
            Specificity::FullWildcard => Some(Specificity::FullWildcard),
            Specificity::TypeWildcard => {
                // value is "type/*"; compare the "type/" prefix
                let prefix = &self.value[..self.value.len() - 1];
                let matched = offer.len() > prefix.len()
                    && offer.is_char_boundary(prefix.len())
                    && offer[..prefix.len()].eq_ignore_ascii_case(prefix);
                matched.then_some(Specificity::TypeWildcard)
            }
            Specificity::Exact => self
                .value
                .eq_ignore_ascii_case(offer)
                .then_some(Specificity::Exact),
        }
    }
}

fn parse_quality(params: &str) -> Option<f32> {
    for param in params.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("q") {
            let q: f32 = value.trim().parse().ok()?;
            return (0.0..=1.0).contains(&q).then_some(q);
        }
    }
    Some(1.0)
}

/// Parses an `Accept` header into entries, dropping `q=0` and malformed ones.
pub fn parse_accept(header: &str) -> Vec<ContentTypeSpec> {
    header
        .split(',')
        .filter_map(|entry| {
            let (value, params) = entry.split_once(';').unwrap_or((entry, ""));
            let value = value.trim().to_ascii_lowercase();
            if value.is_empty() {
                return None;
            }

            let quality = parse_quality(params)?;
            if quality <= 0.0 {
                return None;
            }

            let specificity = if value == "*/*" || value == "*" {
                Specificity::FullWildcard
            } else if value.ends_with("/*") {
                Specificity::TypeWildcard
            } else {
                Specificity::Exact
            };

            Some(ContentTypeSpec {
                value,
                quality,
                specificity,
            })
        })
        .collect()
}

/// Chooses the best offer for `accept`. See the module docs for the rules.
pub fn negotiate<S: AsRef<str>>(accept: Option<&str>, offers: &[S], default: &str) -> String {
    let specs = match accept {
        Some(header) => parse_accept(header),
        None => return default.to_string(),
    };

    let mut best: Option<(&str, f32, Specificity)> = None;

    for offer in offers {
        let offer = offer.as_ref();
        for spec in &specs {
            let Some(specificity) = spec.matches(offer) else {
                continue;
            };

            let better = match best {
                None => true,
                Some((_, best_q, best_spec)) => {
                    match spec.quality.partial_cmp(&best_q) {
                        Some(Ordering::Greater) => true,
                        Some(Ordering::Equal) => specificity < best_spec,
                        _ => false,
                    }
                }
            };

            if better {
                best = Some((offer, spec.quality, specificity));
            }
        }
    }

    best.map(|(offer, _, _)| offer.to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Broad response families used to pick an error rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFamily {
    Html,
    Json,
    Other,
}

impl MediaFamily {
    pub fn of(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/html" | "application/xhtml+xml" => Self::Html,
            "application/json" => Self::Json,
            other if other.ends_with("+json") => Self::Json,
            _ => Self::Other,
        }
    }
}
