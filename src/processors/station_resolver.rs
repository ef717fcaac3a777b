use crate::models::{MatchTier, ResolvedStation, StationLocation};
use crate::settings::ResolverSettings;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum MatchIssueKind {
    Unmatched,
    /// Several candidates in the winning tier; the first in location order wins.
    Ambiguous {
        tier: MatchTier,
        candidates: Vec<String>,
    },
}

/// A station name that did not resolve to exactly one location.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchIssue {
    pub station_name: String,
    pub kind: MatchIssueKind,
}

impl fmt::Display for MatchIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MatchIssueKind::Unmatched => write!(f, "'{}' matched no station location", self.station_name),
            MatchIssueKind::Ambiguous { tier, candidates } => write!(
                f,
                "'{}' matched {} locations ({} tier): {}; using '{}'",
                self.station_name,
                candidates.len(),
                tier,
                candidates.join(", "),
                candidates.first().map(String::as_str).unwrap_or("")
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub stations: Vec<ResolvedStation>,
    pub issues: Vec<MatchIssue>,
}

impl Resolution {
    pub fn get(&self, station_name: &str) -> Option<&ResolvedStation> {
        self.stations.iter().find(|s| s.station_name == station_name)
    }

    pub fn unresolved_count(&self) -> usize {
        self.stations.iter().filter(|s| !s.is_resolved()).count()
    }
}

/// Resolves observation station names to coordinates from the scraped
/// location list.
pub struct StationResolver {
    locations: Vec<StationLocation>,
    corrections: HashMap<String, String>,
}

impl StationResolver {
    /// Dedupes by coordinate pair and keeps only the configured station type.
    pub fn new(locations: &[StationLocation], settings: &ResolverSettings) -> Self {
        let deduped = dedupe_locations(locations);
        let candidates = filter_station_type(&deduped, &settings.station_type);

        debug!(
            scraped = locations.len(),
            deduped = deduped.len(),
            candidates = candidates.len(),
            station_type = %settings.station_type,
            "prepared station locations"
        );

        let corrections = settings
            .corrections
            .iter()
            .map(|c| (c.from.trim().to_string(), c.to.trim().to_string()))
            .collect();

        Self {
            locations: candidates,
            corrections,
        }
    }

    pub fn locations(&self) -> &[StationLocation] {
        &self.locations
    }

    /// Name used for matching after the correction table.
    pub fn corrected_name<'a>(&'a self, station_name: &'a str) -> &'a str {
        let trimmed = station_name.trim();
        self.corrections
            .get(trimmed)
            .map(String::as_str)
            .unwrap_or(trimmed)
    }

    pub fn resolve_name(&self, station_name: &str) -> (ResolvedStation, Option<MatchIssue>) {
        let query = self.corrected_name(station_name);
        let query_normalized = normalize_name(query);
        let query_tokens: Vec<&str> = query_normalized.split(' ').filter(|t| !t.is_empty()).collect();

        let tiers: [(MatchTier, Box<dyn Fn(&StationLocation) -> bool + '_>); 3] = [
            (
                MatchTier::Exact,
                Box::new(|l: &StationLocation| l.station_name.trim() == query),
            ),
            (
                MatchTier::Normalized,
                Box::new(|l: &StationLocation| {
                    !query_normalized.is_empty() && normalize_name(&l.station_name) == query_normalized
                }),
            ),
            (
                MatchTier::Substring,
                Box::new(|l: &StationLocation| {
                    let normalized = normalize_name(&l.station_name);
                    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
                    tokens_contain(&tokens, &query_tokens) || tokens_contain(&query_tokens, &tokens)
                }),
            ),
        ];

        for (tier, matches) in tiers.iter() {
            let candidates: Vec<&StationLocation> =
                self.locations.iter().filter(|&l| matches(l)).collect();

            let Some(chosen) = candidates.first() else {
                continue;
            };

            let resolved = ResolvedStation::matched(station_name.to_string(), chosen, *tier);
            let issue = (candidates.len() > 1).then(|| MatchIssue {
                station_name: station_name.to_string(),
                kind: MatchIssueKind::Ambiguous {
                    tier: *tier,
                    candidates: candidates.iter().map(|l| l.station_name.clone()).collect(),
                },
            });
            return (resolved, issue);
        }

        (
            ResolvedStation::unmatched(station_name.to_string()),
            Some(MatchIssue {
                station_name: station_name.to_string(),
                kind: MatchIssueKind::Unmatched,
            }),
        )
    }

    /// Resolve each distinct name once, in first-seen order.
    pub fn resolve_all(&self, station_names: &[String]) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();

        for name in station_names {
            if !seen.insert(name.as_str()) {
                continue;
            }

            let (resolved, issue) = self.resolve_name(name);
            if let Some(issue) = issue {
                warn!(%issue, "station match issue");
                resolution.issues.push(issue);
            }
            resolution.stations.push(resolved);
        }

        debug!(
            stations = resolution.stations.len(),
            unresolved = resolution.unresolved_count(),
            "resolved station names"
        );
        resolution
    }
}

/// Keep the first location for every distinct coordinate pair.
pub fn dedupe_locations(locations: &[StationLocation]) -> Vec<StationLocation> {
    let mut seen = HashSet::new();
    locations
        .iter()
        .filter(|l| seen.insert(l.coordinate_key()))
        .cloned()
        .collect()
}

pub fn filter_station_type(locations: &[StationLocation], station_type: &str) -> Vec<StationLocation> {
    locations
        .iter()
        .filter(|l| l.is_station_type(station_type))
        .cloned()
        .collect()
}

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            folded.extend(c.to_lowercase());
        } else {
            folded.push(' ');
        }
    }

    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `needle` occurs as a contiguous token run inside `haystack`.
fn tokens_contain(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::NameCorrection;
    use pretty_assertions::assert_eq;

    fn location(name: &str, kind: &str, lat: f64, lon: f64) -> StationLocation {
        StationLocation::new(name.to_string(), "England".to_string(), kind.to_string(), lat, lon)
    }

    fn locations() -> Vec<StationLocation> {
        vec![
            location("Filton", "Automatic", 51.521, -2.576),
            location("Lerwick", "Automatic", 60.139, -1.183),
            location("Lerwick Observatory", "Automatic", 60.139, -1.183),
            location("ST. ATHAN", "Automatic", 51.405, -3.440),
            location("Heathrow", "Manual", 51.479, -0.449),
            location("Brize Norton", "Automatic", 51.758, -1.576),
            location("Brize Norton Airfield", "Automatic", 51.760, -1.580),
        ]
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let once = dedupe_locations(&locations());
        let twice = dedupe_locations(&once);

        assert_eq!(once.len(), 6);
        assert_eq!(once, twice);
        assert_eq!(once[1].station_name, "Lerwick");
    }

    #[test]
    fn test_station_type_filter() {
        let resolver = StationResolver::new(&locations(), &ResolverSettings::default());
        assert!(resolver.locations().iter().all(|l| l.station_type == "Automatic"));
        assert_eq!(resolver.locations().len(), 5);
    }

    #[test]
    fn test_match_tiers() {
        let resolver = StationResolver::new(&locations(), &ResolverSettings::default());

        let (resolved, issue) = resolver.resolve_name("Lerwick");
        assert_eq!(resolved.tier, Some(MatchTier::Exact));
        assert!(issue.is_none());

        let (resolved, issue) = resolver.resolve_name("St Athan");
        assert_eq!(resolved.tier, Some(MatchTier::Normalized));
        assert_eq!(resolved.location_name.as_deref(), Some("ST. ATHAN"));
        assert!(issue.is_none());

        let (resolved, _) = resolver.resolve_name("Filton and Almondsbury");
        assert_eq!(resolved.tier, Some(MatchTier::Substring));
        assert_eq!(resolved.coordinates(), Some((51.521, -2.576)));
    }

    #[test]
    fn test_correction_table() {
        let settings = ResolverSettings {
            corrections: vec![NameCorrection {
                from: "Filton and Almondsbury".to_string(),
                to: "Filton".to_string(),
            }],
            ..ResolverSettings::default()
        };
        let resolver = StationResolver::new(&locations(), &settings);

        assert_eq!(resolver.corrected_name("Filton and Almondsbury"), "Filton");
        let (resolved, issue) = resolver.resolve_name("Filton and Almondsbury");
        assert_eq!(resolved.station_name, "Filton and Almondsbury");
        assert_eq!(resolved.tier, Some(MatchTier::Exact));
        assert_eq!(resolved.coordinates(), Some((51.521, -2.576)));
        assert!(issue.is_none());
    }

    #[test]
    fn test_ambiguous_match_takes_first() {
        let resolver = StationResolver::new(&locations(), &ResolverSettings::default());
        let (resolved, issue) = resolver.resolve_name("Norton");

        assert_eq!(resolved.location_name.as_deref(), Some("Brize Norton"));
        match issue.unwrap().kind {
            MatchIssueKind::Ambiguous { tier, candidates } => {
                assert_eq!(tier, MatchTier::Substring);
                assert_eq!(candidates, vec!["Brize Norton", "Brize Norton Airfield"]);
            }
            other => panic!("unexpected issue {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_keeps_row_with_null_coordinates() {
        let resolver = StationResolver::new(&locations(), &ResolverSettings::default());
        let names = vec!["Heathrow".to_string(), "Lerwick".to_string(), "Heathrow".to_string()];
        let resolution = resolver.resolve_all(&names);

        assert_eq!(resolution.stations.len(), 2);
        let heathrow = resolution.get("Heathrow").unwrap();
        assert!(!heathrow.is_resolved());
        assert_eq!(resolution.issues.len(), 1);
        assert_eq!(resolution.issues[0].kind, MatchIssueKind::Unmatched);
    }

    #[test]
    fn test_resolution_is_deterministic_and_in_range() {
        let resolver = StationResolver::new(&locations(), &ResolverSettings::default());
        let names: Vec<String> = ["Lerwick", "St Athan", "Norton", "Filton and Almondsbury"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let first = resolver.resolve_all(&names);
        let second = resolver.resolve_all(&names);
        assert_eq!(first.stations, second.stations);

        for station in first.stations.iter().filter(|s| s.is_resolved()) {
            let (lat, lon) = station.coordinates().unwrap();
            assert!((-90.0..=90.0).contains(&lat));
            assert!((-180.0..=180.0).contains(&lon));
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  ST. Athan  "), "st athan");
        assert_eq!(normalize_name("Lerwick (S)"), "lerwick s");
        assert_eq!(normalize_name("---"), "");
    }

    #[test]
    fn test_normalize_name_folds_non_ascii_case() {
        assert_eq!(normalize_name("ÉCOSSE Île"), "écosse île");
        assert_eq!(normalize_name("YNYS MÔN"), normalize_name("Ynys Môn"));
    }
}
