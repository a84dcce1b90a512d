// ABOUTME: Ranks domains by keyword relevance so a free-text question can find its agent.
// ABOUTME: Primary keywords score 2, secondary 1; the top three scoring domains are suggested.

use crate::knowledge::Domain;

const PRIMARY_WEIGHT: u32 = 2;
const SECONDARY_WEIGHT: u32 = 1;
/// Most domains a ranking will suggest
pub const MAX_SUGGESTIONS: usize = 3;

/// Keywords that mark a question as belonging to one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingKeywords {
    primary: Vec<String>,
    secondary: Vec<String>,
}

impl RoutingKeywords {
    /// Keywords are lowercased; blank ones are dropped
    pub fn new(primary: Vec<String>, secondary: Vec<String>) -> Self {
        let normalize = |keywords: Vec<String>| {
            keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            primary: normalize(primary),
            secondary: normalize(secondary),
        }
    }

    pub fn primary(&self) -> &[String] {
        &self.primary
    }

    pub fn secondary(&self) -> &[String] {
        &self.secondary
    }

    /// Relevance of already-lowercased text. Each keyword counts once.
    pub fn score(&self, normalized: &str) -> u32 {
        let hits = |keywords: &[String]| {
            keywords
                .iter()
                .filter(|k| normalized.contains(k.as_str()))
                .count() as u32
        };
        hits(&self.primary) * PRIMARY_WEIGHT + hits(&self.secondary) * SECONDARY_WEIGHT
    }
}

/// Keyword tables for every domain plus the domain to use when nothing matches.
#[derive(Debug, Clone)]
pub struct Router {
    domains: Vec<(Domain, RoutingKeywords)>,
    fallback: Domain,
}

impl Router {
    /// Ties are broken by the order of `domains`
    pub fn new(domains: Vec<(Domain, RoutingKeywords)>, fallback: Domain) -> Self {
        Self { domains, fallback }
    }

    /// Matching domains, best first, at most `MAX_SUGGESTIONS`. When no
    /// keyword matches, the fallback domain alone with a score of 0.
    pub fn rank(&self, text: &str) -> Vec<(Domain, u32)> {
        let normalized = text.to_lowercase();
        let mut ranked: Vec<(Domain, u32)> = self
            .domains
            .iter()
            .map(|(domain, keywords)| (*domain, keywords.score(&normalized)))
            .filter(|(_, score)| *score > 0)
            .collect();

        // stable sort keeps declaration order among equal scores
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(MAX_SUGGESTIONS);

        if ranked.is_empty() {
            tracing::debug!(fallback = %self.fallback, "No routing keyword matched");
            return vec![(self.fallback, 0)];
        }
        tracing::debug!(best = %ranked[0].0, score = ranked[0].1, "Routed question");
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn router() -> Router {
        Router::new(
            vec![
                (
                    Domain::Clutch,
                    RoutingKeywords::new(words(&["clutch", "gear"]), words(&["flywheel"])),
                ),
                (
                    Domain::Frame,
                    RoutingKeywords::new(words(&["frame", "chassis"]), words(&["welding"])),
                ),
                (
                    Domain::Tire,
                    RoutingKeywords::new(words(&["tire", "Grip"]), words(&["pressure"])),
                ),
            ],
            Domain::Clutch,
        )
    }

    #[test]
    fn test_primary_outweighs_secondary() {
        let keywords = RoutingKeywords::new(words(&["tire", "grip"]), words(&["pressure"]));
        assert_eq!(keywords.score("tire grip at low pressure"), 5);
        assert_eq!(keywords.score("pressure"), 1);
        assert_eq!(keywords.score("nothing here"), 0);
    }

    #[test]
    fn test_keywords_are_normalized() {
        let keywords = RoutingKeywords::new(words(&[" Tire ", ""]), vec![]);
        assert_eq!(keywords.primary(), &["tire".to_string()]);
        assert!(keywords.secondary().is_empty());
    }

    #[test]
    fn test_rank_orders_by_score() {
        let ranked = router().rank("Chassis welding near the tire");
        assert_eq!(ranked, vec![(Domain::Frame, 3), (Domain::Tire, 2)]);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        assert_eq!(
            router().rank("tire or frame?"),
            vec![(Domain::Frame, 2), (Domain::Tire, 2)]
        );
        assert_eq!(
            router().rank("grip, chassis, gear"),
            vec![(Domain::Clutch, 2), (Domain::Frame, 2), (Domain::Tire, 2)]
        );
    }

    #[test]
    fn test_no_match_falls_back() {
        assert_eq!(router().rank("hello there"), vec![(Domain::Clutch, 0)]);
        assert_eq!(router().rank(""), vec![(Domain::Clutch, 0)]);
    }

    #[test]
    fn test_rank_is_capped() {
        let router = Router::new(
            Domain::ALL
                .into_iter()
                .map(|d| (d, RoutingKeywords::new(vec![d.to_string()], vec![])))
                .collect(),
            Domain::Clutch,
        );
        let ranked = router.rank("battery clutch frame tire");
        assert_eq!(ranked.len(), MAX_SUGGESTIONS);
        assert_eq!(
            ranked.iter().map(|(d, _)| *d).collect::<Vec<_>>(),
            vec![Domain::Battery, Domain::Clutch, Domain::Frame]
        );
    }
}
