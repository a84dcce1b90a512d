// ABOUTME: Agent domains and their knowledge tables (identity, ordered rules, fallback pool).
// ABOUTME: Built-in TOML tables are compiled in; a knowledge directory can override them per domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{EdgeError, Result};
use crate::routing::RoutingKeywords;
use crate::rules::{Rule, RuleEngine};

/// The engineering domains an agent can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Battery,
    Clutch,
    Frame,
    Tire,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Battery, Domain::Clutch, Domain::Frame, Domain::Tire];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Clutch => "clutch",
            Self::Frame => "frame",
            Self::Tire => "tire",
        }
    }

    fn builtin_table(&self) -> &'static str {
        match self {
            Self::Battery => include_str!("../knowledge/battery.toml"),
            Self::Clutch => include_str!("../knowledge/clutch.toml"),
            Self::Frame => include_str!("../knowledge/frame.toml"),
            Self::Tire => include_str!("../knowledge/tire.toml"),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| EdgeError::UnknownDomain(s.to_string()))
    }
}

/// Static description of an agent. Read-only for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub domain: Domain,
    /// Display name, e.g. "ClutchEdge AI"
    pub name: String,
    /// Avatar glyph
    pub avatar: String,
    /// Domain label, e.g. "Clutch and Drivetrain Systems"
    pub label: String,
    /// One-line description for agent listings
    pub tagline: String,
    /// Suggested questions offered as input shortcuts
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    agent: AgentSection,
    #[serde(default)]
    routing: RoutingSection,
    #[serde(default)]
    rules: Vec<RuleSection>,
    fallback: FallbackSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentSection {
    name: String,
    avatar: String,
    label: String,
    #[serde(default)]
    tagline: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoutingSection {
    #[serde(default)]
    primary: Vec<String>,
    #[serde(default)]
    secondary: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSection {
    id: String,
    keywords: Vec<Vec<String>>,
    response: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FallbackSection {
    responses: Vec<String>,
}

/// Everything one domain engine needs: who it is, which questions are
/// its own, and how it answers.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub identity: AgentIdentity,
    pub routing: RoutingKeywords,
    pub rules: RuleEngine,
}

impl KnowledgeBase {
    /// The table shipped with the binary
    pub fn builtin(domain: Domain) -> Result<Self> {
        Self::from_toml(domain, domain.builtin_table())
    }

    /// Use `<dir>/<domain>.toml` when a directory is given and the file exists,
    /// otherwise the built-in table.
    pub fn load(domain: Domain, knowledge_dir: Option<&Path>) -> Result<Self> {
        let Some(dir) = knowledge_dir else {
            return Self::builtin(domain);
        };

        let path = dir.join(format!("{domain}.toml"));
        if !path.exists() {
            return Self::builtin(domain);
        }

        let source = std::fs::read_to_string(&path).map_err(|e| EdgeError::KnowledgeBase {
            domain: domain.to_string(),
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        tracing::info!(%domain, path = %path.display(), "Loaded knowledge override");
        Self::from_toml(domain, &source)
    }

    /// Parse and validate a knowledge table
    pub fn from_toml(domain: Domain, source: &str) -> Result<Self> {
        let invalid = |reason: String| EdgeError::KnowledgeBase {
            domain: domain.to_string(),
            reason,
        };

        let table: TableFile = toml::from_str(source).map_err(|e| invalid(e.to_string()))?;
        if table.agent.name.trim().is_empty() {
            return Err(invalid("agent name is empty".to_string()));
        }

        let rules = table
            .rules
            .into_iter()
            .map(|r| Rule::new(r.id, r.keywords, r.response))
            .collect();
        let rules = RuleEngine::new(rules, table.fallback.responses)
            .map_err(|e| invalid(e.to_string()))?;

        let identity = AgentIdentity {
            domain,
            name: table.agent.name,
            avatar: table.agent.avatar,
            label: table.agent.label,
            tagline: table.agent.tagline,
            suggestions: table.agent.suggestions,
        };

        let routing = RoutingKeywords::new(table.routing.primary, table.routing.secondary);

        Ok(Self {
            identity,
            routing,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[agent]
name = "TestEdge AI"
avatar = "T"
label = "Testing"

[[rules]]
id = "only"
keywords = [["alpha"], ["beta", "gamma"]]
response = "matched"

[fallback]
responses = ["fallback"]
"#;

    #[test]
    fn test_domain_parse_and_display() {
        assert_eq!("clutch".parse::<Domain>().unwrap(), Domain::Clutch);
        assert_eq!(" Tire ".parse::<Domain>().unwrap(), Domain::Tire);
        assert_eq!(Domain::Battery.to_string(), "battery");

        let err = "brakes".parse::<Domain>().unwrap_err();
        assert!(matches!(err, EdgeError::UnknownDomain(ref d) if d == "brakes"));
    }

    #[test]
    fn test_every_builtin_table_loads() {
        for domain in Domain::ALL {
            let kb = KnowledgeBase::builtin(domain).unwrap();
            assert_eq!(kb.identity.domain, domain);
            assert_eq!(kb.rules.rules().len(), 5, "{domain}");
            assert_eq!(kb.rules.fallbacks().len(), 3, "{domain}");
            assert!(!kb.identity.suggestions.is_empty());
        }
    }

    #[test]
    fn test_builtin_identities() {
        let names: Vec<String> = Domain::ALL
            .into_iter()
            .map(|d| KnowledgeBase::builtin(d).unwrap().identity.name)
            .collect();
        assert_eq!(
            names,
            vec!["BatteryEdge AI", "ClutchEdge AI", "FrameEdge AI", "TireEdge AI"]
        );
    }

    #[test]
    fn test_builtin_suggestions_hit_a_rule() {
        for domain in Domain::ALL {
            let kb = KnowledgeBase::builtin(domain).unwrap();
            for question in &kb.identity.suggestions {
                assert!(
                    kb.rules.matching_rule(question).is_some(),
                    "{domain}: '{question}' matches no rule"
                );
            }
        }
    }

    #[test]
    fn test_builtin_rule_order() {
        let kb = KnowledgeBase::builtin(Domain::Clutch).unwrap();
        let ids: Vec<&str> = kb.rules.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["dual-clutch", "torque-capacity", "friction-material", "engagement", "wet-vs-dry"]
        );
    }

    #[test]
    fn test_from_toml_minimal() {
        let kb = KnowledgeBase::from_toml(Domain::Frame, MINIMAL).unwrap();
        assert_eq!(kb.identity.name, "TestEdge AI");
        assert_eq!(kb.identity.tagline, "");
        assert!(kb.rules.matching_rule("alpha and gamma").is_some());
        assert!(kb.rules.matching_rule("alpha alone").is_none());
    }

    #[test]
    fn test_builtin_routing_keywords() {
        for domain in Domain::ALL {
            let kb = KnowledgeBase::builtin(domain).unwrap();
            assert!(!kb.routing.primary().is_empty(), "{domain}");
            assert!(kb.routing.score(domain.as_str()) >= 2, "{domain}");
        }
    }

    #[test]
    fn test_routing_section_is_optional() {
        let kb = KnowledgeBase::from_toml(Domain::Frame, MINIMAL).unwrap();
        assert_eq!(kb.routing, RoutingKeywords::default());
    }

    #[test]
    fn test_from_toml_rejects_empty_fallbacks() {
        let source = MINIMAL.replace(r#"responses = ["fallback"]"#, "responses = []");
        let err = KnowledgeBase::from_toml(Domain::Frame, &source).unwrap_err();
        assert!(err.to_string().contains("fallback pool is empty"));
        assert!(err.to_string().contains("frame"));
    }

    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        let source = MINIMAL.replace("id = \"only\"", "id = \"only\"\nnegate = true");
        assert!(KnowledgeBase::from_toml(Domain::Frame, &source).is_err());
    }

    #[test]
    fn test_load_prefers_override_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tire.toml"), MINIMAL).unwrap();

        let tire = KnowledgeBase::load(Domain::Tire, Some(dir.path())).unwrap();
        assert_eq!(tire.identity.name, "TestEdge AI");

        // no override for clutch in the directory
        let clutch = KnowledgeBase::load(Domain::Clutch, Some(dir.path())).unwrap();
        assert_eq!(clutch.identity.name, "ClutchEdge AI");
    }
}
