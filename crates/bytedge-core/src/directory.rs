// ABOUTME: The set of domain agents - one independent engine per domain, built from config
// ABOUTME: Routes requests by agent name or question keywords and describes the available agents

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::{Backend, HttpBackend, SimulatedBackend};
use crate::config::{BackendKind, Config};
use crate::engine::Engine;
use crate::error::{EdgeError, Result};
use crate::knowledge::{Domain, KnowledgeBase};
use crate::routing::Router;
use crate::rules::RuleEngine;

/// Public description of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub domain: Domain,
    pub name: String,
    pub avatar: String,
    pub label: String,
    pub tagline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub backend: &'static str,
    pub agents: Vec<Domain>,
}

pub struct AgentDirectory {
    engines: BTreeMap<Domain, Arc<Engine>>,
    router: Router,
    default_domain: Domain,
}

impl AgentDirectory {
    /// Build every domain engine. Each gets its own backend and RNG so no
    /// conversation state is shared between domains.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let knowledge_dir = config.knowledge_dir();
        let mut engines = BTreeMap::new();
        let mut routing = Vec::with_capacity(Domain::ALL.len());
        for (offset, domain) in Domain::ALL.into_iter().enumerate() {
            let kb = KnowledgeBase::load(domain, knowledge_dir.as_deref())?;
            routing.push((domain, kb.routing));
            let backend = build_backend(config, domain, kb.rules, offset as u64)?;
            let engine =
                Engine::new(kb.identity, backend).with_max_input_chars(config.engine.max_input_chars);
            engines.insert(domain, Arc::new(engine));
        }

        Ok(Self {
            engines,
            router: Router::new(routing, config.engine.default_domain),
            default_domain: config.engine.default_domain,
        })
    }

    pub fn get(&self, domain: Domain) -> Option<&Arc<Engine>> {
        self.engines.get(&domain)
    }

    /// Resolve an agent by name; no name means the default agent
    pub fn route(&self, agent: Option<&str>) -> Result<&Arc<Engine>> {
        let domain = match agent {
            Some(name) => name.parse()?,
            None => self.default_domain,
        };
        self.get(domain)
            .ok_or_else(|| EdgeError::UnknownDomain(domain.to_string()))
    }

    /// Domains whose keywords appear in `text`, best first. When nothing
    /// matches, the default domain with a score of 0.
    pub fn suggest(&self, text: &str) -> Vec<(Domain, u32)> {
        self.router.rank(text)
    }

    pub fn default_domain(&self) -> Domain {
        self.default_domain
    }

    pub fn agents(&self) -> Vec<AgentSummary> {
        self.engines
            .values()
            .map(|engine| {
                let identity = engine.identity();
                AgentSummary {
                    domain: identity.domain,
                    name: identity.name.clone(),
                    avatar: identity.avatar.clone(),
                    label: identity.label.clone(),
                    tagline: identity.tagline.clone(),
                }
            })
            .collect()
    }

    pub fn health(&self) -> HealthReport {
        let backend = self
            .engines
            .values()
            .next()
            .map(|engine| engine.backend_name())
            .unwrap_or("none");
        HealthReport {
            status: "healthy",
            backend,
            agents: self.engines.keys().copied().collect(),
        }
    }
}

fn build_backend(
    config: &Config,
    domain: Domain,
    rules: RuleEngine,
    seed_offset: u64,
) -> Result<Arc<dyn Backend>> {
    match config.backend.kind {
        BackendKind::Simulated => {
            let seed = config.engine.seed.map(|s| s.wrapping_add(seed_offset));
            Ok(Arc::new(SimulatedBackend::seeded(
                Arc::new(rules),
                config.latency(),
                seed,
            )))
        }
        BackendKind::Http => {
            let backend = HttpBackend::new(&config.backend.base_url, domain, config.timeout())
                .map_err(|e| EdgeError::Config(e.to_string()))?;
            Ok(Arc::new(backend))
        }
    }
}
