//! Command implementations.

pub mod ask;
pub mod exemplars;
pub mod profile;
pub mod schema;
pub mod translate;

pub use self::ask::execute_ask;
pub use self::exemplars::execute_exemplars;
pub use self::profile::execute_profile;
pub use self::schema::execute_schema;
pub use self::translate::execute_translate;

use crate::config::Config;
use crate::error::Result;
use docent_llm::Provider;
use docent_orchestrator::Orchestrator;
use docent_store::Backend;
use std::path::Path;
use tracing::debug;

/// A ready pipeline and the data it answers from.
pub struct Workspace {
    /// Pipeline bound to the active profile's model
    pub orchestrator: Orchestrator<Provider>,
    /// Data source of the active profile
    pub store: Backend,
}

impl Workspace {
    /// Build the pipeline and open the data source of the active profile.
    ///
    /// `fixture` replaces the profile's data source when given.
    pub async fn open(config: &Config, fixture: Option<&Path>) -> Result<Self> {
        let orchestrator = build_orchestrator(config)?;

        let mut store_config = config.get_active_profile()?.store.clone();
        if let Some(path) = fixture {
            store_config.fixture = Some(path.to_path_buf());
        }
        debug!(?store_config, "opening data source");
        let store = store_config.open().await?;

        Ok(Self {
            orchestrator,
            store,
        })
    }
}

/// Build a pipeline for the active profile's model.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator<Provider>> {
    let profile = config.get_active_profile()?;
    let provider = profile.llm.build()?;
    debug!(kind = ?profile.llm.kind, model = %profile.llm.model, "built LLM provider");
    Ok(Orchestrator::new(provider, config.pipeline.clone()))
}
