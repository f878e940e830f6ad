//! Decorator factory capability

use serde_json::Value;
use std::sync::Arc;

use super::meta::DecoratorParameterMap;
use crate::data::Repository;
use crate::Result;

/// Creates a decorated repository from a repository and its parameters
///
/// Factories are registered with the
/// [`DynamicRepositoryDecoratorRegistry`](super::DynamicRepositoryDecoratorRegistry)
/// under their unique [`id`](Self::id).
pub trait DynamicRepositoryDecoratorFactory: Send + Sync {
    fn id(&self) -> &str;

    fn label(&self) -> &str {
        self.id()
    }

    fn description(&self) -> &str {
        ""
    }

    /// JSON schema of the accepted parameters, if any
    fn schema(&self) -> Option<Value> {
        None
    }

    fn create_decorated_repository(
        &self,
        repository: Arc<dyn Repository>,
        parameters: &DecoratorParameterMap,
    ) -> Result<Arc<dyn Repository>>;
}
