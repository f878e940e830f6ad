use cucumber::World as CucumberWorld;
use molgenis_core::config::MolgenisConfig;
use molgenis_core::data::{InMemoryRepository, Repository};
use molgenis_core::decorator::{
    DecoratorParameterMap, DynamicRepositoryDecoratorFactory, RepositoryDecoratorConfigurationStore,
};
use molgenis_core::meta::{Attribute, AttributeType, EntityType, MetadataRegistry};
use molgenis_core::storage::JournalDatabase;
use molgenis_core::upgrade::{builtin_steps, FileVersionStore, UpgradeReport, UpgradeService};
use molgenis_core::{Bootstrapper, Error, PostgreSqlRepositoryCollection};
use std::collections::HashMap;
use std::sync::Arc;

/// Application decorator factory that passes repositories through unchanged
pub struct PassThroughDecoratorFactory {
    id: String,
}

impl PassThroughDecoratorFactory {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self { id: id.to_string() })
    }
}

impl DynamicRepositoryDecoratorFactory for PassThroughDecoratorFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        "Pass-through"
    }

    fn create_decorated_repository(
        &self,
        repository: Arc<dyn Repository>,
        _parameters: &DecoratorParameterMap,
    ) -> molgenis_core::Result<Arc<dyn Repository>> {
        Ok(repository)
    }
}

#[derive(CucumberWorld)]
pub struct MolgenisWorld {
    // Schema migration
    pub database: JournalDatabase,
    pub metadata: Arc<MetadataRegistry>,
    pub collection: PostgreSqlRepositoryCollection,
    pub entity_types: HashMap<String, Arc<EntityType>>,
    pub last_error: Option<Error>,
    // Decoration
    pub config: MolgenisConfig,
    pub decorator_store: Arc<RepositoryDecoratorConfigurationStore>,
    pub application_factories: Vec<Arc<dyn DynamicRepositoryDecoratorFactory>>,
    pub bootstrapper: Option<Bootstrapper>,
    pub repository: Option<Arc<dyn Repository>>,
    // Upgrades
    pub temp_dir: Option<tempfile::TempDir>,
    pub upgrade_report: Option<UpgradeReport>,
}

impl std::fmt::Debug for MolgenisWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MolgenisWorld")
            .field("entity_types", &self.entity_types.keys().collect::<Vec<_>>())
            .field("last_error", &self.last_error)
            .field("config", &self.config)
            .field("bootstrapper", &self.bootstrapper.as_ref().map(|_| "<Bootstrapper>"))
            .field("repository", &self.repository.as_ref().map(|r| r.decorator_ids()))
            .field("temp_dir", &"<TempDir>")
            .field("upgrade_report", &self.upgrade_report)
            .finish()
    }
}

impl Default for MolgenisWorld {
    fn default() -> Self {
        let database = JournalDatabase::new();
        let metadata = Arc::new(MetadataRegistry::new());
        let config = MolgenisConfig::default();
        let collection =
            PostgreSqlRepositoryCollection::from_config(Arc::new(database.clone()), metadata.clone(), &config.database);
        let decorator_store = Arc::new(RepositoryDecoratorConfigurationStore::from_config(&config.decorators));
        Self {
            database,
            metadata,
            collection,
            entity_types: HashMap::new(),
            last_error: None,
            config,
            decorator_store,
            application_factories: Vec::new(),
            bootstrapper: None,
            repository: None,
            temp_dir: None,
            upgrade_report: None,
        }
    }
}

impl MolgenisWorld {
    /// Registers an entity type so that hierarchy lookups can find it
    pub async fn define(&mut self, entity_type: EntityType) -> Arc<EntityType> {
        let entity_type = Arc::new(entity_type);
        self.metadata.register(entity_type.clone()).await;
        self.entity_types.insert(entity_type.id.clone(), entity_type.clone());
        entity_type
    }

    /// Replaces a defined entity type by a copy carrying one more attribute
    pub async fn define_attribute(&mut self, entity_type_id: &str, attribute: Attribute) -> Arc<EntityType> {
        let entity_type = (*self.entity_type(entity_type_id)).clone().with_attribute(attribute);
        self.define(entity_type).await
    }

    /// Applies a new default string length to both the collection and the upgrade steps
    pub fn set_default_string_length(&mut self, length: u32) {
        self.config.database.default_string_length = length;
        self.collection = PostgreSqlRepositoryCollection::from_config(
            Arc::new(self.database.clone()),
            self.metadata.clone(),
            &self.config.database,
        );
    }

    pub fn entity_type(&self, id: &str) -> Arc<EntityType> {
        self.entity_types
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("entity type '{}' was never defined", id))
    }

    pub fn attribute(&self, entity_type_id: &str, name: &str) -> Attribute {
        self.entity_type(entity_type_id)
            .attribute(name)
            .cloned()
            .unwrap_or_else(|| panic!("entity type '{}' has no attribute '{}'", entity_type_id, name))
    }

    /// Concrete entity type with a required string id attribute
    pub fn concrete(id: &str, id_attribute: &str) -> EntityType {
        EntityType::new(id)
            .with_attribute(Attribute::new(id_attribute, AttributeType::String).with_nillable(false))
            .with_id_attribute(id_attribute)
    }

    pub async fn update_attribute(&mut self, entity_type_id: &str, updated: Attribute) {
        let entity_type = self.entity_type(entity_type_id);
        let current = self.attribute(entity_type_id, &updated.name);
        self.last_error = self
            .collection
            .update_attribute(&entity_type, &current, &updated)
            .await
            .err();
    }

    pub fn version_file(&mut self) -> std::path::PathBuf {
        let dir = self
            .temp_dir
            .get_or_insert_with(|| tempfile::tempdir().expect("Failed to create temp dir"));
        dir.path().join("version.toml")
    }

    pub fn version_store(&mut self) -> Arc<FileVersionStore> {
        Arc::new(FileVersionStore::new(self.version_file()))
    }

    /// Upgrade service with the shipped steps against the journaling database
    pub fn upgrade_service(&mut self) -> UpgradeService {
        let mut service = UpgradeService::new(Arc::new(self.database.clone()), self.version_store());
        for step in builtin_steps(self.config.database.default_string_length) {
            service.add_upgrade(step).expect("Shipped upgrade steps form a chain");
        }
        service
    }

    /// The bootstrapper, built on first use from what the scenario configured so far
    pub fn bootstrapper(&mut self) -> &Bootstrapper {
        if self.bootstrapper.is_none() {
            let mut bootstrapper = Bootstrapper::new(self.config.clone(), self.decorator_store.clone());
            if self.temp_dir.is_some() {
                bootstrapper = bootstrapper.with_upgrade_service(self.upgrade_service());
            }
            for factory in &self.application_factories {
                bootstrapper = bootstrapper.with_factory(factory.clone());
            }
            self.bootstrapper = Some(bootstrapper);
        }
        self.bootstrapper.as_ref().expect("bootstrapper was just built")
    }

    pub fn sample_repository(&self) -> Arc<dyn Repository> {
        let sample = EntityType::new("sample")
            .with_attribute(Attribute::new("id", AttributeType::String).with_nillable(false))
            .with_attribute(Attribute::new("name", AttributeType::String))
            .with_id_attribute("id");
        Arc::new(InMemoryRepository::new(Arc::new(sample)))
    }

    pub fn last_error_message(&self) -> String {
        self.last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| panic!("expected the last operation to fail"))
    }
}
