use cucumber::{given, then, when};
use molgenis_core::data::Repository;
use molgenis_core::decorator::{DecoratorConfiguration, DecoratorConfigurationStore, DecoratorParameters};
use molgenis_core::DynamicRepositoryDecoratorFactory;
use serde_json::{json, Value};

use crate::features::world::{MolgenisWorld, PassThroughDecoratorFactory};

fn decorator_list(decorators: &str) -> Vec<String> {
    decorators
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

// ==================== GIVEN ====================

#[given(expr = "{string} is configured with decorators {string}")]
async fn given_configured_decorators(world: &mut MolgenisWorld, entity_type: String, decorators: String) {
    let configuration = decorator_list(&decorators)
        .into_iter()
        .fold(DecoratorConfiguration::new(entity_type), |configuration, id| {
            configuration.with_decorator(DecoratorParameters::new(id))
        });
    world.decorator_store.save(&configuration).await.expect("Failed to save configuration");
}

#[given(expr = "{string} is configured with decorator {string} taking {string}")]
async fn given_configured_decorator_with_parameters(
    world: &mut MolgenisWorld,
    entity_type: String,
    decorator: String,
    parameters: String,
) {
    let configuration = DecoratorConfiguration::new(entity_type)
        .with_decorator(DecoratorParameters::new(decorator).with_parameters(parameters));
    world.decorator_store.save(&configuration).await.expect("Failed to save configuration");
}

#[given(expr = "{string} is also decorated with {string}")]
async fn given_appended_decorator(world: &mut MolgenisWorld, entity_type: String, decorator: String) {
    let configuration = world
        .decorator_store
        .find_by_entity_type(&entity_type)
        .await
        .expect("Failed to read configuration")
        .unwrap_or_else(|| DecoratorConfiguration::new(entity_type.clone()))
        .with_decorator(DecoratorParameters::new(decorator));
    world.decorator_store.save(&configuration).await.expect("Failed to save configuration");
}

#[given(expr = "{string} is excluded from decoration")]
async fn given_excluded(world: &mut MolgenisWorld, entity_type: String) {
    world.config.decorators.excluded_entity_types.push(entity_type);
}

#[given(expr = "an application decorator factory {string}")]
async fn given_application_factory(world: &mut MolgenisWorld, id: String) {
    world.application_factories.push(PassThroughDecoratorFactory::new(&id));
}

#[given("the platform has bootstrapped")]
async fn given_bootstrapped(world: &mut MolgenisWorld) {
    world.bootstrapper().bootstrap().await.expect("Bootstrapping failed");
}

// ==================== WHEN ====================

#[when("the platform bootstraps")]
async fn when_bootstraps(world: &mut MolgenisWorld) {
    let result = world.bootstrapper().bootstrap().await;
    match result {
        Ok(report) => world.upgrade_report = report.upgrade,
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "a {string} repository is requested")]
async fn when_repository_requested(world: &mut MolgenisWorld, entity_type: String) {
    assert_eq!(entity_type, "sample", "only the sample repository is available");
    let repository = world.sample_repository();
    let result = world.bootstrapper().registry().decorate(repository).await;
    match result {
        Ok(decorated) => world.repository = Some(decorated),
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "I add a sample with id {string}")]
async fn when_add_sample_without_name(world: &mut MolgenisWorld, id: String) {
    add_sample(world, json!({ "id": id })).await;
}

#[when(expr = "I add a sample with id {string} and name {string}")]
async fn when_add_sample(world: &mut MolgenisWorld, id: String, name: String) {
    add_sample(world, json!({ "id": id, "name": name })).await;
}

async fn add_sample(world: &mut MolgenisWorld, value: Value) {
    let repository = world.repository.clone().expect("no repository was requested");
    let entity = value.as_object().cloned().unwrap_or_default();
    world.last_error = repository.add(entity).await.err();
}

// ==================== THEN ====================

#[then("the repository is not decorated")]
async fn then_not_decorated(world: &mut MolgenisWorld) {
    let repository = world.repository.as_ref().expect("no repository was requested");
    assert!(repository.decorator_ids().is_empty());
}

#[then(expr = "the repository is decorated with {string}")]
async fn then_decorated_with(world: &mut MolgenisWorld, decorators: String) {
    let repository = world.repository.as_ref().expect("no repository was requested");
    assert_eq!(repository.decorator_ids(), decorator_list(&decorators));
}

#[then("the sample is rejected")]
async fn then_sample_rejected(world: &mut MolgenisWorld) {
    assert!(world.last_error.as_ref().is_some_and(|e| e.is_validation()));
}

#[then(expr = "the audit trail holds {int} record(s)")]
async fn then_audit_trail(world: &mut MolgenisWorld, count: usize) {
    assert_eq!(world.bootstrapper().audit_trail().len().await, count);
}

#[then(expr = "bootstrapping fails with {string}")]
async fn then_bootstrapping_fails(world: &mut MolgenisWorld, message: String) {
    assert_eq!(world.last_error_message(), message);
}

#[then(expr = "factory {string} is labelled {string}")]
async fn then_factory_label(world: &mut MolgenisWorld, id: String, label: String) {
    let factory = world
        .bootstrapper()
        .registry()
        .get_factory(&id)
        .expect("factory is not registered");
    assert_eq!(factory.label(), label);
}

#[then("decoration is not enabled")]
async fn then_decoration_disabled(world: &mut MolgenisWorld) {
    assert!(!world.bootstrapper().state().is_bootstrapped());
}
