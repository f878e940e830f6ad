use cucumber::{given, then, when};
use molgenis_core::meta::{Attribute, AttributeType, EntityType};

use crate::features::world::MolgenisWorld;

fn docstring_lines(step: &cucumber::gherkin::Step) -> Vec<String> {
    step.docstring
        .as_deref()
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ==================== GIVEN ====================

#[given(expr = "a concrete entity type {string} with id attribute {string}")]
async fn given_concrete_entity_type(world: &mut MolgenisWorld, id: String, id_attribute: String) {
    world.define(MolgenisWorld::concrete(&id, &id_attribute)).await;
}

#[given(expr = "the default string length is {int}")]
async fn given_default_string_length(world: &mut MolgenisWorld, length: u32) {
    world.set_default_string_length(length);
}

#[given(expr = "an abstract entity type {string} with id attribute {string}")]
async fn given_abstract_entity_type(world: &mut MolgenisWorld, id: String, id_attribute: String) {
    world.define(MolgenisWorld::concrete(&id, &id_attribute).with_abstract(true)).await;
}

#[given(expr = "an abstract entity type {string} extending {string}")]
async fn given_abstract_child(world: &mut MolgenisWorld, id: String, parent: String) {
    let parent = world.entity_type(&parent);
    world
        .define(EntityType::new(id).with_abstract(true).with_extends(parent))
        .await;
}

#[given(expr = "a concrete entity type {string} extending {string}")]
async fn given_concrete_child(world: &mut MolgenisWorld, id: String, parent: String) {
    let parent = world.entity_type(&parent);
    world.define(EntityType::new(id).with_extends(parent)).await;
}

#[given(expr = "{string} has a nillable string attribute {string}")]
async fn given_nillable_attribute(world: &mut MolgenisWorld, entity_type: String, name: String) {
    world
        .define_attribute(&entity_type, Attribute::new(name, AttributeType::String))
        .await;
}

#[given(expr = "{string} has a required string attribute {string}")]
async fn given_required_attribute(world: &mut MolgenisWorld, entity_type: String, name: String) {
    let attribute = Attribute::new(name, AttributeType::String).with_nillable(false);
    world.define_attribute(&entity_type, attribute).await;
}

#[given(expr = "{string} has an mref attribute {string} referencing {string}")]
async fn given_mref_attribute(world: &mut MolgenisWorld, entity_type: String, name: String, ref_entity: String) {
    let ref_entity = world.entity_type(&ref_entity);
    let attribute = Attribute::new(name, AttributeType::Mref).with_ref_entity(ref_entity);
    world.define_attribute(&entity_type, attribute).await;
}

// ==================== WHEN ====================

#[when(expr = "I add a required unique string attribute {string} to {string}")]
async fn when_add_unique_attribute(world: &mut MolgenisWorld, name: String, entity_type: String) {
    let entity_type = world.entity_type(&entity_type);
    let attribute = Attribute::new(name, AttributeType::String)
        .with_nillable(false)
        .with_unique(true);
    world.last_error = world.collection.add_attribute(&entity_type, &attribute).await.err();
}

#[when(expr = "I make attribute {string} of {string} required")]
async fn when_make_required(world: &mut MolgenisWorld, name: String, entity_type: String) {
    let updated = world.attribute(&entity_type, &name).with_nillable(false);
    world.update_attribute(&entity_type, updated).await;
}

#[when(expr = "I change attribute {string} of {string} into an integer")]
async fn when_change_into_integer(world: &mut MolgenisWorld, name: String, entity_type: String) {
    let updated = world.attribute(&entity_type, &name).with_data_type(AttributeType::Int);
    world.update_attribute(&entity_type, updated).await;
}

#[when(expr = "I change attribute {string} of {string} into an xref referencing {string}")]
async fn when_change_into_xref(world: &mut MolgenisWorld, name: String, entity_type: String, ref_entity: String) {
    let ref_entity = world.entity_type(&ref_entity);
    let updated = world
        .attribute(&entity_type, &name)
        .with_data_type(AttributeType::Xref)
        .with_ref_entity(ref_entity);
    world.update_attribute(&entity_type, updated).await;
}

#[when(expr = "I point attribute {string} of {string} at {string}")]
async fn when_change_ref_entity(world: &mut MolgenisWorld, name: String, entity_type: String, ref_entity: String) {
    let ref_entity = world.entity_type(&ref_entity);
    let updated = world.attribute(&entity_type, &name).with_ref_entity(ref_entity);
    world.update_attribute(&entity_type, updated).await;
}

#[when(expr = "I delete attribute {string} of {string}")]
async fn when_delete_attribute(world: &mut MolgenisWorld, name: String, entity_type: String) {
    let attribute = world.attribute(&entity_type, &name);
    let entity_type = world.entity_type(&entity_type);
    world.last_error = world.collection.delete_attribute(&entity_type, &attribute).await.err();
}

#[when(expr = "I create the table of {string}")]
async fn when_create_table(world: &mut MolgenisWorld, entity_type: String) {
    let entity_type = world.entity_type(&entity_type);
    world.last_error = world.collection.create_entity_type(&entity_type).await.err();
}

// ==================== THEN ====================

#[then("the executed statements are:")]
async fn then_executed_statements(world: &mut MolgenisWorld, step: &cucumber::gherkin::Step) {
    assert!(world.last_error.is_none(), "unexpected failure: {:?}", world.last_error);
    assert_eq!(world.database.committed_statements().await, docstring_lines(step));
}

#[then("no statement was executed")]
async fn then_no_statement(world: &mut MolgenisWorld) {
    assert!(world.database.committed_statements().await.is_empty());
}

#[then(expr = "{int} statement(s) was/were executed")]
async fn then_statement_count(world: &mut MolgenisWorld, count: usize) {
    assert_eq!(world.database.committed_statements().await.len(), count);
}

#[then(expr = "{int} transaction(s) was/were committed")]
async fn then_transactions_committed(world: &mut MolgenisWorld, count: usize) {
    assert_eq!(world.database.commit_count().await, count);
}

#[then(expr = "the change is rejected with {string}")]
async fn then_change_rejected(world: &mut MolgenisWorld, message: String) {
    assert!(
        world.last_error.as_ref().is_some_and(|e| e.is_validation()),
        "expected a validation error, got {:?}",
        world.last_error
    );
    assert_eq!(world.last_error_message(), message);
}
