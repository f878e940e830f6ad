use cucumber::{given, then, when};
use molgenis_core::upgrade::VersionStore;
use molgenis_core::Error;

use crate::features::world::MolgenisWorld;

// ==================== GIVEN ====================

#[given("a fresh installation")]
async fn given_fresh_installation(world: &mut MolgenisWorld) {
    // Only allocates the directory; no version file is written
    world.version_file();
}

#[given(expr = "the persisted version is {int}")]
async fn given_persisted_version(world: &mut MolgenisWorld, version: u32) {
    world
        .version_store()
        .write_version(version)
        .await
        .expect("Failed to write version file");
}

#[given(expr = "statements containing {string} fail")]
async fn given_failing_statements(world: &mut MolgenisWorld, fragment: String) {
    world.database.fail_on(fragment).await;
}

#[given("upgrades are disabled")]
async fn given_upgrades_disabled(world: &mut MolgenisWorld) {
    world.config.upgrade.enabled = false;
}

// ==================== WHEN ====================

#[when("the upgrade chain runs")]
async fn when_upgrade_chain_runs(world: &mut MolgenisWorld) {
    let result = world.upgrade_service().upgrade().await;
    match result {
        Ok(report) => world.upgrade_report = Some(report),
        Err(e) => world.last_error = Some(e),
    }
}

// ==================== THEN ====================

#[then(expr = "the version file records version {int}")]
async fn then_version_recorded(world: &mut MolgenisWorld, version: u32) {
    let persisted = world.version_store().read_version().await.expect("Failed to read version file");
    assert_eq!(persisted, Some(version));
}

#[then("no version file exists")]
async fn then_no_version_file(world: &mut MolgenisWorld) {
    assert!(!world.version_file().exists());
}

#[then(expr = "{int} upgrade step(s) was/were applied")]
async fn then_steps_applied(world: &mut MolgenisWorld, count: usize) {
    let report = world.upgrade_report.as_ref().expect("no upgrade report");
    assert_eq!(report.applied.len(), count);
}

#[then("the run was recorded as a fresh install")]
async fn then_fresh_install(world: &mut MolgenisWorld) {
    let report = world.upgrade_report.as_ref().expect("no upgrade report");
    assert!(report.fresh_install);
    assert!(report.applied.is_empty());
}

#[then(expr = "the upgrade to version {int} failed")]
async fn then_upgrade_failed(world: &mut MolgenisWorld, expected: u32) {
    match &world.last_error {
        Some(Error::Upgrade { version, .. }) => assert_eq!(*version, expected),
        other => panic!("expected an upgrade failure, got {:?}", other),
    }
}

#[then(expr = "{int} transaction(s) was/were rolled back")]
async fn then_rolled_back(world: &mut MolgenisWorld, count: usize) {
    assert_eq!(world.database.rollback_count().await, count);
}
