use cucumber::World;
use cucumber_tests::features::MolgenisWorld;

#[tokio::main]
async fn main() {
    // Schema migration, decoration and upgrade scenarios all run in memory
    MolgenisWorld::cucumber().run_and_exit("features/").await;
}
