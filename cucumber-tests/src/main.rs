use cucumber::{cli, World};
use cucumber_tests::features::MolgenisWorld;

#[tokio::main]
async fn main() {
    MolgenisWorld::cucumber()
        .with_cli::<()>(cli::Opts::parsed())
        .run_and_exit("features/")
        .await;
}
