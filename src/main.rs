use anyhow::Context;
use lendshelf_app::App;
use lendshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load lendshelf settings")?;
    lendshelf_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        store = ?settings.store.backend,
        borrow_limit = settings.lending.borrow_limit,
        "lendshelf-app bootstrap starting"
    );

    let app = App::build(settings).await?;

    tracing::info!("lendshelf-app bootstrap complete");
    app.serve().await
}
