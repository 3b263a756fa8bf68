pub mod books;
pub mod borrowed;

use lendshelf_kernel::{settings::Settings, ModuleRegistry};

use crate::lending::LendingService;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    lending: &LendingService,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register(books::create_module(
        lending.clone(),
        settings.lending.detail_theme,
    ))?;
    registry.register(borrowed::create_module(lending.clone()))?;
    Ok(())
}
