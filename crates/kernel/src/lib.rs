//! Kernel of the lendshelf workspace: the module contract, the registry that
//! drives module lifecycles, and layered settings.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use settings::Settings;
