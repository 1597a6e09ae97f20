mod registry;

pub use registry::{ModelRegistry, ModelSpec, DEFAULT_MODEL};
