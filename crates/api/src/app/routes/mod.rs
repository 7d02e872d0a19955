pub mod dependencies;
pub mod sessions;
pub mod system;
