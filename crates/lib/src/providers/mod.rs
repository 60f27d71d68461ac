pub mod ai;
pub mod factory;

pub use ai::AiProvider;
