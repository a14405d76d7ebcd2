pub mod notifier;
pub mod reconciler;
pub mod side_effects;
