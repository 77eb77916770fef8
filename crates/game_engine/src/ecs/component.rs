//! Component trait

/// Marker trait for components
///
/// Implemented explicitly per type so arbitrary values cannot be attached to
/// entities by accident.
pub trait Component: 'static + Send + Sync {}
