//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing the last entity update.
#[derive(Clone, Copy, Debug)]
pub struct Update;
