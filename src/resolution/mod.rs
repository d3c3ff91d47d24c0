/// Canonical identifier resolution.
///
/// A requested identifier may reach a leaf whose canonical record lives
/// under a different identifier. Single lookups turn that into a redirect;
/// batch lookups re-resolve one hop.
mod resolver;

pub use resolver::{canonical_uuid, settles_on, CanonicalResolver, Resolution};
