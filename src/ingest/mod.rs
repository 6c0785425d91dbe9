/// Page retrieval for the snapshot build.
///
/// Submodules:
/// - `usace` — blocking HTTP client for the district pages.

pub mod usace;
