// handlers/mod.rs - two handler tiers
//
// Public (no identity, allow-listed paths) -> Protected (gate has resolved
// an AuthenticatedActor and the role's policy matched the path).
//
// The gate only answers "may this role reach this path". Anything finer,
// such as mission ownership or admin-only role management, is checked
// inside the protected handlers.
pub mod protected;
pub mod public;
