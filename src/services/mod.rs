/*
 * Responsibility
 * - Clients of the external collaborators (identity provider, document store)
 * - Each one: a trait the handlers depend on + concrete backends + a factory
 */
pub mod identity;
pub mod store;
