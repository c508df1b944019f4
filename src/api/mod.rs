/*
 * Responsibility
 * - HTTP 層 (dto / extractors / handlers / routes)
 * - routes() だけを外に出す
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
