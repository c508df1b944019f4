/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: bearer credential 検証 (protected routes only)
 * - cors / http / security_headers: router-wide layers applied in app.rs
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
