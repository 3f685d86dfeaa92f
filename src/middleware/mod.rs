/*
 * Responsibility
 * - Middleware public interface
 * - Each submodule exposes `apply(router, ...)`; app.rs decides the order
 */
pub mod auth;
pub mod cors;
pub mod http;
