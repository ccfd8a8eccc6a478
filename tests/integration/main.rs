//! End-to-end tests: a real listener, real WebSocket clients, JWT auth,
//! the in-process buffer, and an in-memory durable store.

mod helpers;
mod notification_test;
mod sweep_test;
mod ws_test;
