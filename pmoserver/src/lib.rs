//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer des serveurs HTTP
//! avec Axum. Les crates métier s'y greffent par des traits d'extension
//! (`JukeboxExt` dans `pmojukebox`) sans que pmoserver les connaisse.
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : routes JSON, handlers avec état
//! - **Server-Sent Events (SSE)** : logs en temps réel via `/log-sse`
//! - **Documentation OpenAPI** : Swagger UI par API montée
//! - **Arrêt gracieux** : gestion propre de Ctrl+C
//!
//! ## Architecture
//!
//! - [`server`] : serveur principal et builder
//! - [`logs`] : buffer de logs, layer tracing et routes associées
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use pmoserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8880).build();
//!     server.init_logging(LoggingOptions::default()).await;
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await;
//!     server.wait().await;
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, LoggingOptions, SseLayer, log_dump, log_sse};
pub use server::{Server, ServerBuilder, ServerInfo};
