//! bookstore-server: order creation and payment backend
//!
//! # Module structure
//!
//! ```text
//! bookstore-server/
//! ├── api/        # HTTP routes and handlers
//! ├── auth/       # User JWT middleware
//! ├── config      # Environment configuration
//! ├── orders/     # Order workflow (create, pay, queries)
//! ├── storage/    # Storage traits and backend dispatch
//! ├── db/         # PostgreSQL backend (sqlx)
//! ├── embedded/   # Embedded backend (redb)
//! ├── state       # Shared application state
//! └── utils/      # Logging
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod embedded;
pub mod orders;
pub mod state;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use state::AppState;
