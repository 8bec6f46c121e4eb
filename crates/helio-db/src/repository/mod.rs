//! # Repository Module
//!
//! Repository implementations for database operations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Services / API layer                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (this module) ← All SQL lives here                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlitePool → SQLite                                                    │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL isolated from business logic                                     │
//! │  • Engines stay pure and unit-testable                                  │
//! │  • Database can be mocked for testing                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod order;
pub mod product;
pub mod project;
pub mod quote;
pub mod settings;
pub mod sizing;
