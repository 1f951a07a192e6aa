//! # Repository Module
//!
//! Database repository implementations for Coinbox.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.collections().find_by_identity(&identity, None)            │
//! │       ▼                                                                 │
//! │  CollectionRepository                                                  │
//! │  ├── insert(&self, fields, created_by)                                 │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── find_by_identity(&self, identity, exclude_id)                     │
//! │  ├── update(&self, record)                                             │
//! │  ├── delete(&self, id)                                                 │
//! │  └── list(&self, query)                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CollectionRepository`](collection::CollectionRepository) - Collection CRUD and listing
//! - [`UserRepository`](user::UserRepository) - Operator accounts

pub mod collection;
pub mod user;
