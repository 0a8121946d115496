//! # docqa
//!
//! Answer questions from a private set of documents, or refuse.
//!
//! Documents in an upload directory are read, chunked, embedded and stored in
//! a local SQLite index. A question retrieves the most similar chunks and a
//! language model answers from those chunks only. When nothing is retrieved,
//! or the model says it cannot answer, the result is a fixed refusal with no
//! sources.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │  uploads/  │──▶│ read → chunk │──▶│  SQLite   │
//! │ txt md pdf │   │   → embed    │   │ records   │
//! │ docx pptx  │   └──────────────┘   └────┬─────┘
//! │ xlsx       │                           │ top-k
//! └────────────┘                           ▼
//!                 ┌──────────┐      ┌─────────────┐
//!  question ─────▶│   gate   │◀─────│  retriever  │
//!                 └────┬─────┘      └─────────────┘
//!                      ▼
//!                 ┌──────────┐
//!                 │ generate │──▶ { answer, sources }
//!                 └──────────┘
//! ```
//!
//! The storage-agnostic parts (chunking, retrieval, the answer gate, prompt
//! construction) live in `docqa-core`. This crate adds the document readers,
//! the SQLite store, the HTTP model backends and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `Store` implementation |
//! | [`extract`] | Document readers |
//! | [`embedding`] | Embedding backends |
//! | [`generate`] | Completion backends |
//! | [`ingest`] | Directory ingestion |
//! | [`pipeline`] | End-to-end question answering |
//! | [`commands`] | CLI command handlers |

pub mod commands;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod migrate;
pub mod pipeline;
pub mod sqlite_store;
