//! # docqa core
//!
//! Shared, runtime-agnostic logic for docqa: data models, the sentence-unit
//! chunker, the index abstraction ([`store::Store`] + [`embedding::Embedder`]),
//! top-k retrieval, the answer gate, and prompt construction for grounded
//! generation.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP clients. The
//! native adapters (SQLite store, embedding and completion backends, document
//! readers) live in the `docqa` app crate and plug in through the traits
//! defined here.
//!
//! ## Query flow
//!
//! ```text
//! question ─▶ Retriever::search ─▶ gate::decide_answerability
//!                                      │
//!                     Unanswerable ◀───┴───▶ Answerable
//!                          │                     │
//!                   Answer::refusal()   gate::build_context
//!                                               │
//!                                      Generator::generate
//!                                               │
//!                                        gate::finalize
//! ```

pub mod chunk;
pub mod embedding;
pub mod gate;
pub mod generate;
pub mod index;
pub mod models;
pub mod retrieve;
pub mod store;
