//! # Appraisal Harness
//!
//! Retrieval-augmented rubric scoring of development project appraisal
//! reports.
//!
//! A report (PDF or text) is extracted, chunked, embedded into an
//! in-memory vector store, and scored against a two-section rubric
//! (policy alignment, implementation readiness) by a generative model
//! answering in JSON. The pipeline itself lives in [`appraisal_core`];
//! this crate supplies configuration, extraction, HTTP providers,
//! progress output, report rendering, and the `appraise` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────┐
//! │ Extract  │──▶│ Chunk+Embed  │──▶│ Context+Score │──▶│  Report  │
//! │ PDF/text │   │ VectorStore  │   │  (× 2 sects)  │   │ text/JSON│
//! └──────────┘   └──────────────┘   └───────────────┘   └──────────┘
//!                   │ Gemini/OpenAI/Ollama │
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! appraise extract report.pdf                  # what text will be scored
//! appraise index report.pdf --query "SDGs"     # inspect retrieval
//! appraise audit report.pdf --format json --output result.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF and plain-text extraction |
//! | [`embedding`] | Embedding provider adapters |
//! | [`generation`] | Generative model adapters |
//! | [`progress`] | Audit progress observers |
//! | [`report`] | Text and JSON rendering |

pub mod audit_cmd;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod generation;
pub mod http;
pub mod inspect;
pub mod progress;
pub mod report;
