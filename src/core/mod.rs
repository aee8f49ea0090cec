//! # Core Application Logic
//!
//! This module contains Confab's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌──────────────────────────┐
//!                    │          CORE            │
//!                    │  (this module)           │
//!                    │                          │
//!                    │  • SessionContext        │
//!                    │  • Action / update()     │
//!                    │  • controller (send)     │
//!                    │  • ChatView (UI port)    │
//!                    └────────────┬─────────────┘
//!                                 │
//!            ┌────────────────────┼────────────────────┐
//!            ▼                    ▼                    ▼
//!     ┌────────────┐       ┌────────────┐       ┌────────────┐
//!     │    TUI     │       │  devices   │       │    api     │
//!     │  Adapter   │       │ (capture)  │       │  (reqwest) │
//!     │ (ratatui)  │       │            │       │            │
//!     └────────────┘       └────────────┘       └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `SessionContext`, everything one chat session owns
//! - [`action`]: the `Action` enum and `update()`
//! - [`controller`]: the send flow and every other user-facing operation
//! - [`conversation`], [`storage`], [`attachment`], [`transcript`]: the data
//! - [`render`], [`view`], [`dialog`]: presentation-neutral UI model

pub mod action;
pub mod attachment;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod dialog;
pub mod render;
pub mod state;
pub mod storage;
pub mod transcript;
pub mod view;
