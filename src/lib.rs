//! Subscription tracking core: billing math, session lifecycle, and a
//! server-reconciled subscription collection.
//!
//! This crate is the client-side engine behind a subscription tracker. It
//! records recurring subscriptions (name, price, billing frequency,
//! category, payment method, start date) against a REST-like persistence
//! API and derives the figures a dashboard needs: renewal dates, costs
//! normalized to comparable monthly/yearly totals, and renewals ranked by
//! urgency. Presentation — layout, navigation, forms, notifications — is
//! an external collaborator that merely invokes these operations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────────┐
//! │  SessionManager  │────►│  CredentialStore   │  token + session
//! │  (auth phases)   │     │  (file / memory)   │  snapshot on disk
//! └────────┬─────────┘     └────────────────────┘
//!          │ installs token
//! ┌────────▼─────────┐     ┌────────────────────┐
//! │     Gateway      │◄────│ SubscriptionStore  │  server-confirmed
//! │  (reqwest/HTTP)  │     │ (local collection) │  local state only
//! └──────────────────┘     └─────────┬──────────┘
//!                                    │ snapshot
//!                          ┌─────────▼──────────┐
//!                          │      billing       │  pure functions,
//!                          │    (calculator)    │  no I/O
//!                          └────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use subtrack::{
//!     billing, FileCredentialStore, HttpGateway, SessionManager, SubscriptionStore,
//! };
//!
//! # async fn example() -> subtrack::Result<()> {
//! let gateway = Arc::new(HttpGateway::new("https://api.example.com")?);
//! let credentials = Arc::new(FileCredentialStore::new("/tmp/subtrack")?);
//!
//! let mut session = SessionManager::new(gateway.clone(), credentials);
//! session.restore_session().await?;
//!
//! let store = SubscriptionStore::new(gateway);
//! if let Some(current) = session.session() {
//!     store.load(current).await?;
//! }
//!
//! let subs = store.subscriptions();
//! println!("monthly total: {}", billing::total_monthly_cost(&subs));
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency model
//!
//! Mutations are not optimistic: the local collection reflects
//! server-confirmed state only. A failed call rejects and leaves local
//! state unchanged; a successful update replaces the local record
//! wholesale with the server's representation. Renewal dates are derived
//! once at create/edit time and intentionally do not auto-advance once
//! passed.
//!
//! # Error Handling
//!
//! All operations return [`Result<T, TrackerError>`](error::Result).
//! Validation failures are caught before any network call; everything else
//! propagates to the caller untouched — the core performs no retries and
//! no silent recovery.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod billing;
pub mod error;
pub mod gateway;
pub mod model;
pub mod session;
pub mod storage;
pub mod store;

pub use error::{Result, TrackerError};
pub use gateway::{AuthSuccess, Gateway, HttpGateway};
pub use model::{
    Frequency, NewSubscription, Session, Status, Subscription, SubscriptionDraft,
    SubscriptionId, SubscriptionPatch, User,
};
pub use session::{AuthPhase, SessionManager};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use store::SubscriptionStore;
