//! # ibis
//!
//! An issue-based dialogue-move engine: dialogue management as
//! information-state update. Turn by turn, a deterministic rule-dispatch
//! machine selects the system's next communicative moves from its
//! belief/plan/agenda state, and integrates each incoming move by
//! resolving open questions and advancing a domain plan.
//!
//! ## Architecture
//!
//! - **Semantics** (`semantics`): the closed move/action/question/fact vocabulary
//! - **Information state** (`state`): one conversation's private and shared record
//! - **Domain & database** (`domain`, `database`): sort tables, plans, fact lookup
//! - **Rules** (`rules`): named update rules — precondition plus deferred effect —
//!   behind a registry and dispatcher
//! - **Control machine** (`dme`): the two-phase Select/Update machine; cascades
//!   are data, first match wins, one suspension point
//! - **Channel & conversation** (`channel`, `conversation`): typed wire events
//!   and the blocking driver loop
//! - **Domain packs** (`seeds`): TOML-declared domains; the toy room-booking
//!   pack is bundled
//!
//! ## Library usage
//!
//! ```
//! use ibis::dme::DialogueMoveEngine;
//! use ibis::seeds;
//!
//! let state = seeds::room_booking_state().unwrap();
//! let mut engine = DialogueMoveEngine::new(state);
//! let outputs = engine.advance().unwrap(); // the system opens with a greeting
//! assert_eq!(outputs.len(), 1);
//! ```

pub mod channel;
pub mod conversation;
pub mod database;
pub mod dme;
pub mod domain;
pub mod error;
pub mod rules;
pub mod seeds;
pub mod semantics;
pub mod state;
