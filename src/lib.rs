//! GreaseCoin: a fixed-supply fungible token ledger.
//!
//! The crate is split into three small modules:
//!
//! * [`address`] — opaque fixed-width account identities, supplied by the
//!   host environment and never generated or validated here.
//! * [`ledger`] — the core state machine: balances, delegated allowances,
//!   the four mutating/query operations, and the event log.
//! * [`host`] — a filesystem-backed execution environment adapter that
//!   binds a caller identity per invocation and commits calls atomically.
//!
//! The ledger itself performs no I/O and assumes a strictly sequential
//! host; anything concurrent or durable is the host's problem.

pub mod address;
pub mod host;
pub mod ledger;

pub use address::{Address, AddressParseError};
pub use ledger::{Amount, LedgerError, LedgerSnapshot, TokenCall, TokenEvent, TokenLedger};
