//! Arbitrary-precision exact decimal arithmetic.
//!
//! `Decimal` is a fixed-point value `mantissa / 10^scale` backed by
//! [`num_bigint::BigInt`]. Addition, subtraction, and multiplication never
//! lose precision; division requires an explicit target scale and rounds
//! half-to-even.

mod decimal;
mod error;

pub use decimal::{Decimal, MAX_SCALE};
pub use error::DecimalError;
