//! # Parley Common Crate
//!
//! Types shared by the users and chats crates: the error-kind taxonomy that
//! transports map onto their own status codes, opaque identifier generation,
//! and the clock seam used for every timestamp the core produces.

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ErrorKind;

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Generate a new opaque, collision-resistant identifier.
pub fn new_id() -> String {
    CUID.create_id()
}
