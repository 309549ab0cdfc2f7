//! Public share token generation.
//!
//! One generator for every resource kind: 128 bits drawn from the OS-seeded
//! CSPRNG, hex-encoded. Uniqueness is enforced by the token index at bind
//! time; revoked tokens are removed from the index and never resolve again.

use rand::Rng;

const TOKEN_BYTES: usize = 16;

/// Issue a new public share token
pub fn issue() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
