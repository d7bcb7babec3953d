//! Authentication primitives
//!
//! - `jwt`: signing and validation of session tokens
//! - `password`: argon2id hashing, verification, and the password policy

pub mod jwt;
pub mod password;
