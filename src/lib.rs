//! passcrypt - streaming password-based file encryption.
//!
//! A password and a random salt go through PBKDF2-HMAC-SHA256 to produce an
//! AES key, which then encrypts or decrypts a byte stream chunk by chunk in
//! one of three modes:
//! - AES-CBC with PKCS#7 padding
//! - AES-GCM with a 128-bit tag
//! - AES-CTR, without integrity protection
//!
//! Encrypted output is `salt[16] || iv[16] || ciphertext`.

pub mod app;
pub mod cipher;
pub mod config;
pub mod engine;
pub mod error;
pub mod file;
pub mod secret;
pub mod session;
pub mod types;
pub mod ui;
