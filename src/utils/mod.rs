//! Helpers for code derivation and request header parsing.
//!
//! - [`code_generator`] - Deterministic short code computation and URL validation
//! - [`extract_token`] - Identity token lookup in cookies and `Authorization`
//! - [`extract_real_ip`] - Caller address from `X-Real-IP`

pub mod code_generator;
pub mod extract_real_ip;
pub mod extract_token;
