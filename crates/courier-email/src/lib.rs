// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EmailJS-compatible HTTP delivery transport.
//!
//! One [`EmailJsTransport`] serves every configured provider; the provider
//! entry supplies the endpoint, service/template ids, and keys.

pub mod emailjs;

pub use emailjs::EmailJsTransport;
