// Copyright (c) 2022-2023 The Coldsign Developers

//! Coldsign air-gapped signer core
//!
//! This provides the [Scanner][engine::Scanner] engine driving the signing
//! path of an air-gapped device: QR frames are scanned by the host
//! application and fed in as raw byte buffers, the engine reassembles
//! multipart payloads, classifies them into signing requests, resolves the
//! originating account and dispatches the correct signing algorithm.
//!
//! Interactions are performed through [`Scanner::on_scan`][engine::Scanner::on_scan]
//! and [`Scanner::sign`][engine::Scanner::sign]; wire encodings live in
//! [`coldsign_uos`].
//!
//! ## Operations
//!
//! A typical signing session:
//!
//! 1. The scanning screen gains focus and calls
//!    [`set_ready`][engine::Scanner::set_ready].
//! 2. Each camera event hands its raw bytes to
//!    [`on_scan`][engine::Scanner::on_scan]:
//!     - multipart fragments return
//!       [`NeedFrames`][engine::ScanOutcome::NeedFrames] with progress and
//!       missed-frame feedback for the user,
//!     - a completed payload resolves the sender through the injected
//!       [`AccountStore`][engine::AccountStore] and returns
//!       [`Transaction`][engine::ScanOutcome::Transaction] or
//!       [`Message`][engine::ScanOutcome::Message] details for review.
//! 3. After user review the screen calls [`sign`][engine::Scanner::sign],
//!    supplying a derivation password or legacy PIN when the engine asks for
//!    one ([`PasswordRequired`][engine::Error::PasswordRequired] /
//!    [`PinRequired`][engine::Error::PinRequired]).
//! 4. The produced [`SignatureResult`][engine::SignatureResult] carries the
//!    scheme-tagged hex string to render as the response QR, after which the
//!    screen calls [`cleanup`][engine::Scanner::cleanup].
//!
//! All cryptography is performed by the injected
//! [`Driver`][engine::Driver]; this crate never touches key material beyond
//! passing opaque references through.

pub use coldsign_uos as uos;

pub mod account;

pub mod engine;

pub mod networks;
