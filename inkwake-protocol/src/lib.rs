//! Inkwake Server Protocol
//!
//! This crate defines the binary protocol between the e-ink display and its
//! content server, and the byte codec both sides use to speak it. The device
//! POSTs a tiny request and streams the response straight from the socket, so
//! the codec is built around a pull-based reader with a sticky end-of-stream
//! flag rather than per-call errors.
//!
//! # Protocol Overview
//!
//! Request:
//! ```text
//! ┌────────┬──────────────┬──────────────────┐
//! │ MAGIC  │ VERSION LEN  │ VERSION          │
//! │ 12B    │ i32 LE       │ VERSION LEN bytes│
//! └────────┴──────────────┴──────────────────┘
//! ```
//!
//! Response:
//! ```text
//! ┌───────┬───────┬──────────────┬──────────┬────────────┬─────────┬──────────┐
//! │ MAGIC │ COUNT │ SCHEDULE     │ SS ID    │ SS COUNTDN │ IMG LEN │ IMAGE    │
//! │ 12B   │ i32   │ COUNT × i32  │ 32B      │ i32        │ i32     │ IMG LEN B│
//! └───────┴───────┴──────────────┴──────────┴────────────┴─────────┴──────────┘
//! ```
//!
//! All integers are 4-byte little-endian two's-complement.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod codec;
pub mod messages;

pub use codec::{Reader, Writer, INITIAL_WRITER_CAPACITY};
pub use messages::{
    decode_request, request_payload, FrameError, ImageId, ResponseFrame, IMAGE_ID_LEN, MAGIC,
    MAX_SCHEDULE_LEN, NEVER, PROTOCOL_VERSION,
};
