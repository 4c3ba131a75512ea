// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation

pub mod serial;

use tokio::io::{AsyncRead, AsyncWrite};

/// Any byte stream the I/O loop can own: a serial port, or an in-memory
/// pipe in tests.
pub trait Link: AsyncRead + AsyncWrite + Send + 'static {}

impl<T> Link for T where T: AsyncRead + AsyncWrite + Send + 'static {}
