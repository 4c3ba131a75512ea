// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation

pub mod identity;
pub mod zone;
