//! Host-facing FFI surface (flutter_rust_bridge).

pub mod api;
