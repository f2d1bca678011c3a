#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! # compositor-core: the coordination core of a display server
//!
//! This crate provides the two pieces of a display server that sit between the
//! protocol handling and the rendering: tracking which client owns which window on
//! which screen, and moving file descriptors between clients and the server.
//!
//! ## Structure of the crate
//!
//! - [`shell`] contains the [`WindowManager`](shell::WindowManager), which keeps the
//!   metadata of sessions, surfaces and displays and defers every decision to a
//!   [`WindowManagementPolicy`](shell::WindowManagementPolicy) of your own.
//! - [`transport`] contains the primitives to pass file descriptors along with byte
//!   payloads over a local stream socket.
//!
//! The remaining modules hold the types both are built upon: [`scene`] for the
//! sessions and surfaces owned by the connection layer, [`input`] for decoded
//! input events, [`output`] for the set of active displays and [`utils`] for
//! geometry.
//!
//! ## General principles
//!
//! ### Ownership
//!
//! Sessions and surfaces are owned by whatever handles client connections. The
//! window manager only keeps weak handles to them, and its metadata is dropped
//! when the connection layer says so, through
//! [`WindowManager::remove_session`](shell::WindowManager::remove_session),
//! [`WindowManager::remove_surface`](shell::WindowManager::remove_surface) or
//! [`WindowManager::forget`](shell::WindowManager::forget).
//!
//! ### Threading
//!
//! The window manager is internally synchronized and can be shared between threads.
//! Its policy is always invoked with the internal lock held, and only receives a
//! [`WindowManagerTools`](shell::WindowManagerTools) to act upon the window manager.
//! The transport on the other hand is blocking and has no internal locking, it is
//! meant to be driven by a thread per connection.
//!
//! ### Logging
//!
//! This crate makes extensive use of [`tracing`] for its internal logging.
//!
//! For release builds it is recommended to limit the log level during compile time.
//! This can be done by adding a dependency to [`tracing`] and enabling the corresponding features.
//! For example to enable `trace` messages for debug builds, but limit release builds to `debug` add
//! the following in your binary crate `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tracing = { version = "0.1", features = ["max_level_trace", "release_max_level_debug"] }
//! ```

pub mod input;
pub mod output;
pub mod scene;
pub mod shell;
pub mod transport;
pub mod utils;
