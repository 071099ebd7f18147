//! Integration tests driving the packdeploy binary
//!
//! Only offline commands are covered here; HTTP flows are tested against
//! mock servers next to the library code.

mod cli;
mod common;
mod unpack;
