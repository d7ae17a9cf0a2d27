//! Test modules for the reader crate.


pub mod read;
