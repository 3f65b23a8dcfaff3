//! JSON scenario input and snapshot output for the command-line front end.

pub mod command_reader;
pub mod snapshot_writer;
