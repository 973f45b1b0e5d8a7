#![doc = include_str!("../README.md")]

mod bytes;
mod error;

pub mod bits;
pub mod cfdp;
pub mod pus;
pub mod seqcount;
pub mod spacepacket;
pub mod timecode;
pub mod uslp;

pub use error::{Error, Result, Validated};
