//! Items used throughout the crate
#![allow(unused_imports)]

pub(crate) use crate::error::Error;
pub(crate) use crate::precision::{ByteOrder, Numeric, Precision};

pub(crate) use derive_more::{Constructor, Display, From};
pub(crate) use std::io::Write;
