mod catalog;
mod error;
mod protocol;
