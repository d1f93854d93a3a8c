//! Domain records mirrored from the relational store.

pub mod entities;
