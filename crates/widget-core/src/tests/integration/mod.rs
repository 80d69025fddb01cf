#![cfg(test)]

pub mod blog_tests;
pub mod common;
