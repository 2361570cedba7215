#![cfg(unix)]

mod common;
mod diff_tests;
mod each_tests;
mod list_tests;
mod make_tests;
mod publish_tests;
