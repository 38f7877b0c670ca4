// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Terminal output helpers shared by the commands

use colored::Colorize;

pub(crate) fn section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

pub(crate) fn ok(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

pub(crate) fn failed(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

pub(crate) fn warn(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// `label: value` line with a dimmed label
pub(crate) fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{}:", label).dimmed(), value);
}
