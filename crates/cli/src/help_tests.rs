// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for sectioned help output and colorization.

#![allow(clippy::unwrap_used)]

use super::*;
use crate::color::codes::{CONTEXT_START, HEADER_START, LITERAL_START, RESET};
use crate::Commands;

// ============================================================================
// Exhaustiveness Tests
// ============================================================================

/// Every subcommand registered in clap must appear in the help sections.
/// If a new subcommand is added to `Commands` but not to `help::commands()`,
/// this test fails with a clear message.
#[test]
fn all_subcommands_in_help() {
    let cmd = crate::cli_command();
    let help_text = commands();
    for sub in cmd.get_subcommands() {
        let name = sub.get_name();
        if name == "help" {
            continue; // clap auto-generated
        }
        let pattern = format!("  {}", name);
        assert!(
            help_text.contains(&pattern),
            "Command '{name}' missing from help sections — add it to help::commands()"
        );
    }
}

/// Compile-time exhaustive match on `Commands` enum.
/// Adding a new variant causes a compile error here, forcing the developer
/// to assign it to a section.
#[test]
fn all_commands_assigned_to_section() {
    fn _section(cmd: &Commands) -> &'static str {
        match cmd {
            Commands::Agent(_) => "Resources",
            Commands::Message(_) => "Resources",
            Commands::Reservation(_) => "Resources",
            Commands::Cell(_) => "Resources",
            Commands::Cells(_) => "Resources",
            Commands::Worker(_) => "Resources",
            Commands::Deferred(_) => "Resources",
            Commands::Queue(_) => "Resources",
            Commands::Project(_) => "Resources",
            Commands::Log(_) => "System",
            Commands::Env(_) => "System",
            Commands::Daemon(_) => "System",
        }
    }
}

// ============================================================================
// Plain Text Tests
// ============================================================================

#[test]
fn commands_returns_plain_text() {
    let result = commands();
    assert!(
        !result.contains("\x1b["),
        "commands() should not contain ANSI codes"
    );
}

#[test]
fn template_returns_plain_text() {
    let result = template();
    assert!(
        !result.contains("\x1b["),
        "template() should not contain ANSI codes"
    );
}

#[test]
fn after_help_returns_plain_text() {
    let result = after_help();
    assert!(
        !result.contains("\x1b["),
        "after_help() should not contain ANSI codes"
    );
}

// ============================================================================
// Section Content Tests
// ============================================================================

#[test]
fn commands_has_resources_section() {
    let result = commands();
    assert!(
        result.contains("Resources:"),
        "Should have Resources section"
    );
    assert!(
        result.contains("  agent "),
        "Resources should contain agent"
    );
    assert!(
        result.contains("  message "),
        "Resources should contain message"
    );
    assert!(
        result.contains("  reservation "),
        "Resources should contain reservation"
    );
    assert!(result.contains("  cell "), "Resources should contain cell");
    assert!(
        result.contains("  cells "),
        "Resources should contain cells"
    );
    assert!(
        result.contains("  worker "),
        "Resources should contain worker"
    );
    assert!(
        result.contains("  deferred "),
        "Resources should contain deferred"
    );
    assert!(
        result.contains("  queue "),
        "Resources should contain queue"
    );
    assert!(
        result.contains("  project "),
        "Resources should contain project"
    );
}

#[test]
fn commands_has_system_section() {
    let result = commands();
    assert!(result.contains("System:"), "Should have System section");
    assert!(result.contains("  log "), "System should contain log");
    assert!(result.contains("  env "), "System should contain env");
    assert!(result.contains("  daemon "), "System should contain daemon");
}

// ============================================================================
// Colorization Tests
// ============================================================================

#[test]
fn colorize_help_applies_header_color() {
    let result = colorize_help("Resources:");
    assert!(
        result.contains(&format!("{}Resources:{}", HEADER_START, RESET)),
        "Section header should be HEADER colored in:\n{}",
        result
    );
}

#[test]
fn colorize_help_applies_usage_color() {
    let result = colorize_help("Usage: swarm [OPTIONS] [COMMAND]");
    assert!(
        result.contains(&format!("{}Usage:{}", HEADER_START, RESET)),
        "Usage: should be HEADER colored in:\n{}",
        result
    );
}

#[test]
fn colorize_help_applies_literal_to_commands() {
    let result = colorize_help("  agent       Agent registration and directory");
    assert!(
        result.contains(&format!("{}agent{}", LITERAL_START, RESET)),
        "Command name should be LITERAL colored in:\n{}",
        result
    );
}

#[test]
fn colorize_help_applies_literal_to_option_flags() {
    let result = colorize_help("  -o, --output <OUTPUT>    Output format [default: text]");
    assert!(
        result.contains(&format!("{}-o{}", LITERAL_START, RESET)),
        "Short flag should be LITERAL colored in:\n{}",
        result
    );
    assert!(
        result.contains(&format!("{}--output{}", LITERAL_START, RESET)),
        "Long flag should be LITERAL colored in:\n{}",
        result
    );
}

#[test]
fn colorize_help_applies_context_to_placeholders() {
    let result = colorize_help("  -o, --output <OUTPUT>    Output format");
    assert!(
        result.contains(&format!("{}<OUTPUT>{}", CONTEXT_START, RESET)),
        "Placeholder should be CONTEXT colored in:\n{}",
        result
    );
}

#[test]
fn colorize_help_applies_context_to_defaults() {
    let result = colorize_help(
        "  -o, --output <OUTPUT>    Output format [default: text] [possible values: text, json]",
    );
    assert!(
        result.contains(&format!("{}[default: text]{}", CONTEXT_START, RESET)),
        "[default: text] should be CONTEXT colored in:\n{}",
        result
    );
    assert!(
        result.contains(&format!(
            "{}[possible values: text, json]{}",
            CONTEXT_START, RESET
        )),
        "[possible values: ...] should be CONTEXT colored in:\n{}",
        result
    );
}

#[test]
fn colorize_help_skips_existing_ansi() {
    let input = "\x1b[38;5;74mAlready Colored\x1b[0m";
    let result = colorize_help(input);
    assert_eq!(result, input, "Existing ANSI codes should be preserved");
}

#[test]
fn colorize_help_handles_mixed_content() {
    let input = "\
Resources:
  agent       Agent registration and directory
  cells       List cells in a project

Options:
  -o, --output <OUTPUT>    Output format [default: text]";

    let result = colorize_help(input);

    assert!(
        result.contains(&format!("{}Resources:{}", HEADER_START, RESET)),
        "Resources header should be colored"
    );
    assert!(
        result.contains(&format!("{}Options:{}", HEADER_START, RESET)),
        "Options header should be colored"
    );
    assert!(
        result.contains(&format!("{}agent{}", LITERAL_START, RESET)),
        "agent command should be colored"
    );
    assert!(
        result.contains(&format!("{}--output{}", LITERAL_START, RESET)),
        "--output flag should be colored"
    );
}

// ============================================================================
// Format Help Tests
// ============================================================================

#[test]
fn format_help_produces_output() {
    let help = format_help(crate::cli_command());
    assert!(!help.is_empty(), "format_help should produce output");
    assert!(
        help.contains("Resources:")
            || help.contains(&format!("{}Resources:{}", HEADER_START, RESET)),
        "Help should contain Resources section"
    );
}

#[test]
fn format_help_ends_with_newline() {
    let help = format_help(crate::cli_command());
    assert!(help.ends_with('\n'), "Help should end with newline");
}

// ============================================================================
// Subcommand Help Tests
// ============================================================================

/// Subcommand help must go through format_help (which forces Styles::plain()
/// before write_help, then applies colorize_help) rather than using clap's
/// default styled output. This test catches the bug where cloned subcommands
/// lost the parent's Styles::plain() and fell back to clap's default colored
/// styles.
#[test]
fn subcommand_help_uses_plain_base() {
    let cmd = crate::cli_command();
    let agent = crate::find_subcommand(cmd, &["agent", "list"]);
    let mut plain = agent.styles(styles());
    let mut buf = Vec::new();
    plain.write_help(&mut buf).unwrap();
    let raw = String::from_utf8(buf).unwrap();
    assert!(
        !raw.contains("\x1b["),
        "write_help with Styles::plain() should not contain ANSI codes;\n\
         clap's default styles must not leak through.\nGot:\n{raw}"
    );
}

#[test]
fn subcommand_help_contains_expected_content() {
    let cmd = crate::cli_command();
    let worker = crate::find_subcommand(cmd, &["worker"]);
    let help = format_help(worker);
    assert!(
        help.contains("Usage:"),
        "worker help should contain Usage line, got:\n{help}"
    );
    assert!(
        help.contains("spawn") || help.contains("Spawn"),
        "worker help should mention spawn subcommand, got:\n{help}"
    );
}
