//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use std::fmt::Write;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // Match against the whole context chain so wrapped causes are found too
    let error_msg = format!("{:#}", error);
    let lower = error_msg.to_lowercase();

    if lower.contains("pattern not found") || lower.contains("pattern has no points") {
        format_pattern_error(&mut output, &error_msg);
    } else if lower.contains("pattern file") || lower.contains("pattern directory") {
        format_pattern_file_error(&mut output, &error_msg);
    } else if lower.contains("pointer backend") {
        format_pointer_error(&mut output, &error_msg);
    } else if lower.contains("config") || lower.contains("invalid") {
        format_config_error(&mut output, &error_msg);
    } else {
        format_generic_error(&mut output, &error_msg);
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: recoil-playback -vvv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Write logs to a file: recoil-playback --log-file playback.log"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_pattern_error(output: &mut String, _error: &str) {
    writeln!(output, "Pattern Unavailable").ok();
    writeln!(output).ok();
    writeln!(output, "The requested pattern could not be played.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Name does not match any record").ok();
    writeln!(output, "     → Run: recoil-playback list").ok();
    writeln!(
        output,
        "     → Names come from the \"name\" field, not the file name"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Record has an empty \"pattern\" array").ok();
    writeln!(output, "     → Add at least one {{\"x\", \"y\", \"d\"}} point").ok();
}

fn format_pattern_file_error(output: &mut String, _error: &str) {
    writeln!(output, "Pattern File Error").ok();
    writeln!(output).ok();
    writeln!(output, "A pattern file could not be read or written.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Check the [patterns] directory in the config").ok();
    writeln!(output, "  2. Check file permissions on the pattern directory").ok();
    writeln!(
        output,
        "  3. Validate the JSON (each point needs integer x, y and d)"
    )
    .ok();
}

fn format_pointer_error(output: &mut String, _error: &str) {
    writeln!(output, "Pointer Backend Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not move the mouse pointer.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Built without the enigo backend").ok();
    writeln!(output, "     → Rebuild with: cargo build --features enigo").ok();
    writeln!(output).ok();
    writeln!(output, "  2. No display or input permission").ok();
    writeln!(output, "     → On X11 check: echo $DISPLAY").ok();
    writeln!(
        output,
        "     → On macOS grant Accessibility access to the terminal"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  3. Try a dry run to rule out the pattern itself").ok();
    writeln!(output, "     → Run: recoil-playback play <NAME> --dry-run").ok();
}

fn format_config_error(output: &mut String, _error: &str) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "There is a problem with the configuration.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Check config file syntax (TOML format)").ok();
    writeln!(output, "  2. Sensitivity and aspect ratio must be > 0").ok();
    writeln!(output, "  3. Resolution width and height must be > 0").ok();
    writeln!(output, "  4. Regenerate defaults: recoil-playback init-config").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Operation Failed").ok();
    writeln!(output).ok();
    writeln!(output, "{}", error).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Run with -vvv for detailed logs").ok();
    writeln!(output, "  2. Check the configuration file").ok();
}
