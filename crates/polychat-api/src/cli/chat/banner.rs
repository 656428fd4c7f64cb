//! Welcome banner and upsell notice.

use console::style;

use polychat_types::provider::ProviderId;

/// Shown when the usage gate denies a round.
pub const UPSELL_MESSAGE: &str = "Free chat limit reached! Please subscribe to continue.";

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(providers: &[ProviderId], target: &str, free_limit: u32, remaining: u32) {
    let names: Vec<_> = providers.iter().map(|p| p.display_name()).collect();

    println!();
    println!("  {} {}", style("◆").cyan(), style("polychat").cyan().bold());
    println!("  {}", style("One question, every provider.").dim());
    println!();
    println!("  {}  {}", style("Providers:").bold(), style(names.join(", ")).dim());
    println!("  {}    {}", style("Target:").bold(), style(target).dim());
    println!(
        "  {}  {}",
        style("Free tier:").bold(),
        style(format!("{remaining} of {free_limit} rounds left")).dim()
    );
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

pub fn print_upsell() {
    println!();
    println!("  {} {}", style("★").yellow().bold(), style(UPSELL_MESSAGE).yellow().bold());
    println!("  {}", style("Use /logout to start a new session.").dim());
    println!();
}
