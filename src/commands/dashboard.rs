use super::Context;
use crate::auth::Route;
use crate::error::Result;

use colored::Colorize;
use prettytable::{format, Table};

/// Print the admin dashboard statistics
pub async fn show_dashboard(ctx: &Context, json: bool) -> Result<()> {
    let user = ctx.guard(Route::Dashboard).await?;
    let stats = ctx.client.dashboard_stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\nWelcome back, {}!", user.username.bold());

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["Total Users".bold(), stats.total_users]);
    table.add_row(prettytable::row![
        "Total Documents".bold(),
        stats.total_documents
    ]);
    table.add_row(prettytable::row!["Storage Used".bold(), stats.storage_mb()]);
    table.printstd();
    println!();
    Ok(())
}
