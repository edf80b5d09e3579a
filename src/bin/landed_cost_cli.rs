use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use landed_cost_api::{
    dto::landed_cost::{LandedCostPreview, LandedCostRequest},
    errors::ServiceError,
    services::landed_cost::{calculate, ManualAllocationPolicy},
};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "landed-cost-cli",
    about = "Offline landed cost calculations",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate shared costs for a shipment request file; nothing is saved
    Calculate(CalculateArgs),
}

#[derive(Args)]
struct CalculateArgs {
    #[arg(long, help = "Path to a JSON shipment request")]
    input: PathBuf,
    #[arg(
        long,
        value_enum,
        default_value_t = PolicyArg::Reject,
        help = "How manual allocations that do not add up are handled"
    )]
    manual_policy: PolicyArg,
    #[arg(long, help = "Allowed difference for manual allocations under the reject policy")]
    tolerance: Option<Decimal>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Reject,
    Accept,
}

impl CalculateArgs {
    fn policy(&self) -> ManualAllocationPolicy {
        match self.manual_policy {
            PolicyArg::Accept => ManualAllocationPolicy::Accept,
            PolicyArg::Reject => match self.tolerance {
                Some(tolerance) => ManualAllocationPolicy::Reject { tolerance },
                None => ManualAllocationPolicy::default(),
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Calculate(args) => handle_calculate(args, cli.json),
    }
}

fn handle_calculate(args: CalculateArgs, json: bool) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let request: LandedCostRequest = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid shipment request", args.input.display()))?;

    let draft = request.into_draft().map_err(describe)?;
    let breakdown = calculate(&draft, args.policy()).map_err(describe)?;
    let preview = LandedCostPreview::new(&draft, breakdown);

    if json {
        print_json(&preview)
    } else {
        print_table(&preview);
        Ok(())
    }
}

fn describe(error: ServiceError) -> anyhow::Error {
    match error.violations() {
        Some(violations) => {
            let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
            anyhow::anyhow!("request rejected:\n  {}", lines.join("\n  "))
        }
        None => anyhow::anyhow!(error.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table(preview: &LandedCostPreview) {
    let summary = &preview.calculation_summary;
    println!(
        "{} ({}, {})",
        preview.shipment.name, preview.shipment.shipment_date, summary.calculation_method
    );
    println!(
        "{:<4} {:<28} {:>10} {:>12} {:>9} {:>12} {:>14} {:>12}",
        "#", "item", "qty", "base", "share", "allocated", "landed", "per unit"
    );
    for item in &preview.items {
        println!(
            "{:<4} {:<28} {:>10} {:>12} {:>8}% {:>12} {:>14} {:>12}",
            item.position,
            truncate(&item.item_name, 28),
            item.quantity,
            item.total_item_cost.round_dp(2),
            (item.percentage_share * Decimal::ONE_HUNDRED).round_dp(2),
            item.allocated_shared_cost.round_dp(2),
            item.total_landed_cost.round_dp(2),
            item.landed_cost_per_unit.round_dp(4),
        );
    }
    println!();
    for cost in &preview.shared_costs {
        println!(
            "{:<40} {:>12} {}",
            truncate(&cost.description, 40),
            cost.amount.round_dp(2),
            if cost.is_manual { "manual" } else { "" }
        );
    }
    println!();
    println!(
        "base {}  shared {}  landed {} {}  ({} at rate {})",
        summary.total_shipment_base_cost.round_dp(2),
        summary.total_shared_costs.round_dp(2),
        summary.grand_total_landed_cost.round_dp(2),
        summary.base_currency,
        summary.grand_total_landed_cost_converted.round_dp(2),
        summary.exchange_rate,
    );
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
        shortened.push('~');
        shortened
    }
}
