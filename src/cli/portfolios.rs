use anyhow::Result;
use comfy_table::Cell;
use console::style;

use super::ui;
use crate::core::{Portfolio, REFERENCE_CURRENCY};
use crate::service::PortfolioService;

/// Displays every stored portfolio, optionally filtered by asset symbols.
pub async fn list(service: &PortfolioService, assets: &[String], json: bool) -> Result<()> {
    let pb = ui::new_spinner("Refreshing valuations...");
    let portfolios = service.get_all_portfolios().await;
    pb.finish_and_clear();
    let mut portfolios = portfolios?;

    if !assets.is_empty() {
        let symbols = to_upper(assets);
        portfolios = service.filter_portfolios(&portfolios, &symbols).await?;
    }

    if json {
        let rendered: Vec<String> = portfolios.iter().map(Portfolio::to_string).collect();
        println!("[{}]", rendered.join(", "));
        return Ok(());
    }

    let num_portfolios = portfolios.len();
    for (i, portfolio) in portfolios.iter().enumerate() {
        println!("{}", display_as_table(portfolio));
        if i < num_portfolios - 1 {
            ui::print_separator();
        }
    }

    if num_portfolios > 1 {
        let grand_total: rust_decimal::Decimal =
            portfolios.iter().map(|p| p.total_value()).sum();
        let term_width = console::Term::stdout()
            .size_checked()
            .map(|(_, w)| w as usize)
            .unwrap_or(80);
        println!("\n{}", "=".repeat(term_width));
        let total_str = format!("Grand Total ({REFERENCE_CURRENCY}): {grand_total}");
        let styled_total = style(&total_str).bold().green();
        println!("{styled_total:>term_width$}");
    }

    Ok(())
}

/// Displays one portfolio by name, optionally filtered by asset symbols.
pub async fn show(
    service: &PortfolioService,
    name: &str,
    assets: &[String],
    json: bool,
) -> Result<()> {
    let pb = ui::new_spinner("Refreshing valuations...");
    let portfolio = service.get_portfolio_by_name(name).await;
    pb.finish_and_clear();
    let mut portfolio = portfolio?;

    if !assets.is_empty() {
        let symbols = to_upper(assets);
        portfolio = service.filter_by_symbols(&portfolio, &symbols).await?;
    }

    if json {
        println!("{portfolio}");
    } else {
        println!("{}", display_as_table(&portfolio));
    }
    Ok(())
}

/// Prints the total value of one portfolio.
pub async fn total(service: &PortfolioService, name: &str) -> Result<()> {
    let pb = ui::new_spinner("Refreshing valuations...");
    let portfolio = service.get_portfolio_by_name(name).await;
    pb.finish_and_clear();

    println!("{}", portfolio?.total_value());
    Ok(())
}

/// Asset symbols are matched in their uppercase convention.
fn to_upper(symbols: &[String]) -> Vec<String> {
    symbols.iter().map(|symbol| symbol.to_uppercase()).collect()
}

fn display_as_table(portfolio: &Portfolio) -> String {
    let percentages = portfolio.percentages();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Shares"),
        ui::header_cell(&format!("Valuation ({REFERENCE_CURRENCY})")),
        ui::header_cell(&format!("Value ({REFERENCE_CURRENCY})")),
        ui::header_cell("Weight (%)"),
    ]);

    for (asset, percentage) in portfolio.assets().iter().zip(&percentages) {
        table.add_row(vec![
            Cell::new(asset.symbol()),
            ui::decimal_cell(asset.shares()),
            ui::decimal_cell(asset.valuation()),
            ui::decimal_cell(asset.value()),
            ui::percentage_cell(*percentage),
        ]);
    }

    // Portfolio name at top
    let mut output = format!(
        "Portfolio: {}\n\n",
        ui::style_text(portfolio.name(), ui::StyleType::Title)
    );

    // Table in the middle
    output.push_str(&table.to_string());

    // Total value at bottom
    output.push_str(&format!(
        "\n\nTotal Value ({}): {}",
        ui::style_text(REFERENCE_CURRENCY, ui::StyleType::TotalLabel),
        ui::style_text(
            &portfolio.total_value().to_string(),
            ui::StyleType::TotalValue
        )
    ));

    output
}
