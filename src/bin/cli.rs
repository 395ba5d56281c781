use chrono::Utc;
use polars::prelude::{AnyValue, DataFrame};
use resource_payroll::{
    Client, MemoryPayoutStore, PayPeriod, PayoutKey, PayoutRequest, PayoutStatus, PayoutStore,
    PayrollCalculator, PayrollConfig, ResourcePayout, ResourceProfile, export,
    load_case_log_from_csv, load_payouts_from_json, load_resources_from_json,
    save_payouts_to_json,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |av: &AnyValue| -> String {
        match av {
            AnyValue::Null => String::new(),
            AnyValue::UInt32(v) => v.to_string(),
            AnyValue::Int64(v) => v.to_string(),
            AnyValue::Float64(v) => format!("{v:.2}"),
            AnyValue::String(s) => s.to_string(),
            _ => av.to_string(),
        }
    };

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| -> String {
        let mut line = String::from("|");
        for (ci, s) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(s);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  config load <path>                 Load slabs and rates from a .toml or .json file\n  config show                        Show the slab table and rate count\n  resources load <path>              Load resource profiles from JSON\n  period <year> <month>              Select the pay period\n  activity load <csv>                Load the case log for the selected period\n  compute                            Compute payouts for the loaded activity\n  show                               Show the payout summary for the period\n  daywise <resource_id>              Show one resource's day-wise grid\n  status <resource_id> <status>      Move a payout to draft|calculated|approved|paid\n  export summary <path>              Write the summary CSV\n  export daywise <resource_id> <path>\n                                     Write one resource's day-wise CSV\n  save json <path>                   Persist payouts to disk\n  load json <path>                   Load payouts from disk\n  quit|exit                          Exit"
    );
}

struct Console {
    calculator: PayrollCalculator,
    profiles: Vec<ResourceProfile>,
    period: Option<PayPeriod>,
    requests: Vec<PayoutRequest>,
    store: MemoryPayoutStore,
}

impl Console {
    fn new() -> Self {
        Self {
            calculator: PayrollCalculator::default(),
            profiles: Vec::new(),
            period: None,
            requests: Vec::new(),
            store: MemoryPayoutStore::new(),
        }
    }

    fn period_payouts(&self) -> Vec<ResourcePayout> {
        match self.period {
            Some(period) => self.store.list_payouts(period).unwrap_or_default(),
            None => self.store.all(),
        }
    }

    fn find_payout(&self, resource_id: &str) -> Option<ResourcePayout> {
        let period = self.period?;
        self.store
            .load_payout(&PayoutKey::new(resource_id, period))
            .ok()
            .flatten()
    }

    fn show_summary(&self) {
        let payouts = self.period_payouts();
        if payouts.is_empty() {
            println!("No payouts computed yet.");
            return;
        }
        let rows = export::summary_rows(&payouts, &self.profiles);
        match export::summary_frame(&rows) {
            Ok(df) => println!("{}", render_df_as_text_table(&df)),
            Err(e) => println!("Error rendering summary: {}", e),
        }
    }

    fn show_config(&self) {
        let config = self.calculator.config();
        println!("Logging slabs:");
        for band in config.slabs.bands() {
            let upper = band
                .max
                .map(|max| max.to_string())
                .unwrap_or_else(|| "inf".to_string());
            println!("  [{}, {})  {}/case", band.min, upper, band.rate);
        }
        println!("Processing rates   : {}", config.processing_rates.len());
        println!("Datavant in logging: {}", config.logging.include_datavant);
    }

    fn show_daywise(&self, resource_id: &str) {
        let Some(payout) = self.find_payout(resource_id) else {
            println!("No payout for {} in the selected period.", resource_id);
            return;
        };
        println!("Day-wise logging for {} ({})", payout.display_name(), payout.period);
        println!(
            "  {:<10} {:<9} {:>7} {:>5} {:>8} {:>6} {:>5}",
            "date", "day", "verisma", "mro", "datavant", "hours", "total"
        );
        for day in &payout.day_wise {
            println!(
                "  {:<10} {:<9} {:>7} {:>5} {:>8} {:>6} {:>5}",
                day.date.format("%Y-%m-%d"),
                day.day_name,
                day.verisma_cases,
                day.mro_cases,
                day.datavant_cases,
                day.hours,
                day.total_cases
            );
        }
        for client in Client::ALL {
            let processing = payout.processing_for(client);
            println!(
                "  {}: {} logging case(s), {} processing case(s) for {}",
                client.display_name(),
                payout.logging_cases_for(client),
                processing.cases,
                processing.amount.round_dp(2)
            );
        }
    }

    fn compute(&mut self) {
        let Some(period) = self.period else {
            println!("Select a period first: period <year> <month>");
            return;
        };
        if self.requests.is_empty() {
            println!("No activity loaded for {}.", period);
            return;
        }
        let now = Utc::now();
        let mut computed = 0usize;
        for (resource_id, result) in self.calculator.compute_batch(&self.requests) {
            match result {
                Ok(payout) => {
                    let mut payout = payout.stamped(now);
                    if let Some(profile) =
                        self.profiles.iter().find(|p| p.resource_id == resource_id)
                    {
                        payout = payout.with_snapshot(profile.snapshot(now.date_naive()));
                    }
                    match self.store.save_payout(&payout) {
                        Ok(()) => computed += 1,
                        Err(e) => println!("Skipped {}: {}", resource_id, e),
                    }
                }
                Err(e) => println!("Rejected {} [{}]: {}", resource_id, e.code(), e),
            }
        }
        println!("Computed {} payout(s) for {}.", computed, period);
        self.show_summary();
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("resource_payroll=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut console = Console::new();
    println!("Resource Payroll (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "config" => match (parts.next(), parts.next()) {
                (Some("load"), Some(path)) => match PayrollConfig::load(path) {
                    Ok(config) => {
                        console.calculator = PayrollCalculator::new(config);
                        println!("Config loaded from {}.", path);
                        console.show_config();
                    }
                    Err(e) => println!("Error loading config: {}", e),
                },
                (Some("show"), None) => console.show_config(),
                _ => println!("Usage: config load <path> | config show"),
            },
            "resources" => match (parts.next(), parts.next()) {
                (Some("load"), Some(path)) => match load_resources_from_json(path) {
                    Ok(profiles) => {
                        println!("Loaded {} resource(s).", profiles.len());
                        console.profiles = profiles;
                    }
                    Err(e) => println!("Error loading resources: {}", e),
                },
                _ => println!("Usage: resources load <path>"),
            },
            "period" => {
                let year = parts.next().and_then(|s| s.parse::<i32>().ok());
                let month = parts.next().and_then(|s| s.parse::<u32>().ok());
                match (year, month) {
                    (Some(year), Some(month)) => match PayPeriod::new(year, month) {
                        Ok(period) => {
                            console.period = Some(period);
                            console.requests.clear();
                            println!("Period set to {}.", period);
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    _ => println!("Usage: period <year> <month>"),
                }
            }
            "activity" => match (parts.next(), parts.next(), console.period) {
                (Some("load"), Some(_), None) => {
                    println!("Select a period first: period <year> <month>")
                }
                (Some("load"), Some(path), Some(period)) => {
                    match load_case_log_from_csv(path, period) {
                        Ok(requests) => {
                            println!(
                                "Loaded activity for {} resource(s) in {}.",
                                requests.len(),
                                period
                            );
                            console.requests = requests;
                        }
                        Err(e) => println!("Error loading activity: {}", e),
                    }
                }
                _ => println!("Usage: activity load <csv>"),
            },
            "compute" => console.compute(),
            "show" => console.show_summary(),
            "daywise" => match parts.next() {
                Some(resource_id) => console.show_daywise(resource_id),
                None => println!("Usage: daywise <resource_id>"),
            },
            "status" => {
                let resource_id = parts.next();
                let status = parts.next().map(|s| (s, PayoutStatus::from_str(s)));
                match (resource_id, status, console.period) {
                    (Some(_), Some(_), None) => {
                        println!("Select a period first: period <year> <month>")
                    }
                    (Some(resource_id), Some((_, Some(status))), Some(period)) => {
                        let key = PayoutKey::new(resource_id, period);
                        match console.store.update_status(&key, status) {
                            Ok(_) => println!("Payout {} is now {}.", key, status),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    (Some(_), Some((raw, None)), _) => {
                        println!("Unknown status '{}'. Use draft|calculated|approved|paid.", raw)
                    }
                    _ => println!("Usage: status <resource_id> <status>"),
                }
            }
            "export" => match (parts.next(), parts.next(), parts.next()) {
                (Some("summary"), Some(path), None) => {
                    let payouts = console.period_payouts();
                    let rows = export::summary_rows(&payouts, &console.profiles);
                    match export::write_summary_csv(&rows, path) {
                        Ok(_) => println!("Summary written to {}.", path),
                        Err(e) => println!("Error writing summary: {}", e),
                    }
                }
                (Some("daywise"), Some(resource_id), Some(path)) => {
                    match console.find_payout(resource_id) {
                        Some(payout) => match export::write_daywise_csv(&payout, path) {
                            Ok(_) => println!("Day-wise grid written to {}.", path),
                            Err(e) => println!("Error writing day-wise grid: {}", e),
                        },
                        None => println!("No payout for {} in the selected period.", resource_id),
                    }
                }
                _ => println!("Usage: export summary <path> | export daywise <resource_id> <path>"),
            },
            "save" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => {
                    match save_payouts_to_json(&console.store.all(), path) {
                        Ok(_) => println!("Payouts saved to {}.", path),
                        Err(e) => println!("Error saving payouts: {}", e),
                    }
                }
                _ => println!("Usage: save json <path>"),
            },
            "load" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match load_payouts_from_json(path) {
                    Ok(payouts) => {
                        println!("Loaded {} payout(s) from {}.", payouts.len(), path);
                        console.store.replace_all(payouts);
                        console.show_summary();
                    }
                    Err(e) => println!("Error loading payouts: {}", e),
                },
                _ => println!("Usage: load json <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
