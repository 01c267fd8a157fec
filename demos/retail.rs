use basket_miner::{analyze, Basket, Itemset, Record, Rule, SearchConfig};
use std::env;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use tracing_subscriber::EnvFilter;

/// Mines association rules from a retail CSV export.
///
/// Expects `InvoiceNo,Description,Quantity` rows under a header line.
/// Credit notes, whose invoice number contains `C`, are skipped.
///
/// Usage: cargo run --example retail <file.csv> [search.toml]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <file.csv> [search.toml]", args[0]);
        std::process::exit(1);
    }

    let config = match args.get(2) {
        Some(path) => {
            let source = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Cannot read \"{}\": {}", path, e);
                std::process::exit(1);
            });
            SearchConfig::from_toml_str(&source).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1);
            })
        }
        None => SearchConfig::broad(),
    };

    let filename = &args[1];
    let file = File::open(filename).unwrap_or_else(|_| {
        eprintln!("File \"{}\" not found.", filename);
        std::process::exit(1);
    });

    let mut skipped = 0usize;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines().skip(1) {
        let line = line.expect("Error reading file");
        match parse_line(&line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    println!("Loaded {} records ({} skipped)", records.len(), skipped);

    let basket = Basket::from_records(records);
    println!(
        "{} transactions over {} distinct items",
        basket.len(),
        basket.vocabulary().len()
    );

    let analysis = match analyze(&basket, &config) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let Some((support, confidence)) = analysis.search.thresholds() else {
        println!("\nNo rules could be generated after all attempts.");
        return;
    };
    println!(
        "\nRules found at min_support={:.2} and confidence={:.2} after {} attempts",
        support,
        confidence,
        analysis.search.attempts().len()
    );

    print_rules(&basket, config.algorithm.to_string(), analysis.search.rules(), analysis.search_elapsed);
    if let Some(run) = &analysis.confirmation {
        print_rules(&basket, run.algorithm.to_string(), &run.rules, run.elapsed);
    }
}

/// Splits `InvoiceNo,Description,Quantity`; descriptions may contain commas.
fn parse_line(line: &str) -> Option<Record<String, String>> {
    let mut fields = line.split(',');
    let invoice = fields.next()?.trim();
    if invoice.is_empty() || invoice.contains('C') {
        return None;
    }
    let rest: Vec<&str> = fields.collect();
    let (quantity, description) = rest.split_last()?;
    let quantity: i64 = quantity.trim().parse().ok()?;
    let description = description.join(",").trim().trim_matches('"').trim().to_string();
    if description.is_empty() {
        return None;
    }
    Some(Record::new(invoice.to_string(), description, quantity))
}

fn print_rules(
    basket: &Basket<String, String>,
    algorithm: String,
    rules: &[Rule],
    elapsed: std::time::Duration,
) {
    println!(
        "\nTop Association Rules ({}) - Execution Time: {:.4} seconds",
        algorithm,
        elapsed.as_secs_f64()
    );
    println!("{}", "-".repeat(80));
    if rules.is_empty() {
        println!("No rules found for {}.", algorithm);
        return;
    }
    for rule in rules.iter().take(5) {
        let join = |set: &Itemset| {
            basket
                .resolve(set)
                .into_iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "{} => {} | Support: {:.4} | Confidence: {:.4} | Lift: {:.4}",
            join(&rule.antecedent),
            join(&rule.consequent),
            rule.support,
            rule.confidence,
            rule.lift
        );
    }
}
