//! Writes a synthetic `projects.csv` in the format the project bot produces.
//!
//! Usage: generate_projects [PATH] [COUNT] [--impact]
//! Set SEED for reproducible output.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::env;
use std::fs::File;

use impactboard::data::{IMPACT_MAX, IMPACT_MIN};
use impactboard::logging::{log, obj, v_str, Domain, Level};

const NAMES: [&str; 10] = [
    "Community garden",
    "Riverbank cleanup",
    "Reading club",
    "Senior tech help",
    "Shelter renovation",
    "Bike lanes survey",
    "Food bank drive",
    "Youth coding camp",
    "Playground repair",
    "Tree planting",
];
const PROBLEMS: [&str; 6] = [
    "Ecology",
    "Education",
    "Healthcare",
    "Urban space",
    "Social support",
    "Animals",
];
const PEOPLE: [&str; 8] = ["Ivan", "Olga", "Petr", "Anna", "Maria", "Sergey", "Elena", "Dmitry"];
const STATUSES: [&str; 4] = ["New", "Active", "On hold", "Done"];
const UNASSIGNED: &str = "Unassigned";

fn main() -> Result<()> {
    let mut positional = Vec::new();
    let mut with_impact = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--impact" => with_impact = true,
            flag if flag.starts_with("--") => bail!("unknown flag {}", flag),
            _ => positional.push(arg),
        }
    }
    let path = positional
        .first()
        .cloned()
        .unwrap_or_else(|| "projects.csv".to_string());
    let count: usize = match positional.get(1) {
        Some(v) => v.parse().with_context(|| format!("invalid row count '{}'", v))?,
        None => 25,
    };
    let seed = env::var("SEED").ok().and_then(|v| v.parse().ok());
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let file = File::create(&path).with_context(|| format!("failed to create {}", path))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["ID", "Name", "Problem", "Initiator", "Deadline", "Status", "Executor"];
    if with_impact {
        header.push("Impact");
    }
    writer.write_record(&header)?;

    let today = Utc::now().date_naive();
    for id in 1..=count {
        let deadline = today + Duration::days(rng.gen_range(-120..240));
        let status = STATUSES.choose(&mut rng).copied().unwrap_or("New");
        // The bot leaves freshly submitted projects without an executor.
        let executor = if status == "New" {
            UNASSIGNED
        } else {
            PEOPLE.choose(&mut rng).copied().unwrap_or(UNASSIGNED)
        };
        let mut row = vec![
            id.to_string(),
            NAMES.choose(&mut rng).copied().unwrap_or("Project").to_string(),
            PROBLEMS.choose(&mut rng).copied().unwrap_or("Other").to_string(),
            PEOPLE.choose(&mut rng).copied().unwrap_or("Anonymous").to_string(),
            deadline.format("%Y-%m-%d").to_string(),
            status.to_string(),
            executor.to_string(),
        ];
        if with_impact {
            row.push(rng.gen_range(IMPACT_MIN..IMPACT_MAX).to_string());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    log(
        Level::Info,
        Domain::Data,
        "sample_written",
        obj(&[
            ("path", v_str(&path)),
            ("rows", serde_json::json!(count)),
            ("impact", serde_json::json!(with_impact)),
        ]),
    );
    Ok(())
}
