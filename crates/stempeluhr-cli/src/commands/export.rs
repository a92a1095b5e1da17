use std::path::PathBuf;

use stempeluhr_core::{storage, CsvExporter};

use super::{parse_date, App};

pub fn run(from: &str, to: &str, dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let from = parse_date(from)?;
    let to = parse_date(to)?;
    if to < from {
        return Err(format!("--to {to} lies before --from {from}").into());
    }

    let app = App::open()?;
    let dir = match dir {
        Some(dir) => dir,
        None => storage::data_dir()?,
    };
    let path = CsvExporter::new(app.db.clone()).export_to_dir(&dir, from, to)?;
    println!("exported to {}", path.display());
    Ok(())
}
