use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use parquet::file::reader::{FileReader, SerializedFileReader};

use mocktarget::masks::{bgs_mask, contam_mask, desi_mask, mws_mask};
use mocktarget::mock::io::read_parquet;
use mocktarget::writer::{KEY_CONFIG, KEY_WAVELENGTH};

/// Bit columns summarised when present, with their decoders
const BIT_COLUMNS: [(&str, fn(i64) -> Vec<&'static str>); 4] = [
    ("DESI_TARGET", desi_mask::names),
    ("BGS_TARGET", bgs_mask::names),
    ("MWS_TARGET", mws_mask::names),
    ("CONTAM_TARGET", contam_mask::names),
];

/// Display information about an output catalog
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let file_handle = File::open(&file).context("Failed to open file")?;
    let reader = SerializedFileReader::new(file_handle).context("Failed to read Parquet file")?;

    let metadata = reader.metadata();
    let file_metadata = metadata.file_metadata();

    println!("mocktarget File Information");
    println!("===========================");
    println!("File: {}", file.display());
    println!();

    println!("File Statistics:");
    println!("  Row groups: {}", metadata.num_row_groups());
    println!("  Total rows: {}", file_metadata.num_rows());
    println!(
        "  Schema columns: {}",
        file_metadata.schema_descr().num_columns()
    );
    println!();

    if let Some(kv_metadata) = file_metadata.key_value_metadata() {
        println!("Metadata Keys:");
        for kv in kv_metadata {
            let value = kv.value.as_deref().unwrap_or("<null>");
            if kv.key == KEY_CONFIG || kv.key == KEY_WAVELENGTH || kv.key == "ARROW:schema" {
                println!("  {}: ({} bytes)", kv.key, value.len());
            } else {
                println!("  {}: {}", kv.key, value);
            }
        }
        println!();
    }

    println!("Schema:");
    for i in 0..file_metadata.schema_descr().num_columns() {
        let col = file_metadata.schema_descr().column(i);
        println!("  {:3}. {} ({})", i + 1, col.name(), col.physical_type());
    }

    let table = read_parquet(&file)?.table;
    for (column, decode) in BIT_COLUMNS {
        if !table.contains(column) {
            continue;
        }
        let counts = bit_counts(table.i64(column)?, decode);
        if counts.is_empty() {
            continue;
        }
        println!();
        println!("{} bits:", column);
        for (name, n) in counts {
            println!("  {:<20} {}", name, n);
        }
    }

    Ok(())
}

/// Rows per set bit name
fn bit_counts(values: &[i64], decode: fn(i64) -> Vec<&'static str>) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for &value in values {
        for name in decode(value) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    counts
}
