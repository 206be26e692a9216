//! Writes TypeScript bindings and JSON schemas for the listing data model.
//!
//! Run with: `cargo run --bin generate_types -- --out bindings`

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use schemars::{schema_for, JsonSchema};
use ts_rs::TS;

use listing_wizard::config::Config;
use listing_wizard::session::Role;
use listing_wizard::wizard::sections::{
    Address, BasicInfo, Coordinates, Currency, ListingStatus, LocationSection, MediaSection,
    PropertyDetails, PropertyType,
};
use listing_wizard::wizard::{
    FormPayload, StepStatus, SubmissionMode, SubmissionReceipt, WizardStep,
};

#[derive(Parser)]
#[command(name = "generate_types")]
#[command(about = "Generate TypeScript bindings and JSON schemas")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "bindings")]
    out: String,
}

fn write_ts<T: TS + 'static>(dir: &Path, name: &str) -> Result<()> {
    let source = T::export_to_string().with_context(|| format!("Failed to export {name}"))?;
    let path = dir.join(format!("{name}.ts"));
    fs::write(&path, source).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  {}", path.display());
    Ok(())
}

fn write_schema<T: JsonSchema>(dir: &Path, name: &str) -> Result<()> {
    let schema = schema_for!(T);
    let path = dir.join(format!("{name}.schema.json"));
    fs::write(&path, serde_json::to_string_pretty(&schema)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  {}", path.display());
    Ok(())
}

macro_rules! export {
    ($dir:expr, $($ty:ty),+ $(,)?) => {
        $(
            write_ts::<$ty>($dir, stringify!($ty))?;
            write_schema::<$ty>($dir, stringify!($ty))?;
        )+
    };
}

fn main() -> Result<()> {
    let args = Args::parse();
    let dir = Path::new(&args.out);
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    println!("Writing bindings to {}", dir.display());
    export!(
        dir,
        BasicInfo,
        PropertyDetails,
        MediaSection,
        Address,
        Coordinates,
        LocationSection,
        PropertyType,
        ListingStatus,
        Currency,
        Role,
        WizardStep,
        StepStatus,
        SubmissionMode,
        SubmissionReceipt,
        FormPayload,
    );

    write_schema::<Config>(dir, "Config")?;
    Ok(())
}
